// ==========================================
// 集装箱码头流量合成系统 - 领域类型定义
// ==========================================
// 职责: 箱型长度、运输方式、堆存要求等封闭枚举
// 红线: 枚举值与数据库存储字符串一一对应
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 箱型长度 (Container Length)
// ==========================================
// 每种长度对应固定的运力单位 (TEU 当量)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerLength {
    TwentyFeet,    // 20 尺
    FortyFeet,     // 40 尺
    FortyFiveFeet, // 45 尺
    Other,         // 其他（非标）
}

impl ContainerLength {
    /// 全部箱型
    pub const ALL: [ContainerLength; 4] = [
        ContainerLength::TwentyFeet,
        ContainerLength::FortyFeet,
        ContainerLength::FortyFiveFeet,
        ContainerLength::Other,
    ];

    /// 占用的运力单位（TEU 当量）
    ///
    /// `Other` 取一个很小的正值，同时作为“运力耗尽”阈值使用
    pub const fn teu_factor(self) -> f64 {
        match self {
            ContainerLength::TwentyFeet => 1.0,
            ContainerLength::FortyFeet => 2.0,
            ContainerLength::FortyFiveFeet => 2.25,
            ContainerLength::Other => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerLength::TwentyFeet => "TWENTY_FEET",
            ContainerLength::FortyFeet => "FORTY_FEET",
            ContainerLength::FortyFiveFeet => "FORTY_FIVE_FEET",
            ContainerLength::Other => "OTHER",
        }
    }
}

impl fmt::Display for ContainerLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContainerLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TWENTY_FEET" | "20" => Ok(ContainerLength::TwentyFeet),
            "FORTY_FEET" | "40" => Ok(ContainerLength::FortyFeet),
            "FORTY_FIVE_FEET" | "45" => Ok(ContainerLength::FortyFiveFeet),
            "OTHER" => Ok(ContainerLength::Other),
            other => Err(format!("未知箱型长度: {}", other)),
        }
    }
}

// ==========================================
// 运输方式 (Mode of Transport)
// ==========================================
// Truck 运力不受约束；其余为按船期/班期运行的定班运输工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModeOfTransport {
    Truck,         // 集卡
    Train,         // 铁路
    Feeder,        // 支线船
    DeepSeaVessel, // 干线船
    Barge,         // 驳船
}

impl ModeOfTransport {
    pub const ALL: [ModeOfTransport; 5] = [
        ModeOfTransport::Truck,
        ModeOfTransport::Train,
        ModeOfTransport::Feeder,
        ModeOfTransport::DeepSeaVessel,
        ModeOfTransport::Barge,
    ];

    /// 定班运输工具（运力有限）
    pub const SCHEDULED: [ModeOfTransport; 4] = [
        ModeOfTransport::Train,
        ModeOfTransport::Feeder,
        ModeOfTransport::DeepSeaVessel,
        ModeOfTransport::Barge,
    ];

    pub fn is_scheduled(&self) -> bool {
        !matches!(self, ModeOfTransport::Truck)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeOfTransport::Truck => "TRUCK",
            ModeOfTransport::Train => "TRAIN",
            ModeOfTransport::Feeder => "FEEDER",
            ModeOfTransport::DeepSeaVessel => "DEEP_SEA_VESSEL",
            ModeOfTransport::Barge => "BARGE",
        }
    }
}

impl fmt::Display for ModeOfTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModeOfTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRUCK" => Ok(ModeOfTransport::Truck),
            "TRAIN" => Ok(ModeOfTransport::Train),
            "FEEDER" => Ok(ModeOfTransport::Feeder),
            "DEEP_SEA_VESSEL" => Ok(ModeOfTransport::DeepSeaVessel),
            "BARGE" => Ok(ModeOfTransport::Barge),
            other => Err(format!("未知运输方式: {}", other)),
        }
    }
}

// ==========================================
// 堆存要求 (Storage Requirement)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageRequirement {
    Standard,       // 普通箱
    Empty,          // 空箱
    Reefer,         // 冷藏箱
    DangerousGoods, // 危险品箱
}

impl StorageRequirement {
    pub const ALL: [StorageRequirement; 4] = [
        StorageRequirement::Standard,
        StorageRequirement::Empty,
        StorageRequirement::Reefer,
        StorageRequirement::DangerousGoods,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageRequirement::Standard => "STANDARD",
            StorageRequirement::Empty => "EMPTY",
            StorageRequirement::Reefer => "REEFER",
            StorageRequirement::DangerousGoods => "DANGEROUS_GOODS",
        }
    }
}

impl fmt::Display for StorageRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StorageRequirement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STANDARD" => Ok(StorageRequirement::Standard),
            "EMPTY" => Ok(StorageRequirement::Empty),
            "REEFER" => Ok(StorageRequirement::Reefer),
            "DANGEROUS_GOODS" => Ok(StorageRequirement::DangerousGoods),
            other => Err(format!("未知堆存要求: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teu_factor_table() {
        assert_eq!(ContainerLength::TwentyFeet.teu_factor(), 1.0);
        assert_eq!(ContainerLength::FortyFeet.teu_factor(), 2.0);
        assert_eq!(ContainerLength::FortyFiveFeet.teu_factor(), 2.25);
        assert_eq!(ContainerLength::Other.teu_factor(), 0.5);
    }

    #[test]
    fn test_only_truck_is_unscheduled() {
        for mode in ModeOfTransport::ALL {
            assert_eq!(mode.is_scheduled(), mode != ModeOfTransport::Truck);
        }
        assert!(!ModeOfTransport::SCHEDULED.contains(&ModeOfTransport::Truck));
    }

    #[test]
    fn test_storage_strings_parse_back() {
        assert_eq!(
            "deep_sea_vessel".parse::<ModeOfTransport>(),
            Ok(ModeOfTransport::DeepSeaVessel)
        );
        assert_eq!("45".parse::<ContainerLength>(), Ok(ContainerLength::FortyFiveFeet));
        assert_eq!(
            StorageRequirement::Reefer.as_str().parse::<StorageRequirement>(),
            Ok(StorageRequirement::Reefer)
        );
        assert!("SUBMARINE".parse::<ModeOfTransport>().is_err());
    }

    #[test]
    fn test_storage_requirement_as_ordered_key() {
        let weights: std::collections::BTreeMap<StorageRequirement, f64> = [
            (StorageRequirement::DangerousGoods, 0.03),
            (StorageRequirement::Standard, 0.8),
            (StorageRequirement::Reefer, 0.05),
            (StorageRequirement::Empty, 0.12),
        ]
        .into_iter()
        .collect();

        let keys: Vec<StorageRequirement> = weights.keys().copied().collect();
        assert_eq!(keys, StorageRequirement::ALL.to_vec());
    }
}
