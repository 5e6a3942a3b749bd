// ==========================================
// 集装箱码头流量合成系统 - 输入概率分布
// ==========================================
// 职责: 抽样器所需的全部分布（可 JSON 持久化于 config_kv）
// 说明: 分布取值本身不属于分配引擎，这里只提供一组合理默认值
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::{ContainerLength, ModeOfTransport, StorageRequirement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 停留时间分布（小时，三角分布）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DwellTime {
    pub minimum_hours: f64,
    pub average_hours: f64,
    pub maximum_hours: f64,
}

impl DwellTime {
    pub const fn new(minimum_hours: f64, average_hours: f64, maximum_hours: f64) -> Self {
        Self {
            minimum_hours,
            average_hours,
            maximum_hours,
        }
    }

    fn is_valid(&self) -> bool {
        self.minimum_hours >= 0.0
            && self.minimum_hours <= self.average_hours
            && self.average_hours <= self.maximum_hours
            && self.maximum_hours.is_finite()
    }
}

/// 箱重区间（吨，均匀分布）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRange {
    pub minimum_t: f64,
    pub maximum_t: f64,
}

// ==========================================
// DistributionSet - 分布集合
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSet {
    /// 进港方式 → 出港方式 → 权重
    pub mode_of_transport: BTreeMap<ModeOfTransport, BTreeMap<ModeOfTransport, f64>>,
    /// 进港方式 → 箱型 → 权重
    pub container_length: BTreeMap<ModeOfTransport, BTreeMap<ContainerLength, f64>>,
    /// 堆存要求 → 权重
    pub storage_requirement: BTreeMap<StorageRequirement, f64>,
    /// 进港方式 → 出港方式 → 停留时间
    pub dwell_time: BTreeMap<ModeOfTransport, BTreeMap<ModeOfTransport, DwellTime>>,
    /// 箱型 → 箱重区间
    pub container_weight: BTreeMap<ContainerLength, WeightRange>,
}

impl Default for DistributionSet {
    fn default() -> Self {
        use ModeOfTransport::*;

        let hinterland_row: BTreeMap<ModeOfTransport, f64> =
            [(Truck, 0.0), (Train, 0.0), (Barge, 0.0), (Feeder, 0.15), (DeepSeaVessel, 0.85)]
                .into_iter()
                .collect();

        let mut mode_of_transport = BTreeMap::new();
        mode_of_transport.insert(Truck, hinterland_row.clone());
        mode_of_transport.insert(Train, hinterland_row.clone());
        mode_of_transport.insert(Barge, hinterland_row);
        mode_of_transport.insert(
            Feeder,
            [(Truck, 0.3), (Train, 0.1), (Barge, 0.05), (Feeder, 0.05), (DeepSeaVessel, 0.5)]
                .into_iter()
                .collect(),
        );
        mode_of_transport.insert(
            DeepSeaVessel,
            [(Truck, 0.35), (Train, 0.15), (Barge, 0.05), (Feeder, 0.3), (DeepSeaVessel, 0.15)]
                .into_iter()
                .collect(),
        );

        let length_row: BTreeMap<ContainerLength, f64> = [
            (ContainerLength::TwentyFeet, 0.33),
            (ContainerLength::FortyFeet, 0.63),
            (ContainerLength::FortyFiveFeet, 0.03),
            (ContainerLength::Other, 0.01),
        ]
        .into_iter()
        .collect();
        let container_length = ModeOfTransport::ALL
            .iter()
            .map(|mode| (*mode, length_row.clone()))
            .collect();

        let storage_requirement = [
            (StorageRequirement::Standard, 0.8),
            (StorageRequirement::Empty, 0.12),
            (StorageRequirement::Reefer, 0.05),
            (StorageRequirement::DangerousGoods, 0.03),
        ]
        .into_iter()
        .collect();

        // 集卡提箱 3h~10d，集卡送箱 12h~14d，水水/海铁中转 12h~21d
        let mut dwell_time = BTreeMap::new();
        for from in ModeOfTransport::ALL {
            let row: BTreeMap<ModeOfTransport, DwellTime> = ModeOfTransport::ALL
                .iter()
                .map(|to| (*to, default_dwell_time(from, *to)))
                .collect();
            dwell_time.insert(from, row);
        }

        let container_weight = [
            (ContainerLength::TwentyFeet, WeightRange { minimum_t: 2.0, maximum_t: 24.0 }),
            (ContainerLength::FortyFeet, WeightRange { minimum_t: 4.0, maximum_t: 28.0 }),
            (ContainerLength::FortyFiveFeet, WeightRange { minimum_t: 4.0, maximum_t: 28.0 }),
            (ContainerLength::Other, WeightRange { minimum_t: 2.0, maximum_t: 20.0 }),
        ]
        .into_iter()
        .collect();

        Self {
            mode_of_transport,
            container_length,
            storage_requirement,
            dwell_time,
            container_weight,
        }
    }
}

impl DistributionSet {
    /// 校验所有分布：权重非负有限，每行权重和 > 0
    pub fn validate(&self) -> ConfigResult<()> {
        for from in ModeOfTransport::ALL {
            let row = self.mode_of_transport.get(&from).ok_or_else(|| {
                ConfigError::InvalidDistribution(format!("mode_of_transport 缺少 {} 行", from))
            })?;
            check_weights(&format!("mode_of_transport[{}]", from), row.values())?;

            let lengths = self.container_length.get(&from).ok_or_else(|| {
                ConfigError::InvalidDistribution(format!("container_length 缺少 {} 行", from))
            })?;
            check_weights(&format!("container_length[{}]", from), lengths.values())?;

            if let Some(dwell_row) = self.dwell_time.get(&from) {
                for (to, dwell) in dwell_row {
                    if !dwell.is_valid() {
                        return Err(ConfigError::InvalidDistribution(format!(
                            "dwell_time[{}][{}] 需满足 0 <= min <= avg <= max",
                            from, to
                        )));
                    }
                }
            }
        }

        check_weights("storage_requirement", self.storage_requirement.values())?;

        for (length, range) in &self.container_weight {
            if !(range.minimum_t >= 0.0 && range.minimum_t <= range.maximum_t) {
                return Err(ConfigError::InvalidDistribution(format!(
                    "container_weight[{}] 区间非法",
                    length
                )));
            }
        }

        Ok(())
    }

    /// 归一化后的运输方式转移概率 P(from → to)
    pub fn mode_probability(&self, from: ModeOfTransport, to: ModeOfTransport) -> f64 {
        let Some(row) = self.mode_of_transport.get(&from) else {
            return 0.0;
        };
        let total: f64 = row.values().sum();
        if total <= 0.0 {
            return 0.0;
        }
        row.get(&to).copied().unwrap_or(0.0) / total
    }

    /// 停留时间（缺省时回退到默认分布）
    pub fn dwell_time_for(&self, from: ModeOfTransport, to: ModeOfTransport) -> DwellTime {
        self.dwell_time
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .unwrap_or_else(|| default_dwell_time(from, to))
    }
}

/// 默认停留时间
fn default_dwell_time(from: ModeOfTransport, to: ModeOfTransport) -> DwellTime {
    match (from, to) {
        (_, ModeOfTransport::Truck) => DwellTime::new(3.0, 72.0, 240.0),
        (ModeOfTransport::Truck, _) => DwellTime::new(12.0, 120.0, 336.0),
        _ => DwellTime::new(12.0, 168.0, 504.0),
    }
}

fn check_weights<'a>(name: &str, weights: impl Iterator<Item = &'a f64>) -> ConfigResult<()> {
    let mut total = 0.0;
    for weight in weights {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(ConfigError::InvalidDistribution(format!(
                "{} 存在非法权重 {}",
                name, weight
            )));
        }
        total += weight;
    }
    if total <= 0.0 {
        return Err(ConfigError::InvalidDistribution(format!("{} 权重和必须大于 0", name)));
    }
    Ok(())
}
