// ==========================================
// 集装箱码头流量合成系统 - 运力单位模型
// ==========================================
// 职责: 箱型长度 → 运力单位（TEU 当量）换算，运力汇总结构
// 红线: 所有运力运算必须经过 units_of，禁止直接按箱数计算
// ==========================================

use crate::domain::types::{ContainerLength, ModeOfTransport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 箱型对应的运力单位
pub fn units_of(length: ContainerLength) -> f64 {
    length.teu_factor()
}

/// 默认运力耗尽阈值
///
/// 剩余运力小于等于此值时，运输工具视为已满（避免残余碎片运力）
pub fn default_exhaustion_threshold() -> f64 {
    units_of(ContainerLength::Other)
}

/// 按箱型分组的箱量，换算为运力单位合计
pub fn units_of_counts(counts: &BTreeMap<ContainerLength, u64>) -> f64 {
    counts
        .iter()
        .map(|(length, count)| units_of(*length) * (*count as f64))
        .sum()
}

// ==========================================
// ContainerVolumeByVehicleType - 按运输方式汇总的箱量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerVolumeByVehicleType {
    /// 运输方式 → 运力单位合计；None 表示“不适用”（集卡无上限）
    pub teu: BTreeMap<ModeOfTransport, Option<f64>>,
    /// 运输方式 → 箱数（部分汇总不提供）
    pub containers: Option<BTreeMap<ModeOfTransport, u64>>,
}

impl ContainerVolumeByVehicleType {
    /// 所有运输方式初始化为 0
    pub fn zeroed(with_container_counts: bool) -> Self {
        Self {
            teu: ModeOfTransport::ALL.iter().map(|m| (*m, Some(0.0))).collect(),
            containers: with_container_counts
                .then(|| ModeOfTransport::ALL.iter().map(|m| (*m, 0)).collect()),
        }
    }

    /// 累加一只箱
    pub fn add_container(&mut self, mode: ModeOfTransport, length: ContainerLength) {
        self.add_teu(mode, units_of(length));
        if let Some(containers) = self.containers.as_mut() {
            *containers.entry(mode).or_insert(0) += 1;
        }
    }

    /// 累加运力单位（“不适用”项保持不适用）
    pub fn add_teu(&mut self, mode: ModeOfTransport, teu: f64) {
        let entry = self.teu.entry(mode).or_insert(Some(0.0));
        if let Some(value) = entry.as_mut() {
            *value += teu;
        }
    }

    /// 标记某运输方式为“不适用”
    pub fn mark_not_applicable(&mut self, mode: ModeOfTransport) {
        self.teu.insert(mode, None);
    }

    pub fn teu_of(&self, mode: ModeOfTransport) -> Option<f64> {
        self.teu.get(&mode).copied().flatten()
    }

    pub fn containers_of(&self, mode: ModeOfTransport) -> Option<u64> {
        self.containers.as_ref().and_then(|c| c.get(&mode).copied())
    }

    /// 运力单位总和（忽略“不适用”项）
    pub fn total_teu(&self) -> f64 {
        self.teu.values().flatten().sum()
    }
}

// ==========================================
// OutboundUsedAndMaximumCapacity - 出港已用/最大运力
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundUsedAndMaximumCapacity {
    pub used: ContainerVolumeByVehicleType,
    pub maximum: ContainerVolumeByVehicleType,
}
