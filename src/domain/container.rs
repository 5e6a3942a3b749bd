// ==========================================
// 集装箱码头流量合成系统 - 集装箱领域模型
// ==========================================
// 职责: 单只集装箱的进港/出港两段运输关系
// 红线: 进港段由且仅由一个运输工具（或集卡）完成，出港段同理
// ==========================================

use crate::domain::capacity::units_of;
use crate::domain::types::{ContainerLength, ModeOfTransport, StorageRequirement};
use serde::{Deserialize, Serialize};

// ==========================================
// Container - 集装箱
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: i64, // 新建时为 0，由仓储分配

    // ===== 箱属性 =====
    pub length: ContainerLength,
    pub weight_t: f64,
    pub storage_requirement: StorageRequirement,

    // ===== 进港段 =====
    pub delivered_by: ModeOfTransport,
    pub delivered_by_vehicle: Option<i64>,
    pub delivered_by_truck: Option<i64>,

    // ===== 出港段 =====
    pub picked_up_by: ModeOfTransport,
    pub picked_up_by_initial: ModeOfTransport, // 首次抽样的出港方式（改派集卡前）
    pub picked_up_by_vehicle: Option<i64>,
    pub picked_up_by_truck: Option<i64>,

    pub destination: Option<String>,
}

impl Container {
    /// 占用运力单位
    pub fn occupied_teu(&self) -> f64 {
        units_of(self.length)
    }

    /// 出港段是否仍待指定定班运输工具
    pub fn awaits_scheduled_pickup(&self) -> bool {
        self.picked_up_by.is_scheduled() && self.picked_up_by_vehicle.is_none()
    }
}
