// ==========================================
// 集装箱码头流量合成系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合生成流水线所需的所有 Repository
// 约束: 所有仓储共享同一连接（直连库或快照内存库）
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    ContainerRepository, ScheduleRepository, ScheduledVehicleRepository, TruckRepository,
};

/// 生成流水线仓储集合
///
/// # 包含的仓储
/// - `schedule_repo`: 船期（输入数据）
/// - `vehicle_repo`: 定班运输工具实例
/// - `truck_repo`: 集卡
/// - `container_repo`: 集装箱
#[derive(Clone)]
pub struct FlowRepositories {
    pub schedule_repo: Arc<ScheduleRepository>,
    pub vehicle_repo: Arc<ScheduledVehicleRepository>,
    pub truck_repo: Arc<TruckRepository>,
    pub container_repo: Arc<ContainerRepository>,
}

impl FlowRepositories {
    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            schedule_repo: Arc::new(ScheduleRepository::from_connection(conn.clone())),
            vehicle_repo: Arc::new(ScheduledVehicleRepository::from_connection(conn.clone())),
            truck_repo: Arc::new(TruckRepository::from_connection(conn.clone())),
            container_repo: Arc::new(ContainerRepository::from_connection(conn)),
        }
    }
}
