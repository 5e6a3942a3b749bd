// ==========================================
// 集装箱码头流量合成系统 - 应用状态
// ==========================================
// 职责: 管理共享连接、配置管理器与生成服务
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::info;

use crate::analysis::{InboundAndOutboundVehicleCapacityAnalysis, TruckGateThroughputAnalysis};
use crate::config::{ConfigManager, GenerationConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{ContainerFlowGenerationService, FlowRepositories, GenerationResult};

/// 应用状态
///
/// 所有组件共享同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub conn: Arc<Mutex<Connection>>,

    pub config_manager: Arc<ConfigManager>,

    pub generation_service: ContainerFlowGenerationService<ConfigManager>,
}

impl AppState {
    /// 打开（必要时创建）数据库并初始化 schema
    pub fn new(db_path: String) -> anyhow::Result<Self> {
        info!(db_path = %db_path, "初始化应用状态");

        let conn = open_sqlite_connection(&db_path)?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let generation_service = ContainerFlowGenerationService::new(config_manager.clone(), conn.clone())?;

        Ok(Self {
            db_path,
            conn,
            config_manager,
            generation_service,
        })
    }

    pub fn repositories(&self) -> FlowRepositories {
        FlowRepositories::from_connection(self.conn.clone())
    }

    /// 基于当前配置创建分析实例
    pub fn capacity_analysis(&self) -> GenerationResult<InboundAndOutboundVehicleCapacityAnalysis> {
        let properties = self.config_manager.load_properties()?;
        Ok(InboundAndOutboundVehicleCapacityAnalysis::new(
            self.repositories(),
            properties.transportation_buffer,
        ))
    }

    pub fn truck_gate_throughput(&self) -> TruckGateThroughputAnalysis {
        TruckGateThroughputAnalysis::new(self.repositories())
    }
}

/// 获取默认数据库路径
///
/// 优先级: CONTAINER_FLOW_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("CONTAINER_FLOW_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./container_flow.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("container-flow-gen");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("container_flow.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_on_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.db");
        let state = AppState::new(path.to_string_lossy().to_string()).unwrap();
        assert!(!state.generation_service.container_flow_data_exists().unwrap());
    }
}
