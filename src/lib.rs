// ==========================================
// 集装箱码头流量合成系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按船期合成码头集装箱流量（运力约束分配）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 运力账本与分配流水线
pub mod engine;

// 分析层 - 预览与运力利用分析
pub mod analysis;

// 配置层 - 生成参数与分布
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 存储后端（直连 / 内存快照）
pub mod storage;

// 流量导出
pub mod export;

// 日志系统
pub mod logging;

// 应用层
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ContainerLength, ModeOfTransport, StorageRequirement};

// 领域实体
pub use domain::{
    Container, ContainerVolumeByVehicleType, GenerationProperties, OutboundUsedAndMaximumCapacity,
    Schedule, ScheduledVehicle, Truck,
};

// 引擎
pub use engine::{
    ContainerFlowGenerationService, GenerationError, GenerationReport, GenerationStage,
    VehicleCapacityLedger,
};

// 分析
pub use analysis::{
    ContainerFlowByVehicleTypePreview, InboundAndOutboundVehicleCapacityAnalysis,
    InboundAndOutboundVehicleCapacityPreview, TruckGateThroughputAnalysis,
};

pub use storage::PipelineMode;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "集装箱码头流量合成系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
