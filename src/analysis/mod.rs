// ==========================================
// 集装箱码头流量合成系统 - 分析层
// ==========================================
// 职责: 生成前预览、生成后运力利用分析、集卡闸口吞吐、阶段运力快照
// 红线: 只读，不修改流量数据
// ==========================================

pub mod capacity_analysis;
pub mod preview;
pub mod statistics;
pub mod truck_gate_throughput;

pub use capacity_analysis::InboundAndOutboundVehicleCapacityAnalysis;
pub use preview::{ContainerFlowByVehicleTypePreview, InboundAndOutboundVehicleCapacityPreview};
pub use statistics::{CapacityStatusSnapshot, VehicleTypeStatus};
pub use truck_gate_throughput::{
    DailyTruckThroughput, TruckGateThroughputAnalysis, TruckGateThroughputReport,
};
