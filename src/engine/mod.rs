// ==========================================
// 集装箱码头流量合成系统 - 引擎层
// ==========================================
// 职责: 运力账本 + 分配阶段 + 流水线编排
// 红线: Engine 不拼 SQL；任何分配必须先经账本预留运力
// ==========================================

pub mod destination;
pub mod error;
pub mod fleet;
pub mod ledger;
pub mod orchestrator;
pub mod outbound;
pub mod repositories;
pub mod sampler;
pub mod stage;
pub mod truck_delivery;
pub mod trucks;

// 重导出核心引擎
pub use destination::DestinationAssignmentStage;
pub use error::{GenerationError, GenerationResult};
pub use fleet::FleetCreationStage;
pub use ledger::{ContainerCounter, LedgerError, LedgerResult, VehicleCapacityLedger};
pub use orchestrator::{
    ClearSummary, ContainerFlowGenerationService, GenerationProgress, GenerationReport,
};
pub use outbound::OutboundAssignmentStage;
pub use repositories::FlowRepositories;
pub use sampler::{DistributionSampler, SeededDistributionSampler};
pub use stage::{
    AllocationStage, AssignedVehicle, AssignmentResult, DeferralReason, GenerationStage,
    RunContext, StageOutcome,
};
pub use truck_delivery::TruckDeliveryAllocationStage;
pub use trucks::{ExportTruckStage, ImportTruckStage};
