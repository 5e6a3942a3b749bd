// ==========================================
// 集装箱码头流量合成系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、运力单位模型
// 红线: 不含数据访问逻辑,不含分配逻辑
// ==========================================

pub mod capacity;
pub mod container;
pub mod properties;
pub mod types;
pub mod vehicle;

// 重导出核心类型
pub use capacity::{
    default_exhaustion_threshold, units_of, ContainerVolumeByVehicleType,
    OutboundUsedAndMaximumCapacity,
};
pub use container::Container;
pub use properties::GenerationProperties;
pub use types::{ContainerLength, ModeOfTransport, StorageRequirement};
pub use vehicle::{Destination, Schedule, ScheduledVehicle, Truck};
