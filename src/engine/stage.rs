// ==========================================
// 集装箱码头流量合成系统 - 分配阶段公共定义
// ==========================================
// 职责: 运行上下文、阶段 trait、单元分配结果、阶段统计、流水线状态
// ==========================================

use crate::domain::properties::GenerationProperties;
use crate::engine::error::GenerationResult;
use crate::engine::ledger::VehicleCapacityLedger;
use crate::engine::repositories::FlowRepositories;
use crate::engine::sampler::DistributionSampler;
use crate::repository::ContainerRepository;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// 基于集装箱仓储计数的账本
pub type FlowLedger = VehicleCapacityLedger<Arc<ContainerRepository>>;

// ==========================================
// RunContext - 单次运行上下文
// ==========================================
// 账本为单写者状态，每次运行新建，按 &mut 传入各阶段
pub struct RunContext {
    pub properties: GenerationProperties,
    pub repos: FlowRepositories,
    pub ledger: FlowLedger,
    pub sampler: Box<dyn DistributionSampler>,
}

impl RunContext {
    /// 生成窗口起点（当日零点）
    pub fn window_start(&self) -> NaiveDateTime {
        self.properties.start_date.and_time(chrono::NaiveTime::MIN)
    }
}

// ==========================================
// AssignmentResult - 单元分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignedVehicle {
    Scheduled { vehicle_id: i64 },
    Truck { truck_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeferralReason {
    RedirectedToTruck,  // 无可用定班运输工具，改派集卡
    NoDestinationsDefined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentResult {
    Assigned(AssignedVehicle),
    Deferred(DeferralReason),
    RejectedAsInfeasible,
}

// ==========================================
// StageOutcome - 阶段统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageOutcome {
    pub stage: String,
    pub vehicles_created: usize,
    pub containers_created: usize,
    pub trucks_created: usize,
    pub assigned: usize,
    pub deferred: usize,
    pub rejected: usize,
    pub rejected_teu: f64, // 无法满足的需求（运力单位）
}

impl StageOutcome {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, result: &AssignmentResult) {
        match result {
            AssignmentResult::Assigned(_) => self.assigned += 1,
            AssignmentResult::Deferred(_) => self.deferred += 1,
            AssignmentResult::RejectedAsInfeasible => self.rejected += 1,
        }
    }
}

// ==========================================
// AllocationStage Trait
// ==========================================
pub trait AllocationStage {
    fn name(&self) -> &'static str;

    /// 流水线中该阶段完成后的状态
    fn completes(&self) -> GenerationStage;

    fn run(&mut self, ctx: &mut RunContext) -> GenerationResult<StageOutcome>;
}

/// 小时数 → chrono::Duration（秒级取整）
pub fn hours(value: f64) -> Duration {
    Duration::seconds((value * 3600.0).round() as i64)
}

// ==========================================
// GenerationStage - 流水线状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStage {
    Idle,
    PriorDataCleared,
    PropertiesLoaded,
    FleetCreated,
    OutboundAssigned,
    ImportTrucksGenerated,
    DeliveredContainersAllocated,
    ExportTrucksGenerated,
    DestinationsAssigned,
    Done,
}

impl GenerationStage {
    /// 严格顺序的下一状态
    pub fn next(&self) -> Option<GenerationStage> {
        use GenerationStage::*;
        match self {
            Idle => Some(PriorDataCleared),
            PriorDataCleared => Some(PropertiesLoaded),
            PropertiesLoaded => Some(FleetCreated),
            FleetCreated => Some(OutboundAssigned),
            OutboundAssigned => Some(ImportTrucksGenerated),
            ImportTrucksGenerated => Some(DeliveredContainersAllocated),
            DeliveredContainersAllocated => Some(ExportTrucksGenerated),
            ExportTrucksGenerated => Some(DestinationsAssigned),
            DestinationsAssigned => Some(Done),
            Done => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Idle => "IDLE",
            GenerationStage::PriorDataCleared => "PRIOR_DATA_CLEARED",
            GenerationStage::PropertiesLoaded => "PROPERTIES_LOADED",
            GenerationStage::FleetCreated => "FLEET_CREATED",
            GenerationStage::OutboundAssigned => "OUTBOUND_ASSIGNED",
            GenerationStage::ImportTrucksGenerated => "IMPORT_TRUCKS_GENERATED",
            GenerationStage::DeliveredContainersAllocated => "DELIVERED_CONTAINERS_ALLOCATED",
            GenerationStage::ExportTrucksGenerated => "EXPORT_TRUCKS_GENERATED",
            GenerationStage::DestinationsAssigned => "DESTINATIONS_ASSIGNED",
            GenerationStage::Done => "DONE",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
