// ==========================================
// 集装箱码头流量合成系统 - 集卡生成阶段
// ==========================================
// 集卡运力不受约束，每只集装箱对应一辆集卡
// - 进口集卡: 提走由定班运输工具送达的集装箱，到达 = 箱到港 + 抽样停留
// - 出口集卡: 送达由定班运输工具提走的集装箱，到达 = 实例到港 − 抽样停留（不早于窗口起点）
// ==========================================

use crate::domain::types::ModeOfTransport;
use crate::domain::vehicle::Truck;
use crate::engine::error::GenerationResult;
use crate::engine::stage::{
    hours, AllocationStage, AssignedVehicle, AssignmentResult, GenerationStage, RunContext,
    StageOutcome,
};
use crate::repository::{ContainerSelection, ContainerWithTimes};
use tracing::{info, instrument, warn};

// ==========================================
// ImportTruckStage - 进口集卡
// ==========================================
pub struct ImportTruckStage;

impl ImportTruckStage {
    pub fn new() -> Self {
        Self
    }

    pub fn process(&self, ctx: &mut RunContext, item: &ContainerWithTimes) -> GenerationResult<AssignmentResult> {
        let container = &item.container;
        let Some(arrival) = item.arrival else {
            warn!(container_id = container.id, "集装箱缺少到港时间，跳过进口集卡生成");
            return Ok(AssignmentResult::RejectedAsInfeasible);
        };

        let dwell = ctx
            .sampler
            .sample_dwell_hours(container.delivered_by, ModeOfTransport::Truck);
        let truck = Truck {
            id: 0,
            delivers_container: false,
            picks_up_container: true,
            planned_arrival: arrival + hours(dwell),
        };
        let truck_id = ctx.repos.truck_repo.insert(&truck)?;
        ctx.repos.container_repo.assign_pickup_truck(container.id, truck_id)?;

        Ok(AssignmentResult::Assigned(AssignedVehicle::Truck { truck_id }))
    }
}

impl Default for ImportTruckStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStage for ImportTruckStage {
    fn name(&self) -> &'static str {
        "import_trucks"
    }

    fn completes(&self) -> GenerationStage {
        GenerationStage::ImportTrucksGenerated
    }

    #[instrument(skip(self, ctx), fields(stage = self.name()))]
    fn run(&mut self, ctx: &mut RunContext) -> GenerationResult<StageOutcome> {
        let mut outcome = StageOutcome::new(self.name());
        let containers = ctx
            .repos
            .container_repo
            .find_with_times(ContainerSelection::TruckPickupWithoutTruck)?;

        for item in &containers {
            let result = self.process(ctx, item)?;
            if matches!(result, AssignmentResult::Assigned(_)) {
                outcome.trucks_created += 1;
            }
            outcome.record(&result);
        }

        info!(trucks_created = outcome.trucks_created, "进口集卡生成完成");
        Ok(outcome)
    }
}

// ==========================================
// ExportTruckStage - 出口集卡
// ==========================================
pub struct ExportTruckStage;

impl ExportTruckStage {
    pub fn new() -> Self {
        Self
    }

    pub fn process(&self, ctx: &mut RunContext, item: &ContainerWithTimes) -> GenerationResult<AssignmentResult> {
        let container = &item.container;
        let Some(departure) = item.departure else {
            warn!(container_id = container.id, "集装箱缺少离港时间，跳过出口集卡生成");
            return Ok(AssignmentResult::RejectedAsInfeasible);
        };

        let dwell = ctx
            .sampler
            .sample_dwell_hours(ModeOfTransport::Truck, container.picked_up_by);
        let planned_arrival = (departure - hours(dwell)).max(ctx.window_start());

        let truck = Truck {
            id: 0,
            delivers_container: true,
            picks_up_container: false,
            planned_arrival,
        };
        let truck_id = ctx.repos.truck_repo.insert(&truck)?;
        ctx.repos.container_repo.assign_delivery_truck(container.id, truck_id)?;

        Ok(AssignmentResult::Assigned(AssignedVehicle::Truck { truck_id }))
    }
}

impl Default for ExportTruckStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStage for ExportTruckStage {
    fn name(&self) -> &'static str {
        "export_trucks"
    }

    fn completes(&self) -> GenerationStage {
        GenerationStage::ExportTrucksGenerated
    }

    #[instrument(skip(self, ctx), fields(stage = self.name()))]
    fn run(&mut self, ctx: &mut RunContext) -> GenerationResult<StageOutcome> {
        let mut outcome = StageOutcome::new(self.name());
        let containers = ctx
            .repos
            .container_repo
            .find_with_times(ContainerSelection::TruckDeliveryWithoutTruck)?;

        for item in &containers {
            let result = self.process(ctx, item)?;
            if matches!(result, AssignmentResult::Assigned(_)) {
                outcome.trucks_created += 1;
            }
            outcome.record(&result);
        }

        info!(trucks_created = outcome.trucks_created, "出口集卡生成完成");
        Ok(outcome)
    }
}
