// ==========================================
// 集装箱码头流量合成系统 - 目的港分配阶段
// ==========================================
// 由定班运输工具提走的集装箱，按船期目的港权重抽样
// 船期未定义目的港时不分配
// ==========================================

use crate::domain::vehicle::Destination;
use crate::engine::error::GenerationResult;
use crate::engine::stage::{
    AllocationStage, AssignedVehicle, AssignmentResult, DeferralReason, GenerationStage, RunContext,
    StageOutcome,
};
use crate::repository::{ContainerSelection, ContainerWithTimes};
use std::collections::HashMap;
use tracing::{info, instrument};

pub struct DestinationAssignmentStage {
    // 实例 ID → 船期目的港
    destinations_by_vehicle: HashMap<i64, Vec<Destination>>,
}

impl DestinationAssignmentStage {
    pub fn new() -> Self {
        Self {
            destinations_by_vehicle: HashMap::new(),
        }
    }

    fn load_destinations(&mut self, ctx: &RunContext) -> GenerationResult<()> {
        let schedules: HashMap<i64, Vec<Destination>> = ctx
            .repos
            .schedule_repo
            .find_all()?
            .into_iter()
            .map(|s| (s.id, s.destinations))
            .collect();

        self.destinations_by_vehicle = ctx
            .repos
            .vehicle_repo
            .find_all()?
            .into_iter()
            .map(|v| (v.id, schedules.get(&v.schedule_id).cloned().unwrap_or_default()))
            .collect();
        Ok(())
    }

    pub fn process(&self, ctx: &mut RunContext, item: &ContainerWithTimes) -> GenerationResult<AssignmentResult> {
        let container = &item.container;
        let Some(vehicle_id) = container.picked_up_by_vehicle else {
            return Ok(AssignmentResult::RejectedAsInfeasible);
        };

        let destinations = self
            .destinations_by_vehicle
            .get(&vehicle_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        match ctx.sampler.sample_destination(destinations) {
            Some(index) => {
                ctx.repos
                    .container_repo
                    .set_destination(container.id, &destinations[index].name)?;
                Ok(AssignmentResult::Assigned(AssignedVehicle::Scheduled { vehicle_id }))
            }
            None => Ok(AssignmentResult::Deferred(DeferralReason::NoDestinationsDefined)),
        }
    }
}

impl Default for DestinationAssignmentStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStage for DestinationAssignmentStage {
    fn name(&self) -> &'static str {
        "destination_assignment"
    }

    fn completes(&self) -> GenerationStage {
        GenerationStage::DestinationsAssigned
    }

    #[instrument(skip(self, ctx), fields(stage = self.name()))]
    fn run(&mut self, ctx: &mut RunContext) -> GenerationResult<StageOutcome> {
        let mut outcome = StageOutcome::new(self.name());
        self.load_destinations(ctx)?;

        let containers = ctx
            .repos
            .container_repo
            .find_with_times(ContainerSelection::ScheduledPickupWithoutDestination)?;
        for item in &containers {
            let result = self.process(ctx, item)?;
            outcome.record(&result);
        }

        info!(
            assigned = outcome.assigned,
            without_destinations = outcome.deferred,
            "目的港分配完成"
        );
        Ok(outcome)
    }
}
