// ==========================================
// 集装箱码头流量合成系统 - 出港运输工具分配阶段
// ==========================================
// 职责: 为出港方式为定班运输工具的集装箱指定具体实例
// 红线: 账本报告运力不足的实例不得分配
// ==========================================
// 候选排序:
// 1) 到港时间与期望离港时间（到港 + 抽样停留）的距离
// 2) 出港剩余运力降序
// 3) 实例 ID
// 无可用候选时改派集卡，保留 picked_up_by_initial
// ==========================================

use crate::domain::types::ModeOfTransport;
use crate::domain::vehicle::ScheduledVehicle;
use crate::engine::error::GenerationResult;
use crate::engine::stage::{
    hours, AllocationStage, AssignedVehicle, AssignmentResult, DeferralReason, GenerationStage,
    RunContext, StageOutcome,
};
use crate::repository::{ContainerSelection, ContainerWithTimes};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{info, instrument};

pub struct OutboundAssignmentStage {
    vehicles_by_type: BTreeMap<ModeOfTransport, Vec<ScheduledVehicle>>,
}

impl OutboundAssignmentStage {
    pub fn new() -> Self {
        Self {
            vehicles_by_type: BTreeMap::new(),
        }
    }

    fn load_vehicles(&mut self, ctx: &RunContext) -> GenerationResult<()> {
        self.vehicles_by_type.clear();
        for vehicle in ctx.repos.vehicle_repo.find_all()? {
            self.vehicles_by_type
                .entry(vehicle.vehicle_type)
                .or_default()
                .push(vehicle);
        }
        Ok(())
    }

    /// 为单只集装箱选择出港实例
    pub fn process(&self, ctx: &mut RunContext, item: &ContainerWithTimes) -> GenerationResult<AssignmentResult> {
        let container = &item.container;
        let Some(arrival) = item.arrival else {
            return self.redirect(ctx, container.id);
        };

        let dwell = ctx.sampler.distributions().dwell_time_for(container.delivered_by, container.picked_up_by);
        let earliest = arrival + hours(dwell.minimum_hours);
        let latest = arrival + hours(dwell.maximum_hours);
        let preferred = arrival + hours(ctx.sampler.sample_dwell_hours(container.delivered_by, container.picked_up_by));

        let mut candidates: Vec<(i64, f64, &ScheduledVehicle)> = Vec::new();
        if let Some(vehicles) = self.vehicles_by_type.get(&container.picked_up_by) {
            for vehicle in vehicles {
                if vehicle.realized_arrival < earliest || vehicle.realized_arrival > latest {
                    continue;
                }
                if Some(vehicle.id) == container.delivered_by_vehicle {
                    continue;
                }
                let distance = (vehicle.realized_arrival - preferred).num_seconds().abs();
                let free = ctx.ledger.get_free_outbound_capacity(vehicle)?;
                candidates.push((distance, free, vehicle));
            }
        }

        candidates.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });

        for (_, _, vehicle) in candidates {
            if ctx.ledger.fits_outbound(vehicle, container.length)? {
                ctx.ledger.reserve_outbound_capacity(vehicle, container.length)?;
                ctx.repos.container_repo.assign_pickup_vehicle(container.id, vehicle.id)?;
                return Ok(AssignmentResult::Assigned(AssignedVehicle::Scheduled {
                    vehicle_id: vehicle.id,
                }));
            }
        }

        self.redirect(ctx, container.id)
    }

    fn redirect(&self, ctx: &mut RunContext, container_id: i64) -> GenerationResult<AssignmentResult> {
        ctx.repos.container_repo.redirect_pickup_to_truck(container_id)?;
        Ok(AssignmentResult::Deferred(DeferralReason::RedirectedToTruck))
    }
}

impl Default for OutboundAssignmentStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStage for OutboundAssignmentStage {
    fn name(&self) -> &'static str {
        "outbound_assignment"
    }

    fn completes(&self) -> GenerationStage {
        GenerationStage::OutboundAssigned
    }

    #[instrument(skip(self, ctx), fields(stage = self.name()))]
    fn run(&mut self, ctx: &mut RunContext) -> GenerationResult<StageOutcome> {
        let mut outcome = StageOutcome::new(self.name());
        self.load_vehicles(ctx)?;

        let containers = ctx
            .repos
            .container_repo
            .find_with_times(ContainerSelection::AwaitingScheduledPickup)?;

        for item in &containers {
            let result = self.process(ctx, item)?;
            outcome.record(&result);
        }

        info!(
            containers = containers.len(),
            assigned = outcome.assigned,
            redirected_to_truck = outcome.deferred,
            "出港运输工具分配完成"
        );
        Ok(outcome)
    }
}
