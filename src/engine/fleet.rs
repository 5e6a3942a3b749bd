// ==========================================
// 集装箱码头流量合成系统 - 船队生成阶段
// ==========================================
// 职责: 按船期生成运输工具实例，并为每个实例生成进港集装箱
// 红线: 进港箱量不得超过实例的进港装载量（由账本约束）
// ==========================================
// 说明:
// - 箱型按运输工具类型抽样；抽样箱型放不下时改用最小箱型，仍放不下则停止
// - 出港方式按进港运输工具类型抽样（后续阶段落实到具体实例）
// ==========================================

use crate::domain::capacity::units_of;
use crate::domain::container::Container;
use crate::domain::types::ContainerLength;
use crate::domain::vehicle::{Schedule, ScheduledVehicle};
use crate::engine::error::GenerationResult;
use crate::engine::stage::{
    AllocationStage, AssignedVehicle, AssignmentResult, GenerationStage, RunContext, StageOutcome,
};
use tracing::{debug, info, instrument};

pub struct FleetCreationStage;

impl FleetCreationStage {
    pub fn new() -> Self {
        Self
    }

    /// 为运输工具生成一只进港集装箱
    ///
    /// # 返回
    /// - (Assigned, Some(container), exhausted): 已预留进港运力
    /// - (RejectedAsInfeasible, None, true): 任何箱型都放不下
    pub fn process(
        &self,
        ctx: &mut RunContext,
        vehicle: &ScheduledVehicle,
    ) -> GenerationResult<(AssignmentResult, Option<Container>, bool)> {
        let sampled = ctx.sampler.sample_length(vehicle.vehicle_type);
        let length = if ctx.ledger.fits_inbound(vehicle, sampled)? {
            sampled
        } else if ctx.ledger.fits_inbound(vehicle, smallest_length())? {
            smallest_length()
        } else {
            return Ok((AssignmentResult::RejectedAsInfeasible, None, true));
        };

        let exhausted = ctx.ledger.reserve_inbound_capacity(vehicle, length)?;

        let picked_up_by = ctx.sampler.sample_pickup_mode(vehicle.vehicle_type);
        let container = Container {
            id: 0,
            length,
            weight_t: ctx.sampler.sample_weight(length),
            storage_requirement: ctx.sampler.sample_storage_requirement(),
            delivered_by: vehicle.vehicle_type,
            delivered_by_vehicle: Some(vehicle.id),
            delivered_by_truck: None,
            picked_up_by,
            picked_up_by_initial: picked_up_by,
            picked_up_by_vehicle: None,
            picked_up_by_truck: None,
            destination: None,
        };

        Ok((
            AssignmentResult::Assigned(AssignedVehicle::Scheduled { vehicle_id: vehicle.id }),
            Some(container),
            exhausted,
        ))
    }

    fn create_vehicles(
        &self,
        ctx: &mut RunContext,
        schedule: &Schedule,
        outcome: &mut StageOutcome,
    ) -> GenerationResult<()> {
        let arrivals = schedule.arrivals_within(ctx.properties.start_date, ctx.properties.end_date);

        for (n, arrival) in arrivals.into_iter().enumerate() {
            let mut vehicle = ScheduledVehicle {
                id: 0,
                vehicle_name: format!("{}-{:03}", schedule.service_name, n + 1),
                schedule_id: schedule.id,
                vehicle_type: schedule.vehicle_type,
                capacity_in_teu: schedule.average_vehicle_capacity,
                moved_capacity: schedule.average_moved_capacity,
                realized_arrival: arrival,
            };
            vehicle.id = ctx.repos.vehicle_repo.insert(&vehicle)?;
            outcome.vehicles_created += 1;

            let mut containers = Vec::new();
            loop {
                let (result, container, exhausted) = self.process(ctx, &vehicle)?;
                if let Some(container) = container {
                    outcome.record(&result);
                    containers.push(container);
                }
                if exhausted {
                    break;
                }
            }

            ctx.repos.container_repo.insert_batch(&containers)?;
            outcome.containers_created += containers.len();

            debug!(
                vehicle_id = vehicle.id,
                vehicle_name = %vehicle.vehicle_name,
                containers = containers.len(),
                "运输工具进港箱量生成完成"
            );
        }
        Ok(())
    }
}

impl Default for FleetCreationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStage for FleetCreationStage {
    fn name(&self) -> &'static str {
        "fleet_creation"
    }

    fn completes(&self) -> GenerationStage {
        GenerationStage::FleetCreated
    }

    #[instrument(skip(self, ctx), fields(stage = self.name()))]
    fn run(&mut self, ctx: &mut RunContext) -> GenerationResult<StageOutcome> {
        let mut outcome = StageOutcome::new(self.name());
        let schedules = ctx.repos.schedule_repo.find_all()?;

        for schedule in &schedules {
            self.create_vehicles(ctx, schedule, &mut outcome)?;
        }

        info!(
            schedules = schedules.len(),
            vehicles_created = outcome.vehicles_created,
            containers_created = outcome.containers_created,
            "船队生成完成"
        );
        Ok(outcome)
    }
}

/// 最小箱型（运力单位最小）
fn smallest_length() -> ContainerLength {
    ContainerLength::ALL
        .into_iter()
        .min_by(|a, b| units_of(*a).total_cmp(&units_of(*b)))
        .unwrap_or(ContainerLength::Other)
}
