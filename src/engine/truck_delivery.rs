// ==========================================
// 集装箱码头流量合成系统 - 集卡送达集装箱分配阶段
// ==========================================
// 职责: 为每个定班运输工具生成由集卡送达、由该实例提走的出口集装箱
// 红线: 只在出港剩余运力足够时预留；放不下的需求记为不可行并丢弃
// ==========================================
// 需求 = 进港装载量 × P(运输工具类型 → 集卡)（运力单位）
// ==========================================

use crate::domain::capacity::units_of;
use crate::domain::container::Container;
use crate::domain::types::{ContainerLength, ModeOfTransport};
use crate::domain::vehicle::ScheduledVehicle;
use crate::engine::error::GenerationResult;
use crate::engine::stage::{
    AllocationStage, AssignedVehicle, AssignmentResult, GenerationStage, RunContext, StageOutcome,
};
use tracing::{debug, info, instrument};

pub struct TruckDeliveryAllocationStage;

impl TruckDeliveryAllocationStage {
    pub fn new() -> Self {
        Self
    }

    /// 集卡送达需求（运力单位）
    pub fn demand_for(ctx: &RunContext, vehicle: &ScheduledVehicle) -> f64 {
        let probability = ctx
            .sampler
            .distributions()
            .mode_probability(vehicle.vehicle_type, ModeOfTransport::Truck);
        vehicle.moved_capacity * probability
    }

    /// 在实例出港段预留一只集卡送达的集装箱
    pub fn process(
        &self,
        ctx: &mut RunContext,
        vehicle: &ScheduledVehicle,
        length: ContainerLength,
    ) -> GenerationResult<(AssignmentResult, Option<Container>, bool)> {
        if !ctx.ledger.fits_outbound(vehicle, length)? {
            return Ok((AssignmentResult::RejectedAsInfeasible, None, true));
        }
        let exhausted = ctx.ledger.reserve_outbound_capacity(vehicle, length)?;

        let container = Container {
            id: 0,
            length,
            weight_t: ctx.sampler.sample_weight(length),
            storage_requirement: ctx.sampler.sample_storage_requirement(),
            delivered_by: ModeOfTransport::Truck,
            delivered_by_vehicle: None,
            delivered_by_truck: None,
            picked_up_by: vehicle.vehicle_type,
            picked_up_by_initial: vehicle.vehicle_type,
            picked_up_by_vehicle: Some(vehicle.id),
            picked_up_by_truck: None,
            destination: None,
        };

        Ok((
            AssignmentResult::Assigned(AssignedVehicle::Scheduled { vehicle_id: vehicle.id }),
            Some(container),
            exhausted,
        ))
    }

    fn allocate_vehicle(
        &self,
        ctx: &mut RunContext,
        vehicle: &ScheduledVehicle,
        outcome: &mut StageOutcome,
    ) -> GenerationResult<()> {
        let mut remaining = Self::demand_for(ctx, vehicle);
        let smallest = units_of(ContainerLength::Other);
        let mut containers = Vec::new();

        while remaining >= smallest {
            let mut length = ctx.sampler.sample_length(ModeOfTransport::Truck);
            if units_of(length) > remaining {
                length = ContainerLength::Other;
            }

            let (result, container, exhausted) = self.process(ctx, vehicle, length)?;
            outcome.record(&result);
            match container {
                Some(container) => {
                    remaining -= container.occupied_teu();
                    containers.push(container);
                }
                None => {
                    // 剩余需求无法满足，丢弃
                    outcome.rejected_teu += remaining;
                    debug!(
                        vehicle_id = vehicle.id,
                        rejected_teu = remaining,
                        "集卡送达需求超出出港运力"
                    );
                    break;
                }
            }
            if exhausted {
                if remaining >= smallest {
                    outcome.rejected += 1;
                    outcome.rejected_teu += remaining;
                }
                break;
            }
        }

        ctx.repos.container_repo.insert_batch(&containers)?;
        outcome.containers_created += containers.len();
        Ok(())
    }
}

impl Default for TruckDeliveryAllocationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStage for TruckDeliveryAllocationStage {
    fn name(&self) -> &'static str {
        "truck_delivery_allocation"
    }

    fn completes(&self) -> GenerationStage {
        GenerationStage::DeliveredContainersAllocated
    }

    #[instrument(skip(self, ctx), fields(stage = self.name()))]
    fn run(&mut self, ctx: &mut RunContext) -> GenerationResult<StageOutcome> {
        let mut outcome = StageOutcome::new(self.name());
        let vehicles = ctx.repos.vehicle_repo.find_all()?;

        for vehicle in &vehicles {
            self.allocate_vehicle(ctx, vehicle, &mut outcome)?;
        }

        info!(
            vehicles = vehicles.len(),
            containers_created = outcome.containers_created,
            rejected = outcome.rejected,
            rejected_teu = outcome.rejected_teu,
            "集卡送达集装箱分配完成"
        );
        Ok(outcome)
    }
}
