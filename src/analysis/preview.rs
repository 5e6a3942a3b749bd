// ==========================================
// 集装箱码头流量合成系统 - 运力预览（生成前估算）
// ==========================================
// 输入: 船期 + 时间窗 + 运力缓冲 + （假设的）运输方式分布
// 输出: 按运输方式的进港箱量、出港已用/最大运力、进→出流量矩阵
// ==========================================
// 估算规则:
// - 定班运输方式进港 = Σ 到港次数 × 平均进港装载量
// - 集卡进港 = Σ_t 进港(t) × P(t → 集卡)
// - 出港已用(to) = Σ_from 进港(from) × P(from → to)
// - 出港最大 = Σ 到港次数 × min(装载量 × (1 + buffer), 物理运力)；集卡不适用
// ==========================================

use crate::config::distribution::DistributionSet;
use crate::domain::capacity::{ContainerVolumeByVehicleType, OutboundUsedAndMaximumCapacity};
use crate::domain::types::ModeOfTransport;
use crate::domain::vehicle::Schedule;
use chrono::NaiveDate;
use std::collections::BTreeMap;

// ==========================================
// InboundAndOutboundVehicleCapacityPreview
// ==========================================
pub struct InboundAndOutboundVehicleCapacityPreview {
    schedules: Vec<Schedule>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    transportation_buffer: f64,
    distributions: DistributionSet,
}

impl InboundAndOutboundVehicleCapacityPreview {
    pub fn new(
        schedules: Vec<Schedule>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        transportation_buffer: f64,
        distributions: DistributionSet,
    ) -> Self {
        Self {
            schedules,
            start_date,
            end_date,
            transportation_buffer,
            distributions,
        }
    }

    /// 替换运输方式分布（假设分析）
    pub fn hypothesize_with_mode_of_transport_distribution(
        &mut self,
        mode_of_transport: BTreeMap<ModeOfTransport, BTreeMap<ModeOfTransport, f64>>,
    ) {
        self.distributions.mode_of_transport = mode_of_transport;
    }

    /// 各运输方式进港运力单位
    pub fn inbound_teu_by_vehicle_type(&self) -> BTreeMap<ModeOfTransport, f64> {
        let mut inbound: BTreeMap<ModeOfTransport, f64> =
            ModeOfTransport::ALL.iter().map(|m| (*m, 0.0)).collect();

        for schedule in &self.schedules {
            let arrivals = schedule.arrivals_within(self.start_date, self.end_date).len() as f64;
            *inbound.entry(schedule.vehicle_type).or_insert(0.0) +=
                arrivals * schedule.average_moved_capacity;
        }

        let truck: f64 = ModeOfTransport::SCHEDULED
            .iter()
            .map(|m| inbound[m] * self.distributions.mode_probability(*m, ModeOfTransport::Truck))
            .sum();
        inbound.insert(ModeOfTransport::Truck, truck);
        inbound
    }

    pub fn get_inbound_capacity_of_vehicles(&self) -> ContainerVolumeByVehicleType {
        let mut volume = ContainerVolumeByVehicleType::zeroed(false);
        for (mode, teu) in self.inbound_teu_by_vehicle_type() {
            volume.add_teu(mode, teu);
        }
        volume
    }

    pub fn get_outbound_capacity_of_vehicles(&self) -> OutboundUsedAndMaximumCapacity {
        let inbound = self.inbound_teu_by_vehicle_type();

        let mut used = ContainerVolumeByVehicleType::zeroed(false);
        for (from, teu) in &inbound {
            for to in ModeOfTransport::ALL {
                used.add_teu(to, teu * self.distributions.mode_probability(*from, to));
            }
        }

        let mut maximum = ContainerVolumeByVehicleType::zeroed(false);
        for schedule in &self.schedules {
            let arrivals = schedule.arrivals_within(self.start_date, self.end_date).len() as f64;
            let per_call = (schedule.average_moved_capacity * (1.0 + self.transportation_buffer))
                .min(schedule.average_vehicle_capacity);
            maximum.add_teu(schedule.vehicle_type, arrivals * per_call);
        }
        maximum.mark_not_applicable(ModeOfTransport::Truck);

        OutboundUsedAndMaximumCapacity { used, maximum }
    }
}

// ==========================================
// ContainerFlowByVehicleTypePreview - 进→出流量矩阵
// ==========================================
pub struct ContainerFlowByVehicleTypePreview {
    capacity_preview: InboundAndOutboundVehicleCapacityPreview,
}

impl ContainerFlowByVehicleTypePreview {
    pub fn new(capacity_preview: InboundAndOutboundVehicleCapacityPreview) -> Self {
        Self { capacity_preview }
    }

    /// flow[from][to] = 进港(from) × P(from → to)
    pub fn get_inbound_to_outbound_flow(&self) -> BTreeMap<ModeOfTransport, BTreeMap<ModeOfTransport, f64>> {
        let distributions = &self.capacity_preview.distributions;
        self.capacity_preview
            .inbound_teu_by_vehicle_type()
            .into_iter()
            .map(|(from, teu)| {
                let row = ModeOfTransport::ALL
                    .iter()
                    .map(|to| (*to, teu * distributions.mode_probability(from, *to)))
                    .collect();
                (from, row)
            })
            .collect()
    }
}
