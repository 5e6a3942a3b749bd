// ==========================================
// 集装箱码头流量合成系统 - 运输工具领域模型
// ==========================================
// 职责: 船期/班期 (Schedule)、定班运输工具实例、集卡
// 红线: 账本只跟踪派生的剩余运力，不修改运输工具记录
// ==========================================

use crate::domain::types::ModeOfTransport;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Destination - 下一目的港
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub weight: f64, // 抽样权重（无需归一化）
}

// ==========================================
// Schedule - 船期/班期
// ==========================================
// 输入数据，清理历史流量时保留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub service_name: String,
    pub vehicle_type: ModeOfTransport,

    // ===== 时刻表 =====
    pub vehicle_arrives_at: NaiveDateTime,  // 首次到港时间
    pub vehicle_arrives_every_k_days: i64,  // 到港周期（天）；<= 0 表示只到港一次

    // ===== 运力参数 (TEU) =====
    pub average_vehicle_capacity: f64,      // 物理运力
    pub average_moved_capacity: f64,        // 平均进港装载量

    pub destinations: Vec<Destination>,
}

impl Schedule {
    /// 计算 [start_date, end_date) 内的全部到港时间
    pub fn arrivals_within(&self, start_date: NaiveDate, end_date: NaiveDate) -> Vec<NaiveDateTime> {
        let window_start = start_date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let window_end = end_date.and_hms_opt(0, 0, 0).unwrap_or_default();

        if self.vehicle_arrives_every_k_days <= 0 {
            return if self.vehicle_arrives_at >= window_start && self.vehicle_arrives_at < window_end {
                vec![self.vehicle_arrives_at]
            } else {
                Vec::new()
            };
        }

        let period = Duration::days(self.vehicle_arrives_every_k_days);
        let mut arrival = self.vehicle_arrives_at;

        // 首次到港早于窗口时，按周期前移到窗口内
        if arrival < window_start {
            let gap_days = (window_start - arrival).num_days();
            let periods = gap_days / self.vehicle_arrives_every_k_days;
            arrival += period * periods as i32;
            while arrival < window_start {
                arrival += period;
            }
        }

        let mut arrivals = Vec::new();
        while arrival < window_end {
            arrivals.push(arrival);
            arrival += period;
        }
        arrivals
    }
}

// ==========================================
// ScheduledVehicle - 定班运输工具实例（一次航次/班列）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledVehicle {
    pub id: i64,
    pub vehicle_name: String,
    pub schedule_id: i64,
    pub vehicle_type: ModeOfTransport,
    pub capacity_in_teu: f64,            // 物理运力
    pub moved_capacity: f64,             // 本次生成中实际进港装载量
    pub realized_arrival: NaiveDateTime, // 实际到港时间
}

impl ScheduledVehicle {
    /// 出港可用运力: min(进港装载量 × (1 + buffer), 物理运力)
    pub fn outbound_usable_capacity(&self, transportation_buffer: f64) -> f64 {
        (self.moved_capacity * (1.0 + transportation_buffer)).min(self.capacity_in_teu)
    }
}

// ==========================================
// Truck - 集卡（运力不受约束）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: i64,
    pub delivers_container: bool,
    pub picks_up_container: bool,
    pub planned_arrival: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_schedule(first: NaiveDateTime) -> Schedule {
        Schedule {
            id: 1,
            service_name: "NORDIC-EXPRESS".to_string(),
            vehicle_type: ModeOfTransport::Feeder,
            vehicle_arrives_at: first,
            vehicle_arrives_every_k_days: 7,
            average_vehicle_capacity: 800.0,
            average_moved_capacity: 300.0,
            destinations: vec![],
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_arrivals_within_window() {
        let schedule = weekly_schedule(at(2026, 3, 2, 8));
        let arrivals = schedule.arrivals_within(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 22).unwrap(),
        );
        assert_eq!(arrivals, vec![at(2026, 3, 2, 8), at(2026, 3, 9, 8), at(2026, 3, 16, 8)]);
    }

    #[test]
    fn test_arrivals_first_arrival_before_window() {
        let schedule = weekly_schedule(at(2026, 1, 5, 8));
        let arrivals = schedule.arrivals_within(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        );
        assert_eq!(arrivals, vec![at(2026, 3, 2, 8), at(2026, 3, 9, 8)]);
    }

    #[test]
    fn test_single_call_schedule() {
        let mut schedule = weekly_schedule(at(2026, 3, 4, 12));
        schedule.vehicle_arrives_every_k_days = 0;
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(schedule.arrivals_within(start, end).len(), 1);

        schedule.vehicle_arrives_at = at(2026, 3, 10, 0);
        assert!(schedule.arrivals_within(start, end).is_empty());
    }

    #[test]
    fn test_outbound_usable_capacity_is_capped() {
        let vehicle = ScheduledVehicle {
            id: 1,
            vehicle_name: "V1".to_string(),
            schedule_id: 1,
            vehicle_type: ModeOfTransport::Feeder,
            capacity_in_teu: 120.0,
            moved_capacity: 100.0,
            realized_arrival: at(2026, 3, 2, 8),
        };
        assert!((vehicle.outbound_usable_capacity(0.1) - 110.0).abs() < 1e-9);
        assert_eq!(vehicle.outbound_usable_capacity(0.5), 120.0);
    }
}
