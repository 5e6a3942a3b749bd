// ==========================================
// 集装箱码头流量合成系统 - 演示数据
// ==========================================
// 一组覆盖全部定班运输方式的船期 + 生成参数
// ==========================================

use chrono::{Duration, NaiveDate};

use crate::config::ConfigManager;
use crate::domain::properties::{GenerationProperties, DEFAULT_TRANSPORTATION_BUFFER};
use crate::domain::types::ModeOfTransport;
use crate::domain::vehicle::{Destination, Schedule};
use crate::engine::{FlowRepositories, GenerationResult};

/// 写入演示船期（已有船期时跳过）与生成参数
///
/// # 返回
/// - Ok(usize): 新写入的船期数量
pub fn seed_demo_schedules(
    repos: &FlowRepositories,
    config_manager: &ConfigManager,
    start_date: NaiveDate,
    horizon_days: i64,
) -> GenerationResult<usize> {
    let properties = GenerationProperties::new(
        start_date,
        start_date + Duration::days(horizon_days),
        DEFAULT_TRANSPORTATION_BUFFER,
    );
    config_manager.save_properties(&properties)?;

    if !repos.schedule_repo.find_all()?.is_empty() {
        return Ok(0);
    }

    let first_call = |day: i64, hour: u32| {
        (start_date + Duration::days(day)).and_hms_opt(hour, 0, 0).unwrap_or_default()
    };
    let destinations = |names: &[(&str, f64)]| {
        names
            .iter()
            .map(|(name, weight)| Destination { name: name.to_string(), weight: *weight })
            .collect::<Vec<_>>()
    };

    let schedules = vec![
        Schedule {
            id: 0,
            service_name: "ASIA-EUROPE-LOOP".to_string(),
            vehicle_type: ModeOfTransport::DeepSeaVessel,
            vehicle_arrives_at: first_call(2, 6),
            vehicle_arrives_every_k_days: 7,
            average_vehicle_capacity: 1200.0,
            average_moved_capacity: 600.0,
            destinations: destinations(&[("SINGAPORE", 0.4), ("SHANGHAI", 0.35), ("BUSAN", 0.25)]),
        },
        Schedule {
            id: 0,
            service_name: "BALTIC-FEEDER".to_string(),
            vehicle_type: ModeOfTransport::Feeder,
            vehicle_arrives_at: first_call(1, 14),
            vehicle_arrives_every_k_days: 4,
            average_vehicle_capacity: 500.0,
            average_moved_capacity: 200.0,
            destinations: destinations(&[("GDANSK", 0.5), ("AARHUS", 0.5)]),
        },
        Schedule {
            id: 0,
            service_name: "HINTERLAND-RAIL".to_string(),
            vehicle_type: ModeOfTransport::Train,
            vehicle_arrives_at: first_call(0, 9),
            vehicle_arrives_every_k_days: 2,
            average_vehicle_capacity: 90.0,
            average_moved_capacity: 80.0,
            destinations: vec![],
        },
        Schedule {
            id: 0,
            service_name: "RIVER-BARGE".to_string(),
            vehicle_type: ModeOfTransport::Barge,
            vehicle_arrives_at: first_call(0, 18),
            vehicle_arrives_every_k_days: 3,
            average_vehicle_capacity: 100.0,
            average_moved_capacity: 60.0,
            destinations: vec![],
        },
    ];

    for schedule in &schedules {
        repos.schedule_repo.insert(schedule)?;
    }
    Ok(schedules.len())
}
