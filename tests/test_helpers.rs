// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、测试船期、生成参数
// ==========================================
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use container_flow_gen::config::StaticConfig;
use container_flow_gen::db::{init_schema, open_sqlite_connection};
use container_flow_gen::domain::capacity::units_of;
use container_flow_gen::domain::properties::GenerationProperties;
use container_flow_gen::domain::types::ModeOfTransport;
use container_flow_gen::domain::vehicle::{Destination, Schedule};
use container_flow_gen::engine::FlowRepositories;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = open_sqlite_connection(db_path).unwrap();
    Arc::new(Mutex::new(conn))
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

pub fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 22).unwrap()
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
}

/// 三周窗口、缓冲 0.2、固定种子
pub fn test_config(random_seed: u64) -> Arc<StaticConfig> {
    let properties = GenerationProperties::new(start_date(), end_date(), 0.2).with_seed(random_seed);
    Arc::new(StaticConfig::new(properties))
}

/// 覆盖全部定班运输方式的测试船期
pub fn test_schedules() -> Vec<Schedule> {
    vec![
        Schedule {
            id: 0,
            service_name: "DEEP-SEA-LOOP".to_string(),
            vehicle_type: ModeOfTransport::DeepSeaVessel,
            vehicle_arrives_at: at(3, 6),
            vehicle_arrives_every_k_days: 7,
            average_vehicle_capacity: 300.0,
            average_moved_capacity: 150.0,
            destinations: vec![
                Destination { name: "SINGAPORE".to_string(), weight: 0.6 },
                Destination { name: "BUSAN".to_string(), weight: 0.4 },
            ],
        },
        Schedule {
            id: 0,
            service_name: "BALTIC-FEEDER".to_string(),
            vehicle_type: ModeOfTransport::Feeder,
            vehicle_arrives_at: at(2, 14),
            vehicle_arrives_every_k_days: 5,
            average_vehicle_capacity: 120.0,
            average_moved_capacity: 80.0,
            destinations: vec![],
        },
        Schedule {
            id: 0,
            service_name: "HINTERLAND-RAIL".to_string(),
            vehicle_type: ModeOfTransport::Train,
            vehicle_arrives_at: at(1, 9),
            vehicle_arrives_every_k_days: 3,
            average_vehicle_capacity: 40.0,
            average_moved_capacity: 36.0,
            destinations: vec![],
        },
        Schedule {
            id: 0,
            service_name: "RIVER-BARGE".to_string(),
            vehicle_type: ModeOfTransport::Barge,
            vehicle_arrives_at: at(1, 18),
            vehicle_arrives_every_k_days: 4,
            average_vehicle_capacity: 30.0,
            average_moved_capacity: 20.0,
            destinations: vec![],
        },
    ]
}

/// 写入测试船期
pub fn seed_schedules(conn: &Arc<Mutex<Connection>>) -> FlowRepositories {
    let repos = FlowRepositories::from_connection(conn.clone());
    for schedule in test_schedules() {
        repos.schedule_repo.insert(&schedule).unwrap();
    }
    repos
}

/// 校验每个运输工具两段均未超载
pub fn assert_no_vehicle_overbooked(repos: &FlowRepositories, transportation_buffer: f64) {
    let containers = repos.container_repo.find_all().unwrap();
    for vehicle in repos.vehicle_repo.find_all().unwrap() {
        let inbound: f64 = containers
            .iter()
            .filter(|c| c.delivered_by_vehicle == Some(vehicle.id))
            .map(|c| units_of(c.length))
            .sum();
        let outbound: f64 = containers
            .iter()
            .filter(|c| c.picked_up_by_vehicle == Some(vehicle.id))
            .map(|c| units_of(c.length))
            .sum();

        assert!(
            inbound <= vehicle.moved_capacity + 1e-9,
            "{} inbound {} > moved {}",
            vehicle.vehicle_name,
            inbound,
            vehicle.moved_capacity
        );
        let usable = vehicle.outbound_usable_capacity(transportation_buffer);
        assert!(
            outbound <= usable + 1e-9,
            "{} outbound {} > usable {}",
            vehicle.vehicle_name,
            outbound,
            usable
        );
    }
}
