// ==========================================
// 集装箱码头流量合成系统 - 船期数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::types::ModeOfTransport;
use crate::domain::vehicle::{Destination, Schedule};
use crate::repository::error::RepositoryResult;
use crate::repository::{lock_conn, parse_column};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_SCHEDULE: &str = r#"
    SELECT
        id, service_name, vehicle_type, vehicle_arrives_at,
        vehicle_arrives_every_k_days, average_vehicle_capacity,
        average_moved_capacity, destinations_json
    FROM schedule
"#;

// ==========================================
// ScheduleRepository - 船期仓储
// ==========================================

/// 船期仓储
/// 职责: 管理 schedule 表的 CRUD 操作
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 插入船期
    ///
    /// # 返回
    /// - Ok(i64): 新船期 ID
    /// - Err: 数据库错误（服务名重复时为唯一约束违反）
    pub fn insert(&self, schedule: &Schedule) -> RepositoryResult<i64> {
        let conn = lock_conn(&self.conn)?;
        let destinations_json = serde_json::to_string(&schedule.destinations)
            .map_err(anyhow::Error::from)?;

        conn.execute(
            r#"
            INSERT INTO schedule (
                service_name, vehicle_type, vehicle_arrives_at,
                vehicle_arrives_every_k_days, average_vehicle_capacity,
                average_moved_capacity, destinations_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                schedule.service_name,
                schedule.vehicle_type.as_str(),
                schedule.vehicle_arrives_at,
                schedule.vehicle_arrives_every_k_days,
                schedule.average_vehicle_capacity,
                schedule.average_moved_capacity,
                destinations_json,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 按 ID 查询船期
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Schedule>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_SCHEDULE))?;
        let schedule = stmt.query_row(params![id], map_schedule).optional()?;
        Ok(schedule)
    }

    /// 查询全部船期（按 ID 排序）
    pub fn find_all(&self) -> RepositoryResult<Vec<Schedule>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_SCHEDULE))?;
        let schedules = stmt
            .query_map([], map_schedule)?
            .collect::<rusqlite::Result<Vec<Schedule>>>()?;
        Ok(schedules)
    }

    /// 按运输方式查询船期
    pub fn find_by_vehicle_type(&self, vehicle_type: ModeOfTransport) -> RepositoryResult<Vec<Schedule>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE vehicle_type = ?1 ORDER BY id",
            SELECT_SCHEDULE
        ))?;
        let schedules = stmt
            .query_map(params![vehicle_type.as_str()], map_schedule)?
            .collect::<rusqlite::Result<Vec<Schedule>>>()?;
        Ok(schedules)
    }
}

fn map_schedule(row: &Row<'_>) -> rusqlite::Result<Schedule> {
    let destinations_json: String = row.get(7)?;
    let destinations: Vec<Destination> = serde_json::from_str(&destinations_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(Schedule {
        id: row.get(0)?,
        service_name: row.get(1)?,
        vehicle_type: parse_column(2, row.get(2)?)?,
        vehicle_arrives_at: row.get(3)?,
        vehicle_arrives_every_k_days: row.get(4)?,
        average_vehicle_capacity: row.get(5)?,
        average_moved_capacity: row.get(6)?,
        destinations,
    })
}
