// ==========================================
// 集装箱码头流量合成系统 - 定班运输工具仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 每个实例附带一条运输方式专属行（particulars），随实例级联删除
// ==========================================

use crate::domain::types::ModeOfTransport;
use crate::domain::vehicle::ScheduledVehicle;
use crate::repository::error::RepositoryResult;
use crate::repository::{lock_conn, parse_column};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_VEHICLE: &str = r#"
    SELECT
        id, vehicle_name, schedule_id, vehicle_type,
        capacity_in_teu, moved_capacity, realized_arrival
    FROM scheduled_vehicle
"#;

// ==========================================
// VehicleSetFingerprint - 实例集合指纹
// ==========================================
// 运力合计以 f64 位模式保存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleSetFingerprint {
    pub count: u64,
    pub id_sum: i64,
    pub capacity_bits: u64,
    pub moved_capacity_bits: u64,
    pub arrival_sum: i64,
}

// ==========================================
// ScheduledVehicleRepository - 定班运输工具仓储
// ==========================================
pub struct ScheduledVehicleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduledVehicleRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 插入运输工具实例及其专属行
    ///
    /// # 返回
    /// - Ok(i64): 新实例 ID
    pub fn insert(&self, vehicle: &ScheduledVehicle) -> RepositoryResult<i64> {
        let conn = lock_conn(&self.conn)?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO scheduled_vehicle (
                vehicle_name, schedule_id, vehicle_type,
                capacity_in_teu, moved_capacity, realized_arrival
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                vehicle.vehicle_name,
                vehicle.schedule_id,
                vehicle.vehicle_type.as_str(),
                vehicle.capacity_in_teu,
                vehicle.moved_capacity,
                vehicle.realized_arrival,
            ],
        )?;
        let vehicle_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO scheduled_vehicle_particulars (vehicle_id, vehicle_type) VALUES (?1, ?2)",
            params![vehicle_id, vehicle.vehicle_type.as_str()],
        )?;

        tx.commit()?;
        Ok(vehicle_id)
    }

    /// 按 ID 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ScheduledVehicle>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_VEHICLE))?;
        let vehicle = stmt.query_row(params![id], map_vehicle).optional()?;
        Ok(vehicle)
    }

    /// 查询全部实例（按到港时间、ID 排序）
    pub fn find_all(&self) -> RepositoryResult<Vec<ScheduledVehicle>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY realized_arrival, id", SELECT_VEHICLE))?;
        let vehicles = stmt
            .query_map([], map_vehicle)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    /// 查询指定运输方式在 [from, to] 内到港的实例
    pub fn find_by_type_arriving_between(
        &self,
        vehicle_type: ModeOfTransport,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<ScheduledVehicle>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE vehicle_type = ?1 AND realized_arrival >= ?2 AND realized_arrival <= ?3 \
             ORDER BY realized_arrival, id",
            SELECT_VEHICLE
        ))?;
        let vehicles = stmt
            .query_map(params![vehicle_type.as_str(), from, to], map_vehicle)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    /// 实例总数
    pub fn count_all(&self) -> RepositoryResult<u64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM scheduled_vehicle", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// 当前实例集合指纹
    pub fn fingerprint(&self) -> RepositoryResult<VehicleSetFingerprint> {
        let conn = lock_conn(&self.conn)?;
        let fingerprint = conn.query_row(
            r#"
            SELECT
                COUNT(*), COALESCE(SUM(id), 0),
                COALESCE(SUM(capacity_in_teu), 0.0), COALESCE(SUM(moved_capacity), 0.0),
                COALESCE(SUM(CAST(strftime('%s', realized_arrival) AS INTEGER)), 0)
            FROM scheduled_vehicle
            "#,
            [],
            |row| {
                Ok(VehicleSetFingerprint {
                    count: row.get::<_, i64>(0)? as u64,
                    id_sum: row.get(1)?,
                    capacity_bits: row.get::<_, f64>(2)?.to_bits(),
                    moved_capacity_bits: row.get::<_, f64>(3)?.to_bits(),
                    arrival_sum: row.get(4)?,
                })
            },
        )?;
        Ok(fingerprint)
    }

    /// 专属行总数（用于验证级联删除）
    pub fn count_particulars(&self) -> RepositoryResult<u64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM scheduled_vehicle_particulars",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// 删除全部实例（专属行级联删除）
    ///
    /// 前置条件: 引用实例的集装箱已删除，否则外键约束失败
    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = lock_conn(&self.conn)?;
        let deleted = conn.execute("DELETE FROM scheduled_vehicle", [])?;
        Ok(deleted)
    }
}

fn map_vehicle(row: &Row<'_>) -> rusqlite::Result<ScheduledVehicle> {
    Ok(ScheduledVehicle {
        id: row.get(0)?,
        vehicle_name: row.get(1)?,
        schedule_id: row.get(2)?,
        vehicle_type: parse_column(3, row.get(3)?)?,
        capacity_in_teu: row.get(4)?,
        moved_capacity: row.get(5)?,
        realized_arrival: row.get(6)?,
    })
}
