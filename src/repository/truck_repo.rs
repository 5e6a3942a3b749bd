// ==========================================
// 集装箱码头流量合成系统 - 集卡仓储
// ==========================================

use crate::domain::vehicle::Truck;
use crate::repository::error::RepositoryResult;
use crate::repository::lock_conn;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct TruckRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TruckRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 插入集卡，返回新 ID
    pub fn insert(&self, truck: &Truck) -> RepositoryResult<i64> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO truck (delivers_container, picks_up_container, planned_arrival) VALUES (?1, ?2, ?3)",
            params![truck.delivers_container, truck.picks_up_container, truck.planned_arrival],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Truck>> {
        let conn = lock_conn(&self.conn)?;
        let truck = conn
            .query_row(
                "SELECT id, delivers_container, picks_up_container, planned_arrival FROM truck WHERE id = ?1",
                params![id],
                map_truck,
            )
            .optional()?;
        Ok(truck)
    }

    pub fn find_all(&self) -> RepositoryResult<Vec<Truck>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, delivers_container, picks_up_container, planned_arrival FROM truck ORDER BY id",
        )?;
        let trucks = stmt
            .query_map([], map_truck)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(trucks)
    }

    pub fn count_all(&self) -> RepositoryResult<u64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM truck", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// 删除全部集卡（前置条件同运输工具：集装箱已删除）
    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = lock_conn(&self.conn)?;
        Ok(conn.execute("DELETE FROM truck", [])?)
    }
}

fn map_truck(row: &Row<'_>) -> rusqlite::Result<Truck> {
    Ok(Truck {
        id: row.get(0)?,
        delivers_container: row.get(1)?,
        picks_up_container: row.get(2)?,
        planned_arrival: row.get(3)?,
    })
}
