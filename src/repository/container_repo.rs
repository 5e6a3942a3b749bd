// ==========================================
// 集装箱码头流量合成系统 - 集装箱仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 集装箱 CRUD、按运输工具/箱型计数、带到离港时间的联表查询
// ==========================================

use crate::domain::container::Container;
use crate::domain::types::ContainerLength;
use crate::repository::error::RepositoryResult;
use crate::repository::{lock_conn, parse_column};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const CONTAINER_COLUMNS: &str = r#"
    c.id, c.length, c.weight_t, c.storage_requirement,
    c.delivered_by, c.delivered_by_vehicle, c.delivered_by_truck,
    c.picked_up_by, c.picked_up_by_initial, c.picked_up_by_vehicle, c.picked_up_by_truck,
    c.destination
"#;

// 到港时间取进港运输工具/集卡，离港时间取出港运输工具/集卡
const TIMED_FROM: &str = r#"
    COALESCE(dv.realized_arrival, dt.planned_arrival) AS arrival,
    COALESCE(pv.realized_arrival, pt.planned_arrival) AS departure
    FROM container c
    LEFT JOIN scheduled_vehicle dv ON dv.id = c.delivered_by_vehicle
    LEFT JOIN truck dt ON dt.id = c.delivered_by_truck
    LEFT JOIN scheduled_vehicle pv ON pv.id = c.picked_up_by_vehicle
    LEFT JOIN truck pt ON pt.id = c.picked_up_by_truck
"#;

// ==========================================
// ContainerWithTimes - 集装箱及其到/离港时间
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerWithTimes {
    pub container: Container,
    pub arrival: Option<NaiveDateTime>,   // 进港段未指定时为 None
    pub departure: Option<NaiveDateTime>, // 出港段未指定时为 None
}

// ==========================================
// ContainerSetFingerprint - 集装箱集合指纹
// ==========================================
// 按 (箱型, 进港方式, 出港方式) 分组的内容摘要，包含承运关联与到/离港时间
// 重量、堆存要求、目的港不参与
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerSetFingerprint {
    pub count: u64,
    pub groups: Vec<ContainerGroupDigest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerGroupDigest {
    pub length: String,
    pub delivered_by: String,
    pub picked_up_by: String,
    pub count: u64,
    pub id_sum: i64,
    pub vehicle_ref_sum: i64,
    pub truck_ref_sum: i64,
    pub arrival_sum: i64,   // 到港时间（Unix 秒）之和
    pub departure_sum: i64, // 离港时间（Unix 秒）之和
}

// ==========================================
// ContainerSelection - 联表查询的筛选条件
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerSelection {
    /// 全部集装箱
    All,
    /// 出港方式为定班运输工具但尚未指定实例
    AwaitingScheduledPickup,
    /// 由定班运输工具送达、集卡提走，尚未生成集卡
    TruckPickupWithoutTruck,
    /// 由集卡送达，尚未生成集卡
    TruckDeliveryWithoutTruck,
    /// 已指定出港运输工具但尚无目的港
    ScheduledPickupWithoutDestination,
}

impl ContainerSelection {
    fn where_clause(&self) -> &'static str {
        match self {
            ContainerSelection::All => "",
            ContainerSelection::AwaitingScheduledPickup => {
                "WHERE c.picked_up_by <> 'TRUCK' AND c.picked_up_by_vehicle IS NULL"
            }
            ContainerSelection::TruckPickupWithoutTruck => {
                "WHERE c.picked_up_by = 'TRUCK' AND c.picked_up_by_truck IS NULL \
                 AND c.delivered_by_vehicle IS NOT NULL"
            }
            ContainerSelection::TruckDeliveryWithoutTruck => {
                "WHERE c.delivered_by = 'TRUCK' AND c.delivered_by_truck IS NULL"
            }
            ContainerSelection::ScheduledPickupWithoutDestination => {
                "WHERE c.picked_up_by_vehicle IS NOT NULL AND c.destination IS NULL"
            }
        }
    }
}

// ==========================================
// ContainerRepository - 集装箱仓储
// ==========================================
pub struct ContainerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ContainerRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 插入单只集装箱（忽略 container.id），返回新 ID
    pub fn insert(&self, container: &Container) -> RepositoryResult<i64> {
        let conn = lock_conn(&self.conn)?;
        insert_row(&conn, container)?;
        Ok(conn.last_insert_rowid())
    }

    /// 批量插入集装箱
    ///
    /// # 返回
    /// - Ok(Vec<i64>): 按输入顺序的新 ID
    ///
    /// # 说明
    /// - 使用事务确保原子性
    pub fn insert_batch(&self, containers: &[Container]) -> RepositoryResult<Vec<i64>> {
        let conn = lock_conn(&self.conn)?;
        let tx = conn.unchecked_transaction()?;

        let mut ids = Vec::with_capacity(containers.len());
        for container in containers {
            insert_row(&tx, container)?;
            ids.push(tx.last_insert_rowid());
        }

        tx.commit()?;
        Ok(ids)
    }

    /// 指定出港运输工具
    pub fn assign_pickup_vehicle(&self, container_id: i64, vehicle_id: i64) -> RepositoryResult<()> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "UPDATE container SET picked_up_by_vehicle = ?1 WHERE id = ?2",
            params![vehicle_id, container_id],
        )?;
        Ok(())
    }

    /// 出港段改派集卡（保留 picked_up_by_initial）
    pub fn redirect_pickup_to_truck(&self, container_id: i64) -> RepositoryResult<()> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "UPDATE container SET picked_up_by = 'TRUCK', picked_up_by_vehicle = NULL WHERE id = ?1",
            params![container_id],
        )?;
        Ok(())
    }

    /// 指定提箱集卡
    pub fn assign_pickup_truck(&self, container_id: i64, truck_id: i64) -> RepositoryResult<()> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "UPDATE container SET picked_up_by_truck = ?1 WHERE id = ?2",
            params![truck_id, container_id],
        )?;
        Ok(())
    }

    /// 指定送箱集卡
    pub fn assign_delivery_truck(&self, container_id: i64, truck_id: i64) -> RepositoryResult<()> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "UPDATE container SET delivered_by_truck = ?1 WHERE id = ?2",
            params![truck_id, container_id],
        )?;
        Ok(())
    }

    /// 设置目的港
    pub fn set_destination(&self, container_id: i64, destination: &str) -> RepositoryResult<()> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "UPDATE container SET destination = ?1 WHERE id = ?2",
            params![destination, container_id],
        )?;
        Ok(())
    }

    /// 删除全部集装箱
    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = lock_conn(&self.conn)?;
        Ok(conn.execute("DELETE FROM container", [])?)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Container>> {
        let conn = lock_conn(&self.conn)?;
        let sql = format!("SELECT {} FROM container c WHERE c.id = ?1", CONTAINER_COLUMNS);
        let container = conn.query_row(&sql, params![id], map_container).optional()?;
        Ok(container)
    }

    /// 查询全部集装箱（按 ID 排序）
    pub fn find_all(&self) -> RepositoryResult<Vec<Container>> {
        let conn = lock_conn(&self.conn)?;
        let sql = format!("SELECT {} FROM container c ORDER BY c.id", CONTAINER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let containers = stmt
            .query_map([], map_container)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(containers)
    }

    /// 按筛选条件查询集装箱及其到/离港时间（按 ID 排序）
    pub fn find_with_times(&self, selection: ContainerSelection) -> RepositoryResult<Vec<ContainerWithTimes>> {
        let conn = lock_conn(&self.conn)?;
        let sql = format!(
            "SELECT {}, {} {} ORDER BY c.id",
            CONTAINER_COLUMNS,
            TIMED_FROM,
            selection.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ContainerWithTimes {
                    container: map_container(row)?,
                    arrival: row.get(12)?,
                    departure: row.get(13)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 某运输工具进港段已装载的指定箱型数量
    pub fn count_delivered_by_vehicle(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM container WHERE delivered_by_vehicle = ?1 AND length = ?2",
            params![vehicle_id, length.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// 某运输工具出港段已装载的指定箱型数量
    pub fn count_picked_up_by_vehicle(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM container WHERE picked_up_by_vehicle = ?1 AND length = ?2",
            params![vehicle_id, length.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_all(&self) -> RepositoryResult<u64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM container", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// 当前集装箱集合指纹
    pub fn fingerprint(&self) -> RepositoryResult<ContainerSetFingerprint> {
        let conn = lock_conn(&self.conn)?;
        let sql = format!(
            r#"
            SELECT
                length, delivered_by, picked_up_by, COUNT(*), SUM(id),
                SUM(COALESCE(delivered_by_vehicle, 0) + COALESCE(picked_up_by_vehicle, 0)),
                SUM(COALESCE(delivered_by_truck, 0) + COALESCE(picked_up_by_truck, 0)),
                COALESCE(SUM(CAST(strftime('%s', arrival) AS INTEGER)), 0),
                COALESCE(SUM(CAST(strftime('%s', departure) AS INTEGER)), 0)
            FROM (
                SELECT
                    c.id, c.length, c.delivered_by, c.picked_up_by,
                    c.delivered_by_vehicle, c.picked_up_by_vehicle,
                    c.delivered_by_truck, c.picked_up_by_truck,
                    {}
            )
            GROUP BY length, delivered_by, picked_up_by
            ORDER BY length, delivered_by, picked_up_by
            "#,
            TIMED_FROM
        );
        let mut stmt = conn.prepare(&sql)?;
        let groups = stmt
            .query_map([], |row| {
                Ok(ContainerGroupDigest {
                    length: row.get(0)?,
                    delivered_by: row.get(1)?,
                    picked_up_by: row.get(2)?,
                    count: row.get::<_, i64>(3)? as u64,
                    id_sum: row.get(4)?,
                    vehicle_ref_sum: row.get(5)?,
                    truck_ref_sum: row.get(6)?,
                    arrival_sum: row.get(7)?,
                    departure_sum: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ContainerSetFingerprint {
            count: groups.iter().map(|g| g.count).sum(),
            groups,
        })
    }

    /// 出港段被改派集卡的集装箱数量
    pub fn count_redirected_to_truck(&self) -> RepositoryResult<u64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM container WHERE picked_up_by <> picked_up_by_initial",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn insert_row(conn: &Connection, container: &Container) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO container (
            length, weight_t, storage_requirement,
            delivered_by, delivered_by_vehicle, delivered_by_truck,
            picked_up_by, picked_up_by_initial, picked_up_by_vehicle, picked_up_by_truck,
            destination
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            container.length.as_str(),
            container.weight_t,
            container.storage_requirement.as_str(),
            container.delivered_by.as_str(),
            container.delivered_by_vehicle,
            container.delivered_by_truck,
            container.picked_up_by.as_str(),
            container.picked_up_by_initial.as_str(),
            container.picked_up_by_vehicle,
            container.picked_up_by_truck,
            container.destination,
        ],
    )
}

fn map_container(row: &Row<'_>) -> rusqlite::Result<Container> {
    Ok(Container {
        id: row.get(0)?,
        length: parse_column(1, row.get(1)?)?,
        weight_t: row.get(2)?,
        storage_requirement: parse_column(3, row.get(3)?)?,
        delivered_by: parse_column(4, row.get(4)?)?,
        delivered_by_vehicle: row.get(5)?,
        delivered_by_truck: row.get(6)?,
        picked_up_by: parse_column(7, row.get(7)?)?,
        picked_up_by_initial: parse_column(8, row.get(8)?)?,
        picked_up_by_vehicle: row.get(9)?,
        picked_up_by_truck: row.get(10)?,
        destination: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, open_in_memory_connection};
    use crate::domain::types::{ModeOfTransport, StorageRequirement};
    use crate::domain::vehicle::{Schedule, ScheduledVehicle};
    use crate::repository::{ScheduleRepository, ScheduledVehicleRepository};
    use chrono::NaiveDate;

    fn setup() -> (Arc<Mutex<Connection>>, i64) {
        let conn = open_in_memory_connection().unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let arrival = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let schedule_id = ScheduleRepository::from_connection(conn.clone())
            .insert(&Schedule {
                id: 0,
                service_name: "BALTIC-1".to_string(),
                vehicle_type: ModeOfTransport::Feeder,
                vehicle_arrives_at: arrival,
                vehicle_arrives_every_k_days: 7,
                average_vehicle_capacity: 120.0,
                average_moved_capacity: 100.0,
                destinations: vec![],
            })
            .unwrap();
        let vehicle_id = ScheduledVehicleRepository::from_connection(conn.clone())
            .insert(&ScheduledVehicle {
                id: 0,
                vehicle_name: "BALTIC-1-001".to_string(),
                schedule_id,
                vehicle_type: ModeOfTransport::Feeder,
                capacity_in_teu: 120.0,
                moved_capacity: 100.0,
                realized_arrival: arrival,
            })
            .unwrap();
        (conn, vehicle_id)
    }

    fn inbound(vehicle_id: i64, length: ContainerLength) -> Container {
        Container {
            id: 0,
            length,
            weight_t: 12.0,
            storage_requirement: StorageRequirement::Standard,
            delivered_by: ModeOfTransport::Feeder,
            delivered_by_vehicle: Some(vehicle_id),
            delivered_by_truck: None,
            picked_up_by: ModeOfTransport::DeepSeaVessel,
            picked_up_by_initial: ModeOfTransport::DeepSeaVessel,
            picked_up_by_vehicle: None,
            picked_up_by_truck: None,
            destination: None,
        }
    }

    #[test]
    fn test_count_by_vehicle_and_length() {
        let (conn, vehicle_id) = setup();
        let repo = ContainerRepository::from_connection(conn);

        repo.insert_batch(&[
            inbound(vehicle_id, ContainerLength::FortyFeet),
            inbound(vehicle_id, ContainerLength::FortyFeet),
            inbound(vehicle_id, ContainerLength::TwentyFeet),
        ])
        .unwrap();

        assert_eq!(repo.count_delivered_by_vehicle(vehicle_id, ContainerLength::FortyFeet).unwrap(), 2);
        assert_eq!(repo.count_delivered_by_vehicle(vehicle_id, ContainerLength::TwentyFeet).unwrap(), 1);
        assert_eq!(repo.count_picked_up_by_vehicle(vehicle_id, ContainerLength::FortyFeet).unwrap(), 0);
        assert_eq!(repo.count_all().unwrap(), 3);
    }

    #[test]
    fn test_redirect_keeps_initial_mode() {
        let (conn, vehicle_id) = setup();
        let repo = ContainerRepository::from_connection(conn);
        let id = repo.insert(&inbound(vehicle_id, ContainerLength::TwentyFeet)).unwrap();

        let awaiting = repo.find_with_times(ContainerSelection::AwaitingScheduledPickup).unwrap();
        assert_eq!(awaiting.len(), 1);
        assert!(awaiting[0].arrival.is_some());
        assert!(awaiting[0].departure.is_none());

        repo.redirect_pickup_to_truck(id).unwrap();
        let container = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(container.picked_up_by, ModeOfTransport::Truck);
        assert_eq!(container.picked_up_by_initial, ModeOfTransport::DeepSeaVessel);
        assert_eq!(repo.count_redirected_to_truck().unwrap(), 1);
        assert!(repo.find_with_times(ContainerSelection::AwaitingScheduledPickup).unwrap().is_empty());
        assert_eq!(repo.find_with_times(ContainerSelection::TruckPickupWithoutTruck).unwrap().len(), 1);
    }

    #[test]
    fn test_vehicle_delete_blocked_by_container_reference() {
        let (conn, vehicle_id) = setup();
        let repo = ContainerRepository::from_connection(conn.clone());
        repo.insert(&inbound(vehicle_id, ContainerLength::TwentyFeet)).unwrap();

        let vehicles = ScheduledVehicleRepository::from_connection(conn);
        assert!(vehicles.delete_all().is_err());

        repo.delete_all().unwrap();
        assert_eq!(vehicles.delete_all().unwrap(), 1);
        assert_eq!(vehicles.count_particulars().unwrap(), 0);
    }

    #[test]
    fn test_fingerprint_tracks_content_not_only_ids() {
        let (conn, vehicle_id) = setup();
        let repo = ContainerRepository::from_connection(conn);
        assert_eq!(repo.fingerprint().unwrap().count, 0);
        assert!(repo.fingerprint().unwrap().groups.is_empty());

        repo.insert_batch(&[
            inbound(vehicle_id, ContainerLength::TwentyFeet),
            inbound(vehicle_id, ContainerLength::TwentyFeet),
        ])
        .unwrap();
        let twenty = repo.fingerprint().unwrap();
        assert_eq!(twenty.count, 2);
        assert_eq!(twenty.groups.len(), 1);
        assert!(twenty.groups[0].arrival_sum > 0);
        assert_eq!(twenty.groups[0].departure_sum, 0);

        // 清空后以相同 ID 写入不同箱型
        repo.delete_all().unwrap();
        repo.insert_batch(&[
            inbound(vehicle_id, ContainerLength::FortyFeet),
            inbound(vehicle_id, ContainerLength::FortyFeet),
        ])
        .unwrap();
        let forty = repo.fingerprint().unwrap();
        assert_eq!(forty.count, 2);
        assert_ne!(forty, twenty);

        // 出港方式变化同样反映在指纹中
        repo.redirect_pickup_to_truck(1).unwrap();
        assert_ne!(repo.fingerprint().unwrap(), forty);
    }
}
