// ==========================================
// 集装箱码头流量合成系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键级联删除依赖 foreign_keys）
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存库并应用统一配置
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 外键说明：
/// - container → scheduled_vehicle / truck 不级联，清理时必须先删集装箱
/// - scheduled_vehicle_particulars → scheduled_vehicle 级联删除
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS schedule (
            id INTEGER PRIMARY KEY,
            service_name TEXT NOT NULL UNIQUE,
            vehicle_type TEXT NOT NULL,
            vehicle_arrives_at TEXT NOT NULL,
            vehicle_arrives_every_k_days INTEGER NOT NULL,
            average_vehicle_capacity REAL NOT NULL,
            average_moved_capacity REAL NOT NULL,
            destinations_json TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS scheduled_vehicle (
            id INTEGER PRIMARY KEY,
            vehicle_name TEXT NOT NULL,
            schedule_id INTEGER NOT NULL REFERENCES schedule(id) ON DELETE CASCADE,
            vehicle_type TEXT NOT NULL,
            capacity_in_teu REAL NOT NULL,
            moved_capacity REAL NOT NULL,
            realized_arrival TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scheduled_vehicle_particulars (
            vehicle_id INTEGER PRIMARY KEY REFERENCES scheduled_vehicle(id) ON DELETE CASCADE,
            vehicle_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS truck (
            id INTEGER PRIMARY KEY,
            delivers_container INTEGER NOT NULL,
            picks_up_container INTEGER NOT NULL,
            planned_arrival TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS container (
            id INTEGER PRIMARY KEY,
            length TEXT NOT NULL,
            weight_t REAL NOT NULL,
            storage_requirement TEXT NOT NULL,
            delivered_by TEXT NOT NULL,
            delivered_by_vehicle INTEGER REFERENCES scheduled_vehicle(id),
            delivered_by_truck INTEGER REFERENCES truck(id),
            picked_up_by TEXT NOT NULL,
            picked_up_by_initial TEXT NOT NULL,
            picked_up_by_vehicle INTEGER REFERENCES scheduled_vehicle(id),
            picked_up_by_truck INTEGER REFERENCES truck(id),
            destination TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_container_delivered_by_vehicle
            ON container(delivered_by_vehicle, length);
        CREATE INDEX IF NOT EXISTS idx_container_picked_up_by_vehicle
            ON container(picked_up_by_vehicle, length);
        CREATE INDEX IF NOT EXISTS idx_scheduled_vehicle_type_arrival
            ON scheduled_vehicle(vehicle_type, realized_arrival);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
