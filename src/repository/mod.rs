// ==========================================
// 集装箱码头流量合成系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod container_repo;
pub mod error;
pub mod schedule_repo;
pub mod truck_repo;
pub mod vehicle_repo;

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::types::Type;
use rusqlite::Connection;

// 重导出核心仓储
pub use container_repo::{
    ContainerGroupDigest, ContainerRepository, ContainerSelection, ContainerSetFingerprint,
    ContainerWithTimes,
};
pub use error::{RepositoryError, RepositoryResult};
pub use schedule_repo::ScheduleRepository;
pub use truck_repo::TruckRepository;
pub use vehicle_repo::{ScheduledVehicleRepository, VehicleSetFingerprint};

/// 获取共享连接（锁中毒转为仓储错误）
pub(crate) fn lock_conn(conn: &Arc<Mutex<Connection>>) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

/// 将文本列解析为领域枚举
pub(crate) fn parse_column<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}
