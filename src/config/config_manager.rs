// ==========================================
// 集装箱码头流量合成系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::distribution::DistributionSet;
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::generation_config_trait::GenerationConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::capacity::default_exhaustion_threshold;
use crate::domain::properties::{GenerationProperties, DEFAULT_RANDOM_SEED, DEFAULT_TRANSPORTATION_BUFFER};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ConfigResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 写入一组生成参数
    pub fn save_properties(&self, properties: &GenerationProperties) -> ConfigResult<()> {
        properties.validate()?;
        self.set_config_value(config_keys::START_DATE, &properties.start_date.to_string())?;
        self.set_config_value(config_keys::END_DATE, &properties.end_date.to_string())?;
        self.set_config_value(
            config_keys::TRANSPORTATION_BUFFER,
            &properties.transportation_buffer.to_string(),
        )?;
        self.set_config_value(config_keys::RANDOM_SEED, &properties.random_seed.to_string())?;
        self.set_config_value(
            config_keys::EXHAUSTION_THRESHOLD,
            &properties.exhaustion_threshold.to_string(),
        )?;
        Ok(())
    }

    /// 写入概率分布（JSON）
    pub fn save_distributions(&self, distributions: &DistributionSet) -> ConfigResult<()> {
        distributions.validate()?;
        let raw = serde_json::to_string(distributions)?;
        self.set_config_value(config_keys::DISTRIBUTIONS, &raw)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 生成运行开始时写入日志，便于复现
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    fn parse_required<T: FromStr>(&self, key: &str) -> ConfigResult<T> {
        let raw = self
            .get_config_value(key)?
            .ok_or_else(|| ConfigError::MissingValue(key.to_string()))?;
        raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })
    }

    fn parse_or_default<T: FromStr>(&self, key: &str, default: T) -> ConfigResult<T> {
        match self.get_config_value(key)? {
            Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
            }),
            None => Ok(default),
        }
    }
}

// ==========================================
// GenerationConfigReader Trait 实现
// ==========================================
impl GenerationConfigReader for ConfigManager {
    fn load_properties(&self) -> ConfigResult<GenerationProperties> {
        let properties = GenerationProperties {
            start_date: self.parse_required::<NaiveDate>(config_keys::START_DATE)?,
            end_date: self.parse_required::<NaiveDate>(config_keys::END_DATE)?,
            transportation_buffer: self
                .parse_or_default(config_keys::TRANSPORTATION_BUFFER, DEFAULT_TRANSPORTATION_BUFFER)?,
            random_seed: self.parse_or_default(config_keys::RANDOM_SEED, DEFAULT_RANDOM_SEED)?,
            exhaustion_threshold: self
                .parse_or_default(config_keys::EXHAUSTION_THRESHOLD, default_exhaustion_threshold())?,
        };
        properties.validate()?;
        Ok(properties)
    }

    fn load_distributions(&self) -> ConfigResult<DistributionSet> {
        let distributions = match self.get_config_value(config_keys::DISTRIBUTIONS)? {
            Some(raw) => serde_json::from_str::<DistributionSet>(&raw)?,
            None => {
                tracing::debug!("未配置概率分布，使用默认分布");
                DistributionSet::default()
            }
        };
        distributions.validate()?;
        Ok(distributions)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 生成窗口
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";

    // 运力
    pub const TRANSPORTATION_BUFFER: &str = "transportation_buffer";
    pub const EXHAUSTION_THRESHOLD: &str = "exhaustion_threshold";

    // 抽样
    pub const RANDOM_SEED: &str = "random_seed";
    pub const DISTRIBUTIONS: &str = "distributions"; // DistributionSet (JSON)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_missing_horizon_is_reported() {
        let manager = setup_manager();
        let err = manager.load_properties().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue(key) if key == config_keys::START_DATE));
    }

    #[test]
    fn test_load_properties_with_defaults() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::START_DATE, "2026-03-01").unwrap();
        manager.set_config_value(config_keys::END_DATE, "2026-03-29").unwrap();

        let props = manager.load_properties().unwrap();
        assert_eq!(props.start_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(props.transportation_buffer, DEFAULT_TRANSPORTATION_BUFFER);
        assert_eq!(props.random_seed, DEFAULT_RANDOM_SEED);
        assert_eq!(props.exhaustion_threshold, 0.5);
    }

    #[test]
    fn test_invalid_buffer_rejected_on_load() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::START_DATE, "2026-03-01").unwrap();
        manager.set_config_value(config_keys::END_DATE, "2026-03-29").unwrap();
        manager.set_config_value(config_keys::TRANSPORTATION_BUFFER, "-1.5").unwrap();

        assert!(matches!(
            manager.load_properties(),
            Err(ConfigError::InvalidTransportationBuffer(_))
        ));
    }

    #[test]
    fn test_unparsable_value() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::START_DATE, "next monday").unwrap();
        assert!(matches!(
            manager.load_properties(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_saved_distributions_are_loaded() {
        let manager = setup_manager();
        assert_eq!(manager.load_distributions().unwrap(), DistributionSet::default());

        let mut custom = DistributionSet::default();
        custom.storage_requirement = [(crate::domain::StorageRequirement::Empty, 1.0)]
            .into_iter()
            .collect();
        manager.save_distributions(&custom).unwrap();

        assert_eq!(manager.load_distributions().unwrap(), custom);
        assert!(manager.get_config_snapshot().unwrap().contains("distributions"));
    }
}
