// ==========================================
// 集装箱码头流量合成系统 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 配置错误一律在分配开始前抛出，禁止带病运行
// ==========================================

use chrono::NaiveDate;
use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 参数校验错误 =====
    #[error("出港运力缓冲非法: transportation_buffer={0}，必须大于 -1")]
    InvalidTransportationBuffer(f64),

    #[error("生成窗口非法: start_date={start} 必须早于 end_date={end}")]
    InvalidHorizon { start: NaiveDate, end: NaiveDate },

    #[error("配置值非法 (key={key}): {value}")]
    InvalidValue { key: String, value: String },

    #[error("缺少必填配置: {0}")]
    MissingValue(String),

    #[error("概率分布非法: {0}")]
    InvalidDistribution(String),

    // ===== 存储错误 =====
    #[error("配置读取失败: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("配置反序列化失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("配置连接锁获取失败: {0}")]
    LockError(String),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
