// ==========================================
// 集装箱码头流量合成系统 - 生成参数
// ==========================================
// 职责: 一次生成运行的全局参数及其前置校验
// 红线: 参数非法时在任何分配开始前拒绝，不产生部分数据
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::capacity::default_exhaustion_threshold;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TRANSPORTATION_BUFFER: f64 = 0.2;
pub const DEFAULT_RANDOM_SEED: u64 = 42;

// ==========================================
// GenerationProperties - 生成参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationProperties {
    pub start_date: NaiveDate,       // 生成窗口起（含）
    pub end_date: NaiveDate,         // 生成窗口止（不含）
    pub transportation_buffer: f64,  // 出港运力缓冲，必须 > -1
    pub random_seed: u64,            // 抽样随机种子
    pub exhaustion_threshold: f64,   // 运力耗尽阈值（TEU）
}

impl GenerationProperties {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, transportation_buffer: f64) -> Self {
        Self {
            start_date,
            end_date,
            transportation_buffer,
            random_seed: DEFAULT_RANDOM_SEED,
            exhaustion_threshold: default_exhaustion_threshold(),
        }
    }

    pub fn with_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// 校验参数
    ///
    /// # 返回
    /// - Ok(()): 参数合法
    /// - Err(ConfigError): 缓冲 <= -1、窗口为空或阈值非法
    pub fn validate(&self) -> ConfigResult<()> {
        validate_transportation_buffer(self.transportation_buffer)?;

        if self.start_date >= self.end_date {
            return Err(ConfigError::InvalidHorizon {
                start: self.start_date,
                end: self.end_date,
            });
        }

        if !self.exhaustion_threshold.is_finite() || self.exhaustion_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "exhaustion_threshold".to_string(),
                value: self.exhaustion_threshold.to_string(),
            });
        }

        Ok(())
    }
}

/// 出港运力缓冲必须大于 -1
pub fn validate_transportation_buffer(transportation_buffer: f64) -> ConfigResult<()> {
    if !transportation_buffer.is_finite() || transportation_buffer <= -1.0 {
        return Err(ConfigError::InvalidTransportationBuffer(transportation_buffer));
    }
    Ok(())
}
