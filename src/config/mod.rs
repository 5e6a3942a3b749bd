// ==========================================
// 集装箱码头流量合成系统 - 配置层
// ==========================================
// 职责: 生成参数与概率分布的加载、校验
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod distribution;
pub mod error;
pub mod generation_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use distribution::{DistributionSet, DwellTime, WeightRange};
pub use error::{ConfigError, ConfigResult};
pub use generation_config_trait::{GenerationConfigReader, StaticConfig};
