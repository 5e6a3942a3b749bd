// ==========================================
// 集装箱码头流量合成系统 - 生成配置读取 Trait
// ==========================================
// 职责: 定义编排器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含分配逻辑
// ==========================================

use crate::config::distribution::DistributionSet;
use crate::config::error::ConfigResult;
use crate::domain::properties::GenerationProperties;

// ==========================================
// GenerationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）、StaticConfig（内存）
pub trait GenerationConfigReader: Send + Sync {
    /// 加载并校验生成参数
    ///
    /// # 返回
    /// - Ok(GenerationProperties): 已通过校验的参数
    /// - Err(ConfigError): 缺失或非法
    fn load_properties(&self) -> ConfigResult<GenerationProperties>;

    /// 加载并校验概率分布
    ///
    /// # 默认值
    /// - 未配置时使用 `DistributionSet::default()`
    fn load_distributions(&self) -> ConfigResult<DistributionSet>;
}

// ==========================================
// StaticConfig - 内存配置
// ==========================================
// 用途: 以代码方式驱动生成（测试、嵌入调用）
#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub properties: GenerationProperties,
    pub distributions: DistributionSet,
}

impl StaticConfig {
    pub fn new(properties: GenerationProperties) -> Self {
        Self {
            properties,
            distributions: DistributionSet::default(),
        }
    }

    pub fn with_distributions(mut self, distributions: DistributionSet) -> Self {
        self.distributions = distributions;
        self
    }
}

impl GenerationConfigReader for StaticConfig {
    fn load_properties(&self) -> ConfigResult<GenerationProperties> {
        self.properties.validate()?;
        Ok(self.properties.clone())
    }

    fn load_distributions(&self) -> ConfigResult<DistributionSet> {
        self.distributions.validate()?;
        Ok(self.distributions.clone())
    }
}
