// ==========================================
// 集装箱码头流量合成系统 - 生成流水线错误类型
// ==========================================

use crate::config::ConfigError;
use crate::engine::ledger::LedgerError;
use crate::engine::stage::GenerationStage;
use crate::repository::RepositoryError;
use crate::storage::StorageError;
use thiserror::Error;

/// 生成流水线错误
#[derive(Error, Debug)]
pub enum GenerationError {
    // ===== 配置错误（分配开始前拒绝）=====
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    // ===== 运力不变量违反（致命）=====
    #[error("运力账本错误: {0}")]
    Ledger(#[from] LedgerError),

    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("存储后端错误: {0}")]
    Storage(#[from] StorageError),

    #[error("非法阶段转换: {from} -> {to}")]
    InvalidStageTransition {
        from: GenerationStage,
        to: GenerationStage,
    },
}

pub type GenerationResult<T> = Result<T, GenerationError>;
