// ==========================================
// 集装箱码头流量合成系统 - 存储后端
// ==========================================
// 职责: 决定一次生成运行在哪个连接上执行
// - Direct: 直接在配置的连接上读写
// - Snapshot: 源库 → 内存库（online backup），运行结束后内存库 → 源库
// 红线: 两种模式的最终可观测状态必须一致
// ==========================================

use crate::db::open_in_memory_connection;
use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// 每步拷贝页数
const BACKUP_PAGES_PER_STEP: i32 = 256;

// ==========================================
// StorageError - 存储后端错误
// ==========================================
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("存储后端未开始运行")]
    NotStarted,
}

pub type StorageResult<T> = Result<T, StorageError>;

// ==========================================
// PipelineMode - 运行模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    Direct,
    Snapshot,
}

impl PipelineMode {
    /// 文件库走快照，内存库直连
    pub fn default_for(conn: &Connection) -> Self {
        match conn.path() {
            None | Some("") => PipelineMode::Direct,
            Some(_) => PipelineMode::Snapshot,
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Direct => write!(f, "DIRECT"),
            PipelineMode::Snapshot => write!(f, "SNAPSHOT"),
        }
    }
}

// ==========================================
// StorageBackend Trait
// ==========================================
pub trait StorageBackend {
    fn mode(&self) -> PipelineMode;

    /// 开始运行，返回本次运行使用的连接
    fn begin(&mut self) -> StorageResult<Arc<Mutex<Connection>>>;

    /// 正常结束，持久化运行结果
    fn finish(&mut self) -> StorageResult<()>;

    /// 异常结束，丢弃未持久化的运行结果
    fn discard(&mut self);
}

/// 按模式构造存储后端
pub fn backend_for(mode: PipelineMode, conn: Arc<Mutex<Connection>>) -> Box<dyn StorageBackend> {
    match mode {
        PipelineMode::Direct => Box::new(DirectBackend::new(conn)),
        PipelineMode::Snapshot => Box::new(SnapshotBackend::new(conn)),
    }
}

// ==========================================
// DirectBackend - 直连
// ==========================================
pub struct DirectBackend {
    conn: Arc<Mutex<Connection>>,
}

impl DirectBackend {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl StorageBackend for DirectBackend {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Direct
    }

    fn begin(&mut self) -> StorageResult<Arc<Mutex<Connection>>> {
        Ok(self.conn.clone())
    }

    fn finish(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn discard(&mut self) {}
}

// ==========================================
// SnapshotBackend - 内存快照
// ==========================================
pub struct SnapshotBackend {
    source: Arc<Mutex<Connection>>,
    working: Option<Arc<Mutex<Connection>>>,
}

impl SnapshotBackend {
    pub fn new(source: Arc<Mutex<Connection>>) -> Self {
        Self { source, working: None }
    }
}

impl StorageBackend for SnapshotBackend {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Snapshot
    }

    fn begin(&mut self) -> StorageResult<Arc<Mutex<Connection>>> {
        let mut memory = open_in_memory_connection()?;
        {
            let source = self
                .source
                .lock()
                .map_err(|e| StorageError::LockError(e.to_string()))?;
            copy_database(&source, &mut memory)?;
        }
        debug!("源库已复制到内存库");

        let working = Arc::new(Mutex::new(memory));
        self.working = Some(working.clone());
        Ok(working)
    }

    fn finish(&mut self) -> StorageResult<()> {
        let working = self.working.take().ok_or(StorageError::NotStarted)?;
        let memory = working
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;
        let mut source = self
            .source
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;
        copy_database(&memory, &mut source)?;

        info!("内存库已写回源库");
        Ok(())
    }

    fn discard(&mut self) {
        if self.working.take().is_some() {
            debug!("丢弃内存库，源库保持不变");
        }
    }
}

/// SQLite online backup: 整库拷贝
fn copy_database(from: &Connection, to: &mut Connection) -> rusqlite::Result<()> {
    let backup = Backup::new(from, to)?;
    backup.run_to_completion(BACKUP_PAGES_PER_STEP, Duration::ZERO, None)
}
