// ==========================================
// 集装箱码头流量合成系统 - 应用层
// ==========================================
// 职责: 应用级共享状态、默认数据库路径、演示数据
// ==========================================

pub mod seed;
pub mod state;

pub use seed::seed_demo_schedules;
pub use state::{get_default_db_path, AppState};
