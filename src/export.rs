// ==========================================
// 集装箱码头流量合成系统 - 流量导出
// ==========================================
// 输出: containers.csv / scheduled_vehicles.csv / trucks.csv
// ==========================================

use crate::engine::repositories::FlowRepositories;
use crate::repository::RepositoryError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// 导出全部流量数据到目录
///
/// # 返回
/// - Ok(Vec<PathBuf>): 写出的文件
pub fn export_container_flow(repos: &FlowRepositories, folder: &Path) -> ExportResult<Vec<PathBuf>> {
    std::fs::create_dir_all(folder)?;

    let containers_path = folder.join("containers.csv");
    let mut writer = csv::Writer::from_path(&containers_path)?;
    let containers = repos.container_repo.find_all()?;
    for container in &containers {
        writer.serialize(container)?;
    }
    writer.flush()?;

    let vehicles_path = folder.join("scheduled_vehicles.csv");
    let mut writer = csv::Writer::from_path(&vehicles_path)?;
    let vehicles = repos.vehicle_repo.find_all()?;
    for vehicle in &vehicles {
        writer.serialize(vehicle)?;
    }
    writer.flush()?;

    let trucks_path = folder.join("trucks.csv");
    let mut writer = csv::Writer::from_path(&trucks_path)?;
    let trucks = repos.truck_repo.find_all()?;
    for truck in &trucks {
        writer.serialize(truck)?;
    }
    writer.flush()?;

    info!(
        folder = %folder.display(),
        containers = containers.len(),
        vehicles = vehicles.len(),
        trucks = trucks.len(),
        "流量数据已导出"
    );

    Ok(vec![containers_path, vehicles_path, trucks_path])
}
