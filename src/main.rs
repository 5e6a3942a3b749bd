// ==========================================
// 集装箱码头流量合成系统 - 命令行入口
// ==========================================
// 用法:
//   container-flow-gen [db_path] <command> [args]
// 命令:
//   seed [start_date] [horizon_days]   写入演示船期与生成参数
//   preview                            生成前运力预览
//   generate                           执行完整生成流程
//   analyze                            生成后运力利用分析与集卡闸口吞吐
//   export <folder>                    导出 CSV
//   clear                              清理已生成流量
// ==========================================

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;

use container_flow_gen::analysis::{
    ContainerFlowByVehicleTypePreview, InboundAndOutboundVehicleCapacityPreview,
};
use container_flow_gen::app::{get_default_db_path, seed_demo_schedules, AppState};
use container_flow_gen::config::GenerationConfigReader;
use container_flow_gen::domain::types::ModeOfTransport;
use container_flow_gen::export::export_container_flow;
use container_flow_gen::logging;

const DEFAULT_HORIZON_DAYS: i64 = 21;

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    // 首个参数以 .db 结尾时视为数据库路径
    let db_path = if args.first().map_or(false, |a| a.ends_with(".db")) {
        args.remove(0)
    } else {
        get_default_db_path()
    };
    let command = args.first().cloned().unwrap_or_else(|| "generate".to_string());

    tracing::info!("==================================================");
    tracing::info!("{} v{}", container_flow_gen::APP_NAME, container_flow_gen::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let mut state = AppState::new(db_path)?;

    match command.as_str() {
        "seed" => {
            let start_date = match args.get(1) {
                Some(raw) => raw
                    .parse::<NaiveDate>()
                    .with_context(|| format!("无法解析起始日期: {}", raw))?,
                None => Local::now().date_naive(),
            };
            let horizon_days = match args.get(2) {
                Some(raw) => raw
                    .parse::<i64>()
                    .with_context(|| format!("无法解析天数: {}", raw))?,
                None => DEFAULT_HORIZON_DAYS,
            };
            let created = seed_demo_schedules(
                &state.repositories(),
                &state.config_manager,
                start_date,
                horizon_days,
            )?;
            tracing::info!(schedules_created = created, "演示数据已写入");
        }
        "preview" => {
            let properties = state.config_manager.load_properties()?;
            let distributions = state.config_manager.load_distributions()?;
            let schedules = state.repositories().schedule_repo.find_all()?;

            let preview = InboundAndOutboundVehicleCapacityPreview::new(
                schedules,
                properties.start_date,
                properties.end_date,
                properties.transportation_buffer,
                distributions,
            );
            let inbound = preview.get_inbound_capacity_of_vehicles();
            let outbound = preview.get_outbound_capacity_of_vehicles();
            for mode in ModeOfTransport::ALL {
                tracing::info!(
                    vehicle_type = %mode,
                    inbound = inbound.teu_of(mode).unwrap_or(0.0),
                    outbound_used = outbound.used.teu_of(mode).unwrap_or(0.0),
                    outbound_maximum = ?outbound.maximum.teu_of(mode),
                    "运力预览"
                );
            }

            let flow = ContainerFlowByVehicleTypePreview::new(preview).get_inbound_to_outbound_flow();
            println!("{}", serde_json::to_string_pretty(&flow)?);
        }
        "generate" => {
            let report = state.generation_service.generate()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "analyze" => {
            let mut analysis = state.capacity_analysis()?;
            let inbound = analysis.get_inbound_container_volumes_by_vehicle_type(None, None, false)?;
            let outbound = analysis.get_outbound_container_volume_by_vehicle_type(None, None, false)?;
            let truck_gate = state.truck_gate_throughput().get_report(true, true, None, None)?;
            tracing::info!(
                fewest_trucks_day = %truck_gate.fewest_trucks_day,
                most_trucks_day = %truck_gate.most_trucks_day,
                average_trucks_per_day = truck_gate.average_trucks_per_day,
                "集卡闸口吞吐"
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "inbound": inbound,
                    "outbound": outbound,
                    "truck_gate_throughput": truck_gate,
                }))?
            );
        }
        "export" => {
            let folder = args
                .get(1)
                .map(PathBuf::from)
                .context("export 需要输出目录参数")?;
            let files = export_container_flow(&state.repositories(), &folder)?;
            for file in files {
                println!("{}", file.display());
            }
        }
        "clear" => {
            let summary = state.generation_service.clear_previous_state()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        other => bail!("未知命令: {}", other),
    }

    Ok(())
}
