// ==========================================
// 集装箱码头流量合成系统 - 运力状态快照
// ==========================================
// 流水线每个阶段结束后生成一次，仅用于日志与进度历史
// ==========================================

use crate::analysis::capacity_analysis::InboundAndOutboundVehicleCapacityAnalysis;
use crate::domain::types::ModeOfTransport;
use crate::engine::stage::GenerationStage;
use crate::repository::RepositoryResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleTypeStatus {
    pub inbound_teu: f64,
    pub outbound_used_teu: f64,
    pub outbound_maximum_teu: Option<f64>, // 集卡为 None
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityStatusSnapshot {
    pub stage: GenerationStage,
    pub by_vehicle_type: BTreeMap<ModeOfTransport, VehicleTypeStatus>,
}

impl CapacityStatusSnapshot {
    /// 全量读取（不使用缓存）
    pub fn capture(
        stage: GenerationStage,
        analysis: &mut InboundAndOutboundVehicleCapacityAnalysis,
    ) -> RepositoryResult<Self> {
        let inbound = analysis.get_inbound_container_volumes_by_vehicle_type(None, None, false)?;
        let outbound = analysis.get_outbound_container_volume_by_vehicle_type(None, None, false)?;

        let by_vehicle_type = ModeOfTransport::ALL
            .iter()
            .map(|mode| {
                (
                    *mode,
                    VehicleTypeStatus {
                        inbound_teu: inbound.teu_of(*mode).unwrap_or(0.0),
                        outbound_used_teu: outbound.used.teu_of(*mode).unwrap_or(0.0),
                        outbound_maximum_teu: outbound.maximum.teu_of(*mode),
                    },
                )
            })
            .collect();

        Ok(Self { stage, by_vehicle_type })
    }

    /// 文本表格（日志输出用）
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(
            text,
            "{:<16} {:>12} {:>14} {:>14}",
            "vehicle type", "inbound", "outbound used", "outbound max"
        );
        for (mode, status) in &self.by_vehicle_type {
            let maximum = status
                .outbound_maximum_teu
                .map(|m| format!("{:.1}", m))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = writeln!(
                text,
                "{:<16} {:>12.1} {:>14.1} {:>14}",
                mode.as_str(),
                status.inbound_teu,
                status.outbound_used_teu,
                maximum
            );
        }
        text
    }
}
