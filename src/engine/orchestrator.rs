// ==========================================
// 集装箱码头流量合成系统 - 生成流水线编排器
// ==========================================
// 用途: 协调六个分配阶段的执行顺序
// 流程: 清理历史流量 → 加载参数/分布 → 依次执行分配阶段 → 持久化
// 红线: 阶段严格顺序执行；配置非法时在任何分配开始前拒绝
// ==========================================

use crate::analysis::{CapacityStatusSnapshot, InboundAndOutboundVehicleCapacityAnalysis};
use crate::config::GenerationConfigReader;
use crate::engine::destination::DestinationAssignmentStage;
use crate::engine::error::{GenerationError, GenerationResult};
use crate::engine::fleet::FleetCreationStage;
use crate::engine::ledger::VehicleCapacityLedger;
use crate::engine::outbound::OutboundAssignmentStage;
use crate::engine::repositories::FlowRepositories;
use crate::engine::sampler::SeededDistributionSampler;
use crate::engine::stage::{AllocationStage, GenerationStage, RunContext, StageOutcome};
use crate::engine::truck_delivery::TruckDeliveryAllocationStage;
use crate::engine::trucks::{ExportTruckStage, ImportTruckStage};
use crate::storage::{backend_for, PipelineMode, StorageBackend};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

// ==========================================
// 运行结果
// ==========================================

/// 清理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearSummary {
    pub containers_deleted: usize,
    pub vehicles_deleted: usize,
    pub trucks_deleted: usize,
}

/// 生成报告
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub mode: String,
    pub cleared: ClearSummary,
    pub outcomes: Vec<StageOutcome>,
}

impl GenerationReport {
    pub fn outcome(&self, stage: &str) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| o.stage == stage)
    }
}

/// 进度（当前阶段 + 各阶段运力快照）
#[derive(Debug, Clone, Serialize)]
pub struct GenerationProgress {
    pub run_id: Option<String>,
    pub stage: GenerationStage,
    pub history: Vec<CapacityStatusSnapshot>,
}

// ==========================================
// ContainerFlowGenerationService - 编排器
// ==========================================
pub struct ContainerFlowGenerationService<C>
where
    C: GenerationConfigReader,
{
    config: Arc<C>,
    source: Arc<Mutex<Connection>>,
    mode: PipelineMode,
    stage: GenerationStage,
    run_id: Option<String>,
    history: Vec<CapacityStatusSnapshot>,
}

impl<C> ContainerFlowGenerationService<C>
where
    C: GenerationConfigReader,
{
    /// 创建编排器（运行模式由连接类型决定：文件库快照，内存库直连）
    pub fn new(config: Arc<C>, source: Arc<Mutex<Connection>>) -> GenerationResult<Self> {
        let mode = {
            let conn = source
                .lock()
                .map_err(|e| crate::storage::StorageError::LockError(e.to_string()))?;
            PipelineMode::default_for(&conn)
        };
        Ok(Self::with_mode(config, source, mode))
    }

    /// 显式指定运行模式
    pub fn with_mode(config: Arc<C>, source: Arc<Mutex<Connection>>, mode: PipelineMode) -> Self {
        Self {
            config,
            source,
            mode,
            stage: GenerationStage::Idle,
            run_id: None,
            history: Vec::new(),
        }
    }

    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    pub fn progress(&self) -> GenerationProgress {
        GenerationProgress {
            run_id: self.run_id.clone(),
            stage: self.stage,
            history: self.history.clone(),
        }
    }

    /// 是否已有生成的流量数据
    pub fn container_flow_data_exists(&self) -> GenerationResult<bool> {
        let repos = FlowRepositories::from_connection(self.source.clone());
        Ok(repos.container_repo.count_all()? > 0)
    }

    /// 清理历史流量（船期保留）
    ///
    /// 顺序: 集装箱 → 运输工具实例（级联专属行）→ 集卡
    pub fn clear_previous_state(&self) -> GenerationResult<ClearSummary> {
        let repos = FlowRepositories::from_connection(self.source.clone());
        let summary = ClearSummary {
            containers_deleted: repos.container_repo.delete_all()?,
            vehicles_deleted: repos.vehicle_repo.delete_all()?,
            trucks_deleted: repos.truck_repo.delete_all()?,
        };
        info!(
            containers_deleted = summary.containers_deleted,
            vehicles_deleted = summary.vehicles_deleted,
            trucks_deleted = summary.trucks_deleted,
            "历史流量已清理"
        );
        Ok(summary)
    }

    fn advance(&mut self, to: GenerationStage) -> GenerationResult<()> {
        if self.stage.next() != Some(to) {
            return Err(GenerationError::InvalidStageTransition { from: self.stage, to });
        }
        debug!(from = %self.stage, to = %to, "阶段转换");
        self.stage = to;
        Ok(())
    }

    /// 执行完整生成流程
    pub fn generate(&mut self) -> GenerationResult<GenerationReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("container_flow_generation", run_id = %run_id, mode = %self.mode);
        let _enter = span.enter();

        self.run_id = Some(run_id.clone());
        self.stage = GenerationStage::Idle;
        self.history.clear();

        // 配置先行校验，非法时不触碰任何数据
        let properties = self.config.load_properties()?;
        let distributions = self.config.load_distributions()?;

        info!("开始生成集装箱流量");

        // ==========================================
        // 步骤1: 清理历史流量
        // ==========================================
        let cleared = self.clear_previous_state()?;
        self.advance(GenerationStage::PriorDataCleared)?;

        // ==========================================
        // 步骤2: 加载参数与分布
        // ==========================================
        let mut backend = backend_for(self.mode, self.source.clone());
        let conn = backend.begin()?;
        let repos = FlowRepositories::from_connection(conn);

        let mut ledger = VehicleCapacityLedger::new(repos.container_repo.clone());
        ledger.set_transportation_buffer(properties.transportation_buffer)?;
        ledger.set_exhaustion_threshold(properties.exhaustion_threshold)?;
        ledger.reset_cache();

        let sampler = SeededDistributionSampler::new(distributions, properties.random_seed);
        let mut analysis =
            InboundAndOutboundVehicleCapacityAnalysis::new(repos.clone(), properties.transportation_buffer);

        info!(
            start_date = %properties.start_date,
            end_date = %properties.end_date,
            transportation_buffer = properties.transportation_buffer,
            random_seed = properties.random_seed,
            "参数与分布已加载"
        );

        let mut ctx = RunContext {
            properties,
            repos,
            ledger,
            sampler: Box::new(sampler),
        };
        self.advance(GenerationStage::PropertiesLoaded)?;

        // ==========================================
        // 步骤3: 依次执行分配阶段
        // ==========================================
        let mut stages: Vec<Box<dyn AllocationStage>> = vec![
            Box::new(FleetCreationStage::new()),
            Box::new(OutboundAssignmentStage::new()),
            Box::new(ImportTruckStage::new()),
            Box::new(TruckDeliveryAllocationStage::new()),
            Box::new(ExportTruckStage::new()),
            Box::new(DestinationAssignmentStage::new()),
        ];

        let mut outcomes = Vec::with_capacity(stages.len());
        for stage in stages.iter_mut() {
            match self.run_stage(stage.as_mut(), &mut ctx, &mut analysis) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(stage = stage.name(), error = %e, "分配阶段失败，运行中止");
                    backend.discard();
                    return Err(e);
                }
            }
        }

        // ==========================================
        // 步骤4: 持久化
        // ==========================================
        drop(ctx);
        drop(analysis);
        backend.finish()?;
        self.advance(GenerationStage::Done)?;

        info!(
            containers_created = outcomes.iter().map(|o| o.containers_created).sum::<usize>(),
            trucks_created = outcomes.iter().map(|o| o.trucks_created).sum::<usize>(),
            "集装箱流量生成完成"
        );

        Ok(GenerationReport {
            run_id,
            mode: self.mode.to_string(),
            cleared,
            outcomes,
        })
    }

    fn run_stage(
        &mut self,
        stage: &mut dyn AllocationStage,
        ctx: &mut RunContext,
        analysis: &mut InboundAndOutboundVehicleCapacityAnalysis,
    ) -> GenerationResult<StageOutcome> {
        info!(stage = stage.name(), "执行分配阶段");
        let outcome = stage.run(ctx)?;
        self.advance(stage.completes())?;

        let snapshot = CapacityStatusSnapshot::capture(self.stage, analysis)?;
        info!(stage = %self.stage, "运力状态:\n{}", snapshot.to_text());
        self.history.push(snapshot);

        Ok(outcome)
    }
}
