// ==========================================
// 特殊定尺钢筋采购优化系统 - 优化编排器
// ==========================================
// 职责: 一次修订的完整流水线
//       聚合 -> (按直径并行) 校验+优化 -> 捆包/批次 -> 排程
// 红线: 按直径并行计算, 合并按直径升序确定性归并;
//       批次计数器单写者推进, 并行度不影响编号结果
// 红线: 单直径失败只进该直径的结果项, 不阻断其他直径
// ==========================================

use crate::domain::bundle::{Bundle, Lot, LotSequencer};
use crate::domain::catalog::{Catalog, Policy};
use crate::domain::demand::{BarMarkSpec, DemandItem};
use crate::domain::revision::{DiameterOutcome, RevisionResultSet};
use crate::domain::types::{Diameter, Objective, RevisionStatus};
use crate::engine::aggregator::DemandAggregator;
use crate::engine::bundler::BundleGenerator;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::metrics::MetricsEngine;
use crate::engine::objective::scorable_for;
use crate::engine::optimizer::CuttingPatternOptimizer;
use crate::engine::scheduler::ProcurementScheduler;
use crate::engine::validator::CatalogValidator;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// OptimizationRequest - 一次修订的输入
// ==========================================
#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub project_id: String,   // 工程ID
    pub revision_no: i32,     // 修订号 (工程内递增, 调用方分配)
    pub objective: Objective, // 驱动目标
    pub today: NaiveDate,     // 基准日 (调用方注入, 引擎不读壁钟)
}

// ==========================================
// OptimizationOrchestrator - 优化编排器
// ==========================================
pub struct OptimizationOrchestrator {
    aggregator: DemandAggregator,
    bundler: BundleGenerator,
    scheduler: ProcurementScheduler,
}

impl OptimizationOrchestrator {
    pub fn new() -> Self {
        Self {
            aggregator: DemandAggregator::new(),
            bundler: BundleGenerator::new(),
            scheduler: ProcurementScheduler::new(),
        }
    }

    /// 执行一次修订的完整优化
    ///
    /// # 参数
    /// - request: 修订输入
    /// - bar_marks: 设计层配筋符号全集
    /// - catalog: 目录快照 (只读共享)
    /// - policy: 全局策略快照
    ///
    /// # 返回
    /// 不可变修订结果集 (按直径结果映射 + 捆包 + 批次 + 排程)
    #[instrument(skip(self, bar_marks, catalog, policy), fields(
        project = %request.project_id,
        revision_no = request.revision_no,
        objective = %request.objective,
        marks = bar_marks.len()
    ))]
    pub async fn run(
        &self,
        request: &OptimizationRequest,
        bar_marks: &[BarMarkSpec],
        catalog: Arc<Catalog>,
        policy: Policy,
    ) -> EngineResult<RevisionResultSet> {
        let started = Instant::now();

        let demand_items = self.aggregator.aggregate(bar_marks);
        info!(diameters = demand_items.len(), "需求聚合完成");

        // 按直径并行优化 (只读快照共享, 无共享可变状态)
        let mut tasks = tokio::task::JoinSet::new();
        for demand in demand_items {
            let catalog = Arc::clone(&catalog);
            let objective = request.objective;
            tasks.spawn_blocking(move || {
                let outcome = compute_diameter(&demand, &catalog, &policy, objective);
                (demand, outcome)
            });
        }

        // 确定性归并: 完成顺序无关, BTreeMap 按直径升序
        let mut outcomes: BTreeMap<Diameter, DiameterOutcome> = BTreeMap::new();
        let mut demands: BTreeMap<Diameter, DemandItem> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (demand, outcome) =
                joined.map_err(|e| EngineError::InternalError(format!("并行任务失败: {}", e)))?;
            demands.insert(demand.diameter, demand.clone());
            outcomes.insert(demand.diameter, outcome);
        }

        // 捆包/批次: 直径升序串行推进单写者计数器
        let mut sequencer = LotSequencer::new(&request.project_id);
        let mut bundles: Vec<Bundle> = Vec::new();
        let mut lots: Vec<Lot> = Vec::new();
        let mut seq_offset: u32 = 0;
        for (diameter, outcome) in &outcomes {
            let Some(pattern) = outcome.pattern() else {
                continue;
            };
            let marks = &demands[diameter].source_bar_marks;
            let (mut dia_bundles, dia_lots) =
                self.bundler
                    .bundle(pattern, marks, policy.bundle_max_size, &mut sequencer)?;
            for b in &mut dia_bundles {
                b.cutting_sequence_index += seq_offset;
            }
            seq_offset += dia_bundles.len() as u32;
            bundles.extend(dia_bundles);
            lots.extend(dia_lots);
        }

        // JIT 排程 (跨捆包吨位归约后统一判定)
        let required_dates = earliest_required_dates(bar_marks);
        let schedule =
            self.scheduler
                .schedule(&bundles, &catalog, &required_dates, request.today, &policy);

        let result = RevisionResultSet {
            revision_id: Uuid::new_v4().to_string(),
            project_id: request.project_id.clone(),
            revision_no: request.revision_no,
            objective: request.objective,
            status: RevisionStatus::Completed,
            outcomes,
            bundles,
            lots,
            schedule,
            created_at: Utc::now(),
            elapsed_ms: started.elapsed().as_millis() as i64,
        };

        info!(
            revision_id = %result.revision_id,
            optimized = result.optimized_count(),
            infeasible = result.infeasible_diameters().len(),
            alarms = result.schedule.alarms().len(),
            elapsed_ms = result.elapsed_ms,
            "修订优化完成"
        );
        Ok(result)
    }
}

impl Default for OptimizationOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// 单直径流水线: 校验候选 -> 精确 DP -> 指标快照
///
/// 失败被折叠进 DiameterOutcome, 保证错误按直径隔离
fn compute_diameter(
    demand: &DemandItem,
    catalog: &Catalog,
    policy: &Policy,
    objective: Objective,
) -> DiameterOutcome {
    let validator = CatalogValidator::new();
    let optimizer = CuttingPatternOptimizer::new();
    let metrics_engine = MetricsEngine::new();
    let scorable = scorable_for(objective);

    let (accepted, _rejected) =
        validator.validated_rows(policy, catalog, demand.diameter, demand.required_tonnage());

    match optimizer.optimize(demand, &accepted, catalog, scorable.as_ref()) {
        Ok(pattern) => {
            let metrics = metrics_engine.metrics(&pattern, catalog);
            DiameterOutcome::Optimized { pattern, metrics }
        }
        Err(e @ EngineError::NoCandidates { .. }) | Err(e @ EngineError::Infeasible { .. }) => {
            DiameterOutcome::Infeasible {
                reason: e.to_string(),
            }
        }
        Err(e) => DiameterOutcome::Infeasible {
            reason: format!("优化异常: {}", e),
        },
    }
}

/// 符号 -> 最早要求到货日 (同符号多条时取最早)
fn earliest_required_dates(bar_marks: &[BarMarkSpec]) -> HashMap<String, NaiveDate> {
    let mut dates: HashMap<String, NaiveDate> = HashMap::new();
    for mark in bar_marks {
        if let Some(d) = mark.required_date {
            dates
                .entry(mark.bar_mark.clone())
                .and_modify(|cur| {
                    if d < *cur {
                        *cur = d;
                    }
                })
                .or_insert(d);
        }
    }
    dates
}
