// ==========================================
// 特殊定尺钢筋采购优化系统 - 优化 API
// ==========================================
// 职责: 一次修订的端到端执行与持久化, 修订历史查询
// 红线: 重算生成新修订并取代旧修订, 旧结果永不原地修改
// 架构: API 层 -> Engine 层 (Orchestrator) -> Repository 层
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::revision::{RevisionResultSet, RevisionSummary};
use crate::domain::types::{Objective, RevisionStatus};
use crate::engine::orchestrator::{OptimizationOrchestrator, OptimizationRequest};
use crate::repository::bar_mark_repo::BarMarkRepository;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::pattern_repo::PatternRepository;
use crate::repository::revision_repo::{RevisionRecord, RevisionRepository};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// OptimizeApi - 优化 API
// ==========================================
pub struct OptimizeApi {
    bar_mark_repo: Arc<BarMarkRepository>,
    catalog_repo: Arc<CatalogRepository>,
    revision_repo: Arc<RevisionRepository>,
    pattern_repo: Arc<PatternRepository>,
    order_repo: Arc<OrderRepository>,
    config: Arc<ConfigManager>,
    orchestrator: OptimizationOrchestrator,
}

impl OptimizeApi {
    pub fn new(
        bar_mark_repo: Arc<BarMarkRepository>,
        catalog_repo: Arc<CatalogRepository>,
        revision_repo: Arc<RevisionRepository>,
        pattern_repo: Arc<PatternRepository>,
        order_repo: Arc<OrderRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            bar_mark_repo,
            catalog_repo,
            revision_repo,
            pattern_repo,
            order_repo,
            config,
            orchestrator: OptimizationOrchestrator::new(),
        }
    }

    /// 执行一次完整优化并持久化为新修订
    ///
    /// # 参数
    /// - project_id: 工程ID
    /// - objective: 驱动目标 (None 时取配置默认值)
    /// - today: 基准日 (调用方注入)
    ///
    /// # 返回
    /// 持久化完成的修订结果集 (revision_no 为库内分配值)
    #[instrument(skip(self), fields(project = %project_id))]
    pub async fn run_revision(
        &self,
        project_id: &str,
        objective: Option<Objective>,
        today: NaiveDate,
    ) -> ApiResult<RevisionResultSet> {
        if project_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("工程ID不能为空".to_string()));
        }

        let bar_marks = self.bar_mark_repo.list_by_project(project_id)?;
        if bar_marks.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "工程 {} 无配筋数据, 请先导入配筋表",
                project_id
            )));
        }

        let catalog = Arc::new(self.catalog_repo.load_catalog()?);
        if catalog.stock_lengths.is_empty() {
            return Err(ApiError::InvalidInput(
                "目录为空, 请先导入厂商定尺目录".to_string(),
            ));
        }

        let policy = self
            .config
            .get_policy()
            .map_err(|e| ApiError::InternalError(format!("策略加载失败: {}", e)))?;
        let objective = match objective {
            Some(o) => o,
            None => self
                .config
                .get_default_objective()
                .map_err(|e| ApiError::InternalError(format!("目标配置读取失败: {}", e)))?,
        };

        let request = OptimizationRequest {
            project_id: project_id.to_string(),
            revision_no: 0, // 占位, 落库时在同一事务内分配
            objective,
            today,
        };

        let mut result = self
            .orchestrator
            .run(&request, &bar_marks, catalog, policy)
            .await?;

        // 落库分两段: 先以 COMPUTING 建头并写入结果, 全部成功后
        // 在同一事务内置为 COMPLETED 并取代旧修订。中途失败时
        // 旧生效修订保持不变, 半成品修订停留在 COMPUTING
        let mut record = RevisionRecord {
            revision_id: result.revision_id.clone(),
            project_id: result.project_id.clone(),
            revision_no: 0,
            objective: result.objective,
            status: RevisionStatus::Computing,
            created_at: result.created_at,
            elapsed_ms: result.elapsed_ms,
        };
        self.revision_repo.create_with_next_revision_no(&mut record)?;
        result.revision_no = record.revision_no;

        self.pattern_repo
            .save_outcomes(&result.revision_id, &result.outcomes)?;
        self.order_repo.save_results(
            &result.revision_id,
            &result.bundles,
            &result.lots,
            &result.schedule,
        )?;

        self.revision_repo
            .mark_completed(&result.revision_id, &result.project_id)?;

        info!(
            revision_id = %result.revision_id,
            revision_no = result.revision_no,
            "修订已持久化"
        );
        Ok(result)
    }

    /// 重建某修订的完整结果集 (历史查询)
    pub fn get_revision(&self, revision_id: &str) -> ApiResult<RevisionResultSet> {
        let record = self
            .revision_repo
            .find_by_id(revision_id)?
            .ok_or_else(|| ApiError::NotFound(format!("修订(id={})不存在", revision_id)))?;

        Ok(RevisionResultSet {
            revision_id: record.revision_id,
            project_id: record.project_id,
            revision_no: record.revision_no,
            objective: record.objective,
            status: record.status,
            outcomes: self.pattern_repo.load_outcomes(revision_id)?,
            bundles: self.order_repo.load_bundles(revision_id)?,
            lots: self.order_repo.load_lots(revision_id)?,
            schedule: self.order_repo.load_schedule(revision_id)?,
            created_at: record.created_at,
            elapsed_ms: record.elapsed_ms,
        })
    }

    /// 修订历史 (修订号降序, 时间线协作方消费)
    pub fn list_revisions(&self, project_id: &str) -> ApiResult<Vec<RevisionSummary>> {
        let records = self.revision_repo.list_by_project(project_id)?;
        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let rs = self.get_revision(&record.revision_id)?;
            summaries.push(RevisionSummary::from_result_set(&rs));
        }
        Ok(summaries)
    }

    /// 当前生效修订 (最近一次完成的修订)
    pub fn latest_revision(&self, project_id: &str) -> ApiResult<Option<RevisionResultSet>> {
        match self.revision_repo.latest_completed(project_id)? {
            Some(record) => Ok(Some(self.get_revision(&record.revision_id)?)),
            None => Ok(None),
        }
    }
}
