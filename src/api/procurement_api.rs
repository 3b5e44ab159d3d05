// ==========================================
// 特殊定尺钢筋采购优化系统 - 采购 API
// ==========================================
// 职责: 订单查询、告警列表、指标报表 (只读)
// 红线: 告警只含 AtRisk/Delayed, 不可行订单单独返回
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::{InfeasibleOrder, ProcurementOrder};
use crate::domain::pattern::PatternMetrics;
use crate::domain::revision::DiameterOutcome;
use crate::domain::types::{Diameter, OrderStatus};
use crate::repository::order_repo::OrderRepository;
use crate::repository::pattern_repo::PatternRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// DiameterMetricsRow - 指标报表行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiameterMetricsRow {
    pub diameter: Diameter,          // 直径
    pub required_length_mm: i64,     // 需求长度 (毫米)
    pub supplied_length_mm: i64,     // 供给长度 (毫米)
    pub metrics: PatternMetrics,     // 三指标快照
    pub infeasible_reason: Option<String>, // 不可行原因 (可行时为 None)
}

// ==========================================
// ProcurementApi - 采购 API
// ==========================================
pub struct ProcurementApi {
    order_repo: Arc<OrderRepository>,
    pattern_repo: Arc<PatternRepository>,
}

impl ProcurementApi {
    pub fn new(order_repo: Arc<OrderRepository>, pattern_repo: Arc<PatternRepository>) -> Self {
        Self {
            order_repo,
            pattern_repo,
        }
    }

    /// 某修订的采购订单列表 (可按状态过滤)
    pub fn list_orders(
        &self,
        revision_id: &str,
        status: Option<OrderStatus>,
    ) -> ApiResult<Vec<ProcurementOrder>> {
        if revision_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("修订ID不能为空".to_string()));
        }

        let schedule = self.order_repo.load_schedule(revision_id)?;
        Ok(match status {
            None => schedule.orders,
            Some(s) => schedule
                .orders
                .into_iter()
                .filter(|o| o.status == s)
                .collect(),
        })
    }

    /// 告警订单列表 (AtRisk/Delayed)
    pub fn alarm_orders(&self, revision_id: &str) -> ApiResult<Vec<ProcurementOrder>> {
        let schedule = self.order_repo.load_schedule(revision_id)?;
        Ok(schedule
            .orders
            .into_iter()
            .filter(|o| o.status.is_alarm())
            .collect())
    }

    /// 不可行订单子集 (显式返回, 不得丢弃)
    pub fn infeasible_orders(&self, revision_id: &str) -> ApiResult<Vec<InfeasibleOrder>> {
        let schedule = self.order_repo.load_schedule(revision_id)?;
        Ok(schedule.infeasible)
    }

    /// 按直径的三指标报表 (直径升序)
    pub fn metrics_report(&self, revision_id: &str) -> ApiResult<Vec<DiameterMetricsRow>> {
        let outcomes = self.pattern_repo.load_outcomes(revision_id)?;

        let mut rows = Vec::new();
        for (diameter, outcome) in &outcomes {
            match outcome {
                DiameterOutcome::Optimized { pattern, metrics } => rows.push(DiameterMetricsRow {
                    diameter: *diameter,
                    required_length_mm: pattern.required_length_mm,
                    supplied_length_mm: pattern.total_supplied_mm(),
                    metrics: *metrics,
                    infeasible_reason: None,
                }),
                DiameterOutcome::Infeasible { reason } => rows.push(DiameterMetricsRow {
                    diameter: *diameter,
                    required_length_mm: 0,
                    supplied_length_mm: 0,
                    metrics: PatternMetrics {
                        rcw_pct: 0.0,
                        co2_kg: 0.0,
                        cost: 0.0,
                    },
                    infeasible_reason: Some(reason.clone()),
                }),
                DiameterOutcome::EmptyDemand => {}
            }
        }
        Ok(rows)
    }
}
