// ==========================================
// 特殊定尺钢筋采购优化系统 - 修订版本结果集
// ==========================================
// 依据: 设计修订生命周期 - 结果集不可变, 历史保留审计
// 红线: 重算生成新修订, 不得原地修改旧结果
// ==========================================

use crate::domain::bundle::{Bundle, Lot};
use crate::domain::order::ScheduleOutcome;
use crate::domain::pattern::{CuttingPattern, PatternMetrics};
use crate::domain::types::{Diameter, Objective, RevisionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// DiameterOutcome - 按直径结果 (错误按直径隔离)
// ==========================================
// 红线: 单直径失败不得阻断其他直径的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiameterOutcome {
    /// 优化成功, 附三指标快照
    Optimized {
        pattern: CuttingPattern,
        metrics: PatternMetrics,
    },
    /// 无可行组合 (候选集与最小起订约束冲突)
    Infeasible { reason: String },
    /// 该直径无配筋需求 (非错误, 向上视为"无事可做")
    EmptyDemand,
}

impl DiameterOutcome {
    pub fn pattern(&self) -> Option<&CuttingPattern> {
        match self {
            DiameterOutcome::Optimized { pattern, .. } => Some(pattern),
            _ => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, DiameterOutcome::Infeasible { .. })
    }
}

// ==========================================
// RevisionResultSet - 修订级不可变结果集
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionResultSet {
    pub revision_id: String,                          // 修订ID (uuid)
    pub project_id: String,                           // 工程ID
    pub revision_no: i32,                             // 修订号 (工程内递增)
    pub objective: Objective,                         // 驱动目标
    pub status: RevisionStatus,                       // 修订状态
    pub outcomes: BTreeMap<Diameter, DiameterOutcome>, // 按直径结果映射
    pub bundles: Vec<Bundle>,                         // 加工捆包
    pub lots: Vec<Lot>,                               // 加工批次
    pub schedule: ScheduleOutcome,                    // 采购排程
    pub created_at: DateTime<Utc>,                    // 生成时刻
    pub elapsed_ms: i64,                              // 计算耗时 (毫秒)
}

impl RevisionResultSet {
    /// 优化成功的直径数
    pub fn optimized_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, DiameterOutcome::Optimized { .. }))
            .count()
    }

    /// 不可行的直径列表
    pub fn infeasible_diameters(&self) -> Vec<Diameter> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_infeasible())
            .map(|(d, _)| *d)
            .collect()
    }
}

// ==========================================
// RevisionSummary - 修订摘要 (时间线协作方消费)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionSummary {
    pub revision_id: String,        // 修订ID
    pub project_id: String,         // 工程ID
    pub revision_no: i32,           // 修订号
    pub objective: Objective,       // 驱动目标
    pub status: RevisionStatus,     // 修订状态
    pub optimized_diameters: usize, // 优化成功直径数
    pub infeasible_diameters: usize, // 不可行直径数
    pub total_required_t: f64,      // 合计需求吨位
    pub total_supplied_t: f64,      // 合计供给吨位
    pub overall_rcw_pct: f64,       // 整体余尺废料率 (%)
    pub alarm_count: usize,         // 告警订单数 (AtRisk/Delayed)
    pub infeasible_order_count: usize, // 不可行订单数
    pub created_at: DateTime<Utc>,  // 生成时刻
    pub elapsed_ms: i64,            // 计算耗时 (毫秒)
}

impl RevisionSummary {
    /// 从完整结果集汇总
    pub fn from_result_set(rs: &RevisionResultSet) -> Self {
        let mut total_required_mm: i64 = 0;
        let mut total_supplied_mm: i64 = 0;
        let mut total_required_t = 0.0;
        let mut total_supplied_t = 0.0;

        for outcome in rs.outcomes.values() {
            if let Some(p) = outcome.pattern() {
                total_required_mm += p.required_length_mm;
                total_supplied_mm += p.total_supplied_mm();
                total_required_t += p.diameter.piece_tonnage(p.required_length_mm);
                total_supplied_t += p.total_supplied_tonnage();
            }
        }

        let overall_rcw_pct = if total_supplied_mm > 0 {
            (total_supplied_mm - total_required_mm) as f64 / total_supplied_mm as f64 * 100.0
        } else {
            0.0
        };

        Self {
            revision_id: rs.revision_id.clone(),
            project_id: rs.project_id.clone(),
            revision_no: rs.revision_no,
            objective: rs.objective,
            status: rs.status,
            optimized_diameters: rs.optimized_count(),
            infeasible_diameters: rs.infeasible_diameters().len(),
            total_required_t,
            total_supplied_t,
            overall_rcw_pct,
            alarm_count: rs.schedule.alarms().len(),
            infeasible_order_count: rs.schedule.infeasible.len(),
            created_at: rs.created_at,
            elapsed_ms: rs.elapsed_ms,
        }
    }
}
