// ==========================================
// 特殊定尺钢筋采购优化系统 - 切割方案仓储
// ==========================================
// 职责: 按直径结果 (方案/不可行/无需求) 的版本化持久化
// 说明: 方案行以 JSON 快照列存储 (结构稳定, 审计可读)
// ==========================================

use crate::domain::pattern::{CuttingPattern, PatternLineItem, PatternMetrics};
use crate::domain::revision::DiameterOutcome;
use crate::domain::types::{Diameter, Objective};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_diameter;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// PatternRepository - 切割方案仓储
// ==========================================
pub struct PatternRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PatternRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存一次修订的全部按直径结果 (单事务, 追加型)
    pub fn save_outcomes(
        &self,
        revision_id: &str,
        outcomes: &BTreeMap<Diameter, DiameterOutcome>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for (diameter, outcome) in outcomes {
            match outcome {
                DiameterOutcome::Optimized { pattern, metrics } => {
                    tx.execute(
                        r#"INSERT INTO cutting_pattern (
                            revision_id, diameter, outcome_kind, required_length_mm,
                            objective, objective_score, line_items_json,
                            rcw_pct, co2_kg, cost, infeasible_reason
                        ) VALUES (?, ?, 'OPTIMIZED', ?, ?, ?, ?, ?, ?, ?, NULL)"#,
                        params![
                            revision_id,
                            diameter.as_str(),
                            &pattern.required_length_mm,
                            pattern.objective.as_str(),
                            &pattern.objective_score,
                            serde_json::to_string(&pattern.line_items)?,
                            &metrics.rcw_pct,
                            &metrics.co2_kg,
                            &metrics.cost,
                        ],
                    )?;
                }
                DiameterOutcome::Infeasible { reason } => {
                    tx.execute(
                        r#"INSERT INTO cutting_pattern (
                            revision_id, diameter, outcome_kind, required_length_mm,
                            objective, objective_score, line_items_json,
                            rcw_pct, co2_kg, cost, infeasible_reason
                        ) VALUES (?, ?, 'INFEASIBLE', 0, 'RCW', 0, '[]', NULL, NULL, NULL, ?)"#,
                        params![revision_id, diameter.as_str(), reason],
                    )?;
                }
                DiameterOutcome::EmptyDemand => {
                    tx.execute(
                        r#"INSERT INTO cutting_pattern (
                            revision_id, diameter, outcome_kind, required_length_mm,
                            objective, objective_score, line_items_json,
                            rcw_pct, co2_kg, cost, infeasible_reason
                        ) VALUES (?, ?, 'EMPTY_DEMAND', 0, 'RCW', 0, '[]', NULL, NULL, NULL, NULL)"#,
                        params![revision_id, diameter.as_str()],
                    )?;
                }
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 装载一次修订的全部按直径结果
    pub fn load_outcomes(
        &self,
        revision_id: &str,
    ) -> RepositoryResult<BTreeMap<Diameter, DiameterOutcome>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT diameter, outcome_kind, required_length_mm, objective,
                      objective_score, line_items_json, rcw_pct, co2_kg, cost,
                      infeasible_reason
               FROM cutting_pattern
               WHERE revision_id = ?
               ORDER BY diameter"#,
        )?;

        let rows = stmt
            .query_map(params![revision_id], |row| {
                let diameter = parse_diameter(row, 0)?;
                let kind: String = row.get(1)?;
                let required_length_mm: i64 = row.get(2)?;
                let objective_str: String = row.get(3)?;
                let objective_score: f64 = row.get(4)?;
                let line_items_json: String = row.get(5)?;
                let rcw_pct: Option<f64> = row.get(6)?;
                let co2_kg: Option<f64> = row.get(7)?;
                let cost: Option<f64> = row.get(8)?;
                let reason: Option<String> = row.get(9)?;
                Ok((
                    diameter,
                    kind,
                    required_length_mm,
                    objective_str,
                    objective_score,
                    line_items_json,
                    rcw_pct,
                    co2_kg,
                    cost,
                    reason,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcomes = BTreeMap::new();
        for (
            diameter,
            kind,
            required_length_mm,
            objective_str,
            objective_score,
            line_items_json,
            rcw_pct,
            co2_kg,
            cost,
            reason,
        ) in rows
        {
            let outcome = match kind.as_str() {
                "OPTIMIZED" => {
                    let line_items: Vec<PatternLineItem> =
                        serde_json::from_str(&line_items_json)?;
                    let objective = Objective::from_str(&objective_str).map_err(|e| {
                        RepositoryError::FieldValueError {
                            field: "objective".to_string(),
                            message: e,
                        }
                    })?;
                    DiameterOutcome::Optimized {
                        pattern: CuttingPattern {
                            diameter,
                            objective,
                            required_length_mm,
                            line_items,
                            objective_score,
                        },
                        metrics: PatternMetrics {
                            rcw_pct: rcw_pct.unwrap_or(0.0),
                            co2_kg: co2_kg.unwrap_or(0.0),
                            cost: cost.unwrap_or(0.0),
                        },
                    }
                }
                "INFEASIBLE" => DiameterOutcome::Infeasible {
                    reason: reason.unwrap_or_default(),
                },
                "EMPTY_DEMAND" => DiameterOutcome::EmptyDemand,
                other => {
                    return Err(RepositoryError::FieldValueError {
                        field: "outcome_kind".to_string(),
                        message: format!("未知结果类型: {}", other),
                    })
                }
            };
            outcomes.insert(diameter, outcome);
        }

        Ok(outcomes)
    }
}
