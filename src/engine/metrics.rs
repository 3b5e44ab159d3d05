// ==========================================
// 特殊定尺钢筋采购优化系统 - 指标引擎
// ==========================================
// 职责: 对任意方案重算 RCW% / CO2 / Cost 三指标
// 红线: 与优化器目标函数同一公式, 交叉核对必须一致
// ==========================================

use crate::domain::catalog::Catalog;
use crate::domain::pattern::{CuttingPattern, PatternMetrics};
use crate::engine::objective::{Co2Objective, CostObjective, RcwObjective, Scorable};

// ==========================================
// MetricsEngine - 指标引擎 (纯重算, 与驱动目标无关)
// ==========================================
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    /// 重算方案三指标 (报表/审计口径)
    pub fn metrics(&self, pattern: &CuttingPattern, catalog: &Catalog) -> PatternMetrics {
        PatternMetrics {
            rcw_pct: RcwObjective.score(pattern, catalog) * 100.0,
            co2_kg: Co2Objective.score(pattern, catalog),
            cost: CostObjective.score(pattern, catalog),
        }
    }

    /// 按目标种类取单指标 (与优化器自报分值交叉核对)
    pub fn score_of(
        &self,
        pattern: &CuttingPattern,
        catalog: &Catalog,
        objective: crate::domain::types::Objective,
    ) -> f64 {
        crate::engine::objective::scorable_for(objective).score(pattern, catalog)
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Manufacturer;
    use crate::domain::pattern::PatternLineItem;
    use crate::domain::types::{Diameter, Objective};

    fn catalog() -> Catalog {
        Catalog {
            manufacturers: vec![Manufacturer {
                manufacturer_id: "M-A".to_string(),
                name: "A厂".to_string(),
                carbon_factor_kg_per_kg: 0.7,
                unit_price_per_kg: 0.1,
                min_lead_time_days: 14,
            }],
            stock_lengths: vec![],
        }
    }

    fn pattern() -> CuttingPattern {
        CuttingPattern {
            diameter: Diameter::D25,
            objective: Objective::Rcw,
            required_length_mm: 100_000,
            line_items: vec![PatternLineItem {
                manufacturer_id: "M-A".to_string(),
                length_mm: 10_500,
                quantity: 10,
                waste_per_piece_mm: 500.0,
            }],
            objective_score: 5_000.0 / 105_000.0,
        }
    }

    #[test]
    fn test_metrics_all_three() {
        let m = MetricsEngine::new().metrics(&pattern(), &catalog());
        assert!((m.rcw_pct - 100.0 * 5_000.0 / 105_000.0).abs() < 1e-9);
        let steel_kg = 10.0 * 10.5 * 3.98;
        assert!((m.co2_kg - steel_kg * 0.7).abs() < 1e-9);
        assert!((m.cost - steel_kg * 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_cross_check_with_optimizer_score() {
        let p = pattern();
        let engine = MetricsEngine::new();
        let recomputed = engine.score_of(&p, &catalog(), Objective::Rcw);
        assert!((recomputed - p.objective_score).abs() < 1e-12);
    }
}
