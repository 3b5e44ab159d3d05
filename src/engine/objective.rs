// ==========================================
// 特殊定尺钢筋采购优化系统 - 优化目标抽象
// ==========================================
// 职责: RCW / CO2 / Cost 三目标统一为 Scorable 抽象
// 红线: DP 算法只对抽象编程, 选目标是配置而非代码分叉
// ==========================================
// 说明: 三个目标都是"单根代价可加性"的 - DP 以 piece_cost
// 累积; score 给出报表口径的整体目标值。RCW 的废料率
// (T-R)/T 随总供给 T 单调递增, 故最小化 Σlength 即最小化废料率。
// ==========================================

use crate::domain::catalog::{Catalog, Manufacturer};
use crate::domain::pattern::CuttingPattern;
use crate::domain::types::Objective;

/// 优化目标抽象
pub trait Scorable: Send + Sync {
    /// 目标种类
    fn kind(&self) -> Objective;

    /// 单根代价 (加性, DP 状态转移的累积量)
    fn piece_cost(&self, length_mm: i64, piece_kg: f64, manufacturer: &Manufacturer) -> f64;

    /// 方案整体目标值 (报表口径, Metrics Engine 交叉核对用)
    fn score(&self, pattern: &CuttingPattern, catalog: &Catalog) -> f64;
}

/// 按配置选择目标实现
pub fn scorable_for(objective: Objective) -> Box<dyn Scorable> {
    match objective {
        Objective::Rcw => Box::new(RcwObjective),
        Objective::Co2 => Box::new(Co2Objective),
        Objective::Cost => Box::new(CostObjective),
    }
}

// ==========================================
// RcwObjective - 余尺废料率最小
// ==========================================
pub struct RcwObjective;

impl Scorable for RcwObjective {
    fn kind(&self) -> Objective {
        Objective::Rcw
    }

    fn piece_cost(&self, length_mm: i64, _piece_kg: f64, _manufacturer: &Manufacturer) -> f64 {
        length_mm as f64
    }

    fn score(&self, pattern: &CuttingPattern, _catalog: &Catalog) -> f64 {
        let supplied = pattern.total_supplied_mm();
        if supplied <= 0 {
            return 0.0;
        }
        (supplied - pattern.required_length_mm) as f64 / supplied as f64
    }
}

// ==========================================
// Co2Objective - 碳排放最小
// ==========================================
pub struct Co2Objective;

impl Scorable for Co2Objective {
    fn kind(&self) -> Objective {
        Objective::Co2
    }

    fn piece_cost(&self, _length_mm: i64, piece_kg: f64, manufacturer: &Manufacturer) -> f64 {
        piece_kg * manufacturer.carbon_factor_kg_per_kg
    }

    fn score(&self, pattern: &CuttingPattern, catalog: &Catalog) -> f64 {
        sum_weighted(pattern, catalog, |m| m.carbon_factor_kg_per_kg)
    }
}

// ==========================================
// CostObjective - 采购成本最小
// ==========================================
pub struct CostObjective;

impl Scorable for CostObjective {
    fn kind(&self) -> Objective {
        Objective::Cost
    }

    fn piece_cost(&self, _length_mm: i64, piece_kg: f64, manufacturer: &Manufacturer) -> f64 {
        piece_kg * manufacturer.unit_price_per_kg
    }

    fn score(&self, pattern: &CuttingPattern, catalog: &Catalog) -> f64 {
        sum_weighted(pattern, catalog, |m| m.unit_price_per_kg)
    }
}

/// Σ qty × 单根重量(kg) × 厂商系数
fn sum_weighted<F>(pattern: &CuttingPattern, catalog: &Catalog, factor: F) -> f64
where
    F: Fn(&Manufacturer) -> f64,
{
    pattern
        .line_items
        .iter()
        .map(|li| {
            let piece_kg = pattern.diameter.piece_tonnage(li.length_mm) * 1000.0;
            let f = catalog
                .manufacturer(&li.manufacturer_id)
                .map(&factor)
                .unwrap_or(0.0);
            li.quantity as f64 * piece_kg * f
        })
        .sum()
}
