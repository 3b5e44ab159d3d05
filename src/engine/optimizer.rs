// ==========================================
// 特殊定尺钢筋采购优化系统 - 切割方案优化器
// ==========================================
// 职责: 单直径需求 -> 覆盖型一维下料的精确 DP 求解
// 输入: DemandItem + 校验后候选目录行 + 目标 (Scorable)
// 输出: CuttingPattern 或 Infeasible
// 红线: 纯计算 - 不读时钟不读共享可变状态, 同输入同输出
// 红线: 精确解而非启发式; 平手规则每次执行完全一致
// ==========================================
// 算法: 覆盖型 coin-change DP。状态 dp[v] = 覆盖至少 v 个
// 网格单位 (10mm) 的最小累积代价, 转移 dp[v] = min_i
// dp[max(0, v - len_i)] + piece_cost_i, 末根允许越过 0 (超覆盖)。
// 平手规则: (1) 使用的相异长度更少 (2) 长度向量字典序最小 -
// 通过按基数递增、字典序枚举候选子集并复核最优值实现;
// 状态内平手保留正准序更小的候选, 使重构出的数量向量字典序最小。
// ==========================================

use crate::domain::catalog::{Catalog, StockLength};
use crate::domain::demand::DemandItem;
use crate::domain::pattern::{CuttingPattern, PatternLineItem};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::objective::Scorable;
use tracing::{debug, instrument};

/// DP 网格单位 (毫米) - 与目录粒度一致
const GRID_MM: i64 = 10;

/// 目标值平手判定的相对容差
const SCORE_EPS: f64 = 1e-9;

// ==========================================
// Candidate - 优化器内部候选 (厂商 × 长度)
// ==========================================
#[derive(Debug, Clone)]
struct Candidate {
    manufacturer_id: String,
    length_mm: i64,
    len_units: usize,
    piece_cost: f64,
    piece_tonnage: f64,
    min_order_tonnage: f64,
}

// ==========================================
// CuttingPatternOptimizer - 切割方案优化器
// ==========================================
pub struct CuttingPatternOptimizer;

impl CuttingPatternOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// 求解单直径切割方案
    ///
    /// # 参数
    /// - demand: 聚合后的单直径需求
    /// - rows: 已通过校验的候选目录行 (Validator 前置执行)
    /// - catalog: 目录快照 (厂商系数查询)
    /// - scorable: 优化目标
    ///
    /// # 返回
    /// 覆盖需求且目标值最优的方案; 无可行组合时 Infeasible
    #[instrument(skip(self, demand, rows, catalog, scorable), fields(
        diameter = %demand.diameter,
        required_mm = demand.required_length_mm,
        objective = %scorable.kind(),
        candidates = rows.len()
    ))]
    pub fn optimize(
        &self,
        demand: &DemandItem,
        rows: &[&StockLength],
        catalog: &Catalog,
        scorable: &dyn Scorable,
    ) -> EngineResult<CuttingPattern> {
        if rows.is_empty() {
            return Err(EngineError::NoCandidates {
                diameter: demand.diameter,
            });
        }

        let mut candidates = self.build_candidates(demand, rows, catalog, scorable)?;

        // 需求为零: 空方案 (覆盖约束平凡成立)
        if demand.required_length_mm <= 0 {
            return Ok(self.build_pattern(demand, catalog, scorable, &[], &[]));
        }

        let r_units = div_ceil(demand.required_length_mm, GRID_MM) as usize;

        // 最小起订后置过滤循环: 剔除被选中但不足起订量的
        // 厂商/长度对, 重跑 DP, 候选集严格缩小保证终止
        loop {
            if candidates.is_empty() {
                return Err(EngineError::Infeasible {
                    diameter: demand.diameter,
                    reason: "最小起订过滤后候选集为空, 无任何厂商组合可行".to_string(),
                });
            }

            let counts = self.solve_with_tiebreaks(r_units, &candidates)?;

            let violators: Vec<usize> = candidates
                .iter()
                .enumerate()
                .filter(|(i, c)| {
                    let qty = counts[*i];
                    qty > 0 && (qty as f64) * c.piece_tonnage < c.min_order_tonnage
                })
                .map(|(i, _)| i)
                .collect();

            if violators.is_empty() {
                return Ok(self.build_pattern(demand, catalog, scorable, &candidates, &counts));
            }

            debug!(
                diameter = %demand.diameter,
                removed = violators.len(),
                "厂商/长度对不足最小起订, 剔除后重跑 DP"
            );
            for &i in violators.iter().rev() {
                candidates.remove(i);
            }
        }
    }

    /// 构建正准序候选集 (按 (length, manufacturer) 升序)
    fn build_candidates(
        &self,
        demand: &DemandItem,
        rows: &[&StockLength],
        catalog: &Catalog,
        scorable: &dyn Scorable,
    ) -> EngineResult<Vec<Candidate>> {
        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let manufacturer = catalog.manufacturer(&row.manufacturer_id).ok_or_else(|| {
                EngineError::UnknownManufacturer {
                    manufacturer_id: row.manufacturer_id.clone(),
                }
            })?;
            let piece_kg = demand.diameter.piece_tonnage(row.length_mm) * 1000.0;
            candidates.push(Candidate {
                manufacturer_id: row.manufacturer_id.clone(),
                length_mm: row.length_mm,
                len_units: (row.length_mm / GRID_MM) as usize,
                piece_cost: scorable.piece_cost(row.length_mm, piece_kg, manufacturer),
                piece_tonnage: row.diameter.piece_tonnage(row.length_mm),
                min_order_tonnage: row.min_order_tonnage,
            });
        }
        candidates.sort_by(|a, b| {
            (a.length_mm, a.manufacturer_id.as_str())
                .cmp(&(b.length_mm, b.manufacturer_id.as_str()))
        });
        Ok(candidates)
    }

    /// DP 求最优值 + 平手规则选择组合
    fn solve_with_tiebreaks(
        &self,
        r_units: usize,
        candidates: &[Candidate],
    ) -> EngineResult<Vec<u32>> {
        let all: Vec<usize> = (0..candidates.len()).collect();
        let (best_cost, full_counts) = self.dp_cover(r_units, candidates, &all)?;

        // 平手规则: 基数从小到大、同基数按字典序枚举候选子集,
        // 第一个复现最优值的子集给出 (相异长度最少, 长度向量最小)
        for k in 1..=candidates.len() {
            let mut found: Option<Vec<u32>> = None;
            for_each_combination(candidates.len(), k, &mut |subset| {
                if found.is_some() {
                    return;
                }
                if let Ok((cost, counts)) = self.dp_cover(r_units, candidates, subset) {
                    if approx_eq(cost, best_cost) {
                        // 实际用到的相异候选数不足 k 时, 更小子集已覆盖
                        let used = counts.iter().filter(|&&q| q > 0).count();
                        if used == k {
                            found = Some(counts);
                        }
                    }
                }
            });
            if let Some(counts) = found {
                return Ok(counts);
            }
        }

        // 兜底: 全集 DP 的重构结果 (理论不可达)
        Ok(full_counts)
    }

    /// 覆盖型 DP, 限定候选子集
    ///
    /// # 返回
    /// (最优累积代价, 与候选集对齐的数量向量)
    fn dp_cover(
        &self,
        r_units: usize,
        candidates: &[Candidate],
        subset: &[usize],
    ) -> EngineResult<(f64, Vec<u32>)> {
        let mut dp = vec![f64::INFINITY; r_units + 1];
        let mut choice = vec![usize::MAX; r_units + 1];
        dp[0] = 0.0;

        for v in 1..=r_units {
            // 正准序遍历: 严格小于才替换, 平手保留更小候选
            for &i in subset {
                let c = &candidates[i];
                let prev = v.saturating_sub(c.len_units);
                if dp[prev].is_finite() {
                    let cost = dp[prev] + c.piece_cost;
                    if cost < dp[v] {
                        dp[v] = cost;
                        choice[v] = i;
                    }
                }
            }
        }

        if !dp[r_units].is_finite() {
            return Err(EngineError::InternalError(
                "DP 终态不可达 (候选子集为空?)".to_string(),
            ));
        }

        let mut counts = vec![0u32; candidates.len()];
        let mut v = r_units;
        while v > 0 {
            let i = choice[v];
            if i == usize::MAX {
                return Err(EngineError::InternalError(format!(
                    "DP 回溯中断于状态 {}",
                    v
                )));
            }
            counts[i] += 1;
            v = v.saturating_sub(candidates[i].len_units);
        }

        Ok((dp[r_units], counts))
    }

    /// 数量向量 -> CuttingPattern (含余尺分摊与目标值)
    fn build_pattern(
        &self,
        demand: &DemandItem,
        catalog: &Catalog,
        scorable: &dyn Scorable,
        candidates: &[Candidate],
        counts: &[u32],
    ) -> CuttingPattern {
        // 行按正准序 (length, manufacturer) 升序
        let mut line_items: Vec<PatternLineItem> = candidates
            .iter()
            .zip(counts.iter())
            .filter(|(_, &qty)| qty > 0)
            .map(|(c, &qty)| PatternLineItem {
                manufacturer_id: c.manufacturer_id.clone(),
                length_mm: c.length_mm,
                quantity: qty,
                waste_per_piece_mm: 0.0,
            })
            .collect();

        // 余尺分摊: 长行优先吸收需求, 尾部行承载聚合余量
        let mut remaining = demand.required_length_mm;
        for li in line_items.iter_mut().rev() {
            let supplied = li.supplied_length_mm();
            let covered = remaining.min(supplied);
            li.waste_per_piece_mm = (supplied - covered) as f64 / li.quantity as f64;
            remaining -= covered;
        }

        let mut pattern = CuttingPattern {
            diameter: demand.diameter,
            objective: scorable.kind(),
            required_length_mm: demand.required_length_mm,
            line_items,
            objective_score: 0.0,
        };
        pattern.objective_score = scorable.score(&pattern, catalog);
        pattern
    }
}

impl Default for CuttingPatternOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// 向上取整除法 (覆盖约束在网格上保守取整)
fn div_ceil(a: i64, b: i64) -> i64 {
    (a + b - 1) / b
}

/// 相对容差平手判定
fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= SCORE_EPS * a.abs().max(b.abs()).max(1.0)
}

/// 按字典序枚举 n 选 k 组合 (索引升序)
fn for_each_combination<F: FnMut(&[usize])>(n: usize, k: usize, f: &mut F) {
    if k == 0 || k > n {
        return;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        f(&idx);
        // 自右向左找可递增位
        let mut i = k;
        while i > 0 && idx[i - 1] == i - 1 + n - k {
            i -= 1;
        }
        if i == 0 {
            return;
        }
        idx[i - 1] += 1;
        for j in i..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_each_combination_lexicographic() {
        let mut seen = Vec::new();
        for_each_combination(4, 2, &mut |c| seen.push(c.to_vec()));
        assert_eq!(
            seen,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
    }

    #[test]
    fn test_for_each_combination_full_and_empty() {
        let mut seen = Vec::new();
        for_each_combination(3, 3, &mut |c| seen.push(c.to_vec()));
        assert_eq!(seen, vec![vec![0, 1, 2]]);

        let mut none = Vec::new();
        for_each_combination(3, 0, &mut |c| none.push(c.to_vec()));
        assert!(none.is_empty());
    }

    #[test]
    fn test_div_ceil() {
        assert_eq!(div_ceil(100, 10), 10);
        assert_eq!(div_ceil(101, 10), 11);
        assert_eq!(div_ceil(109, 10), 11);
    }

    #[test]
    fn test_approx_eq_relative() {
        assert!(approx_eq(1_000_000.0, 1_000_000.0 + 1e-5));
        assert!(!approx_eq(1.0, 1.001));
    }
}
