// ==========================================
// 特殊定尺钢筋采购优化系统 - 捆包与批次生成器
// ==========================================
// 职责: 方案行数量映射回配筋符号 -> 物理捆包 -> 批次
// 红线: 捆包根数与方案行根数逐行守恒 (审计链
//       方案 -> 捆包 -> 订单, 根数不得凭空放大)
// 红线: 每个符号的根数恰好全覆盖一次; 方案未显式用
//       两种长度时, 符号不得被拆到两种定尺上
// 红线: 批次号经由修订作用域的 LotSequencer 发放 (单写者)
// ==========================================
// 分配规则: 符号按 (单根长度降序, 符号升序) 处理, 每符号优先
// 消耗"不短于单根长度的最短定尺"行 (余尺最小); 行间按长度台账
// 续供, 不足一根的尾量经搭接/套筒拼接跨行成根。行内根数按累计
// 消耗长度向上取整折算, 行富余根数 (聚合取整余量) 单列挂该行
// 最后服务的符号。容量不足以覆盖符号总长时直接报错。
// ==========================================

use crate::domain::bundle::{Bundle, Lot, LotSequencer};
use crate::domain::demand::BarMarkSpec;
use crate::domain::pattern::CuttingPattern;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// BundleGenerator - 捆包生成器
// ==========================================
pub struct BundleGenerator;

/// 单条分配记录 (方案行 × 符号)
#[derive(Debug, Clone)]
struct Allocation {
    item_idx: usize,
    bar_mark: String,
    pieces: u32,
    waste_per_piece_mm: f64,
}

/// 方案行长度台账
struct LineLedger {
    capacity_mm: i64,
    consumed_mm: i64,
    pieces_out: u32,
}

impl LineLedger {
    fn free_mm(&self) -> i64 {
        self.capacity_mm - self.consumed_mm
    }
}

impl BundleGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 把方案行切分为捆包并编批次
    ///
    /// # 参数
    /// - pattern: 单直径切割方案
    /// - bar_marks: 该直径的来源符号 (保序)
    /// - bundle_max_size: 单捆最大根数 (策略值)
    /// - sequencer: 修订作用域批次号发生器
    ///
    /// # 返回
    /// (捆包列表, 批次列表) - 捆包按 (长度升序) 赋切割顺序号
    #[instrument(skip(self, pattern, bar_marks, sequencer), fields(
        diameter = %pattern.diameter,
        line_items = pattern.line_items.len(),
        marks = bar_marks.len()
    ))]
    pub fn bundle(
        &self,
        pattern: &CuttingPattern,
        bar_marks: &[BarMarkSpec],
        bundle_max_size: u32,
        sequencer: &mut LotSequencer,
    ) -> EngineResult<(Vec<Bundle>, Vec<Lot>)> {
        if bundle_max_size == 0 {
            return Err(EngineError::InternalError(
                "bundle_max_size 不得为 0".to_string(),
            ));
        }

        let allocations = self.allocate(pattern, bar_marks)?;

        // 按方案行序 (长度升序) 生成捆包与批次
        let mut per_item: BTreeMap<usize, Vec<&Allocation>> = BTreeMap::new();
        for alloc in &allocations {
            per_item.entry(alloc.item_idx).or_default().push(alloc);
        }

        let mut bundles = Vec::new();
        let mut lots = Vec::new();
        let mut cutting_seq: u32 = 0;

        for (item_idx, item_allocs) in per_item {
            let li = &pattern.line_items[item_idx];
            let lot_no = sequencer.next_lot_no(pattern.diameter);
            let mut lot_bundle_ids = Vec::new();
            let mut bundle_in_lot: u32 = 0;

            for alloc in item_allocs {
                let mut remaining = alloc.pieces;
                while remaining > 0 {
                    let qty = remaining.min(bundle_max_size);
                    bundle_in_lot += 1;
                    cutting_seq += 1;
                    let bundle_id = format!("{}-B{:02}", lot_no, bundle_in_lot);
                    lot_bundle_ids.push(bundle_id.clone());
                    bundles.push(Bundle {
                        bundle_id,
                        bar_mark: alloc.bar_mark.clone(),
                        diameter: pattern.diameter,
                        length_mm: li.length_mm,
                        manufacturer_id: li.manufacturer_id.clone(),
                        quantity: qty,
                        bundle_size: bundle_max_size,
                        waste_per_piece_mm: alloc.waste_per_piece_mm,
                        cutting_sequence_index: cutting_seq,
                        lot_no: lot_no.clone(),
                    });
                    remaining -= qty;
                }
            }

            lots.push(Lot {
                lot_no,
                diameter: pattern.diameter,
                length_mm: li.length_mm,
                bundle_ids: lot_bundle_ids,
            });
        }

        Ok((bundles, lots))
    }

    /// 把方案行根数按长度台账分配到符号
    ///
    /// 不变量: 每行分配根数之和 (含富余) == 该行方案根数
    fn allocate(
        &self,
        pattern: &CuttingPattern,
        bar_marks: &[BarMarkSpec],
    ) -> EngineResult<Vec<Allocation>> {
        let mut ledger: Vec<LineLedger> = pattern
            .line_items
            .iter()
            .map(|li| LineLedger {
                capacity_mm: li.length_mm * i64::from(li.quantity),
                consumed_mm: 0,
                pieces_out: 0,
            })
            .collect();
        let mut allocations: Vec<Allocation> = Vec::new();

        // 无符号明细 (纯聚合需求): 整行直转捆包, 余尺取方案聚合值
        if bar_marks.is_empty() {
            for (idx, li) in pattern.line_items.iter().enumerate() {
                if li.quantity > 0 {
                    allocations.push(Allocation {
                        item_idx: idx,
                        bar_mark: "-".to_string(),
                        pieces: li.quantity,
                        waste_per_piece_mm: li.waste_per_piece_mm,
                    });
                }
            }
            return Ok(allocations);
        }

        // 符号按 (单根长度降序, 符号升序) 稳定处理
        let mut marks: Vec<&BarMarkSpec> = bar_marks.iter().collect();
        marks.sort_by(|a, b| {
            (b.unit_length_mm, a.bar_mark.as_str()).cmp(&(a.unit_length_mm, b.bar_mark.as_str()))
        });

        for mark in marks {
            let mut need_mm = mark.unit_length_mm * i64::from(mark.count);
            while need_mm > 0 {
                let Some(item_idx) = self.pick_item(pattern, &ledger, mark.unit_length_mm) else {
                    return Err(EngineError::InternalError(format!(
                        "方案容量不足以覆盖符号 {} 的剩余 {}mm",
                        mark.bar_mark, need_mm
                    )));
                };

                let li = &pattern.line_items[item_idx];
                let led = &mut ledger[item_idx];
                let take = led.free_mm().min(need_mm);
                led.consumed_mm += take;
                need_mm -= take;

                // 行内根数随累计消耗长度向上取整推进
                let pieces = pieces_for(led.consumed_mm, li.length_mm) - led.pieces_out;
                led.pieces_out += pieces;
                if pieces == 0 {
                    // 尾量只填了上一符号末根的余尺, 不新增根
                    continue;
                }
                allocations.push(Allocation {
                    item_idx,
                    bar_mark: mark.bar_mark.clone(),
                    pieces,
                    waste_per_piece_mm: (li.length_mm - mark.unit_length_mm).max(0) as f64,
                });
            }
        }

        // 行富余根数 (聚合取整余量) 单列挂该行最后服务的符号,
        // 余尺为未消耗长度均摊
        for (idx, led) in ledger.iter().enumerate() {
            let li = &pattern.line_items[idx];
            let surplus = li.quantity - led.pieces_out;
            if surplus == 0 {
                continue;
            }
            let mark = allocations
                .iter()
                .rev()
                .find(|a| a.item_idx == idx)
                .map(|a| a.bar_mark.clone())
                .or_else(|| allocations.last().map(|a| a.bar_mark.clone()))
                .unwrap_or_else(|| "-".to_string());
            allocations.push(Allocation {
                item_idx: idx,
                bar_mark: mark,
                pieces: surplus,
                waste_per_piece_mm: led.free_mm() as f64 / f64::from(surplus),
            });
        }

        Ok(allocations)
    }

    /// 选择分配目标行: 不短于单根长度且有余量的最短定尺优先;
    /// 无足长行时选最长行 (拼接段数最少)
    fn pick_item(
        &self,
        pattern: &CuttingPattern,
        ledger: &[LineLedger],
        unit_length_mm: i64,
    ) -> Option<usize> {
        let fit = pattern
            .line_items
            .iter()
            .enumerate()
            .filter(|(i, li)| ledger[*i].free_mm() > 0 && li.length_mm >= unit_length_mm)
            .min_by_key(|(_, li)| (li.length_mm, li.manufacturer_id.clone()));
        if let Some((i, _)) = fit {
            return Some(i);
        }
        pattern
            .line_items
            .iter()
            .enumerate()
            .filter(|(i, _)| ledger[*i].free_mm() > 0)
            .max_by_key(|(_, li)| (li.length_mm, std::cmp::Reverse(li.manufacturer_id.clone())))
            .map(|(i, _)| i)
    }
}

impl Default for BundleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 累计消耗长度折算的占用根数 (向上取整)
fn pieces_for(consumed_mm: i64, length_mm: i64) -> u32 {
    ((consumed_mm + length_mm - 1) / length_mm) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pattern::PatternLineItem;
    use crate::domain::types::{Diameter, Objective};

    fn mark(bar_mark: &str, unit_length_mm: i64, count: u32) -> BarMarkSpec {
        BarMarkSpec {
            bar_mark: bar_mark.to_string(),
            diameter: Diameter::D25,
            unit_length_mm,
            count,
            required_date: None,
        }
    }

    fn pattern(items: Vec<(&str, i64, u32)>) -> CuttingPattern {
        let line_items: Vec<PatternLineItem> = items
            .into_iter()
            .map(|(m, len, qty)| PatternLineItem {
                manufacturer_id: m.to_string(),
                length_mm: len,
                quantity: qty,
                waste_per_piece_mm: 0.0,
            })
            .collect();
        let required: i64 = line_items.iter().map(|li| li.supplied_length_mm()).sum();
        CuttingPattern {
            diameter: Diameter::D25,
            objective: Objective::Rcw,
            required_length_mm: required,
            line_items,
            objective_score: 0.0,
        }
    }

    #[test]
    fn test_single_mark_single_item_split_into_bundles() {
        let p = pattern(vec![("M-A", 10_800, 120)]);
        let marks = vec![mark("B-01", 10_800, 120)];
        let mut seq = LotSequencer::new("PJ001");
        let (bundles, lots) = BundleGenerator::new()
            .bundle(&p, &marks, 50, &mut seq)
            .unwrap();

        assert_eq!(bundles.len(), 3); // 50 + 50 + 20
        assert_eq!(bundles[0].quantity, 50);
        assert_eq!(bundles[2].quantity, 20);
        let total: u32 = bundles.iter().map(|b| b.quantity).sum();
        assert_eq!(total, 120);
        assert!(bundles.iter().all(|b| b.bar_mark == "B-01"));
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].bundle_ids.len(), 3);
        assert_eq!(lots[0].lot_no, "PJ001-D25-L0001");
    }

    #[test]
    fn test_mark_not_split_when_one_length_suffices() {
        // 两行定尺, 每个符号整配到"不短于单根长度的最短行"
        let p = pattern(vec![("M-A", 9_000, 10), ("M-A", 11_000, 10)]);
        let marks = vec![mark("B-01", 8_800, 10), mark("B-02", 10_700, 10)];
        let mut seq = LotSequencer::new("PJ001");
        let (bundles, _) = BundleGenerator::new()
            .bundle(&p, &marks, 50, &mut seq)
            .unwrap();

        for b in &bundles {
            match b.bar_mark.as_str() {
                "B-01" => assert_eq!(b.length_mm, 9_000),
                "B-02" => assert_eq!(b.length_mm, 11_000),
                other => panic!("未知符号: {}", other),
            }
        }
    }

    #[test]
    fn test_cutting_sequence_ascending_by_length() {
        let p = pattern(vec![("M-A", 9_000, 60), ("M-A", 11_000, 10)]);
        let marks = vec![mark("B-01", 8_800, 60), mark("B-02", 10_700, 10)];
        let mut seq = LotSequencer::new("PJ001");
        let (bundles, _) = BundleGenerator::new()
            .bundle(&p, &marks, 50, &mut seq)
            .unwrap();

        let mut sorted = bundles.clone();
        sorted.sort_by_key(|b| b.cutting_sequence_index);
        // 序号升序与长度升序一致
        for w in sorted.windows(2) {
            assert!(w[0].length_mm <= w[1].length_mm);
            assert_eq!(w[0].cutting_sequence_index + 1, w[1].cutting_sequence_index);
        }
    }

    #[test]
    fn test_splice_when_mark_longer_than_any_stock() {
        // 13m 符号无足长定尺: 按长度台账跨根拼接, 52m 占 8 根 7m
        let p = pattern(vec![("M-A", 7_000, 8)]);
        let marks = vec![mark("B-01", 13_000, 4)];
        let mut seq = LotSequencer::new("PJ001");
        let (bundles, _) = BundleGenerator::new()
            .bundle(&p, &marks, 50, &mut seq)
            .unwrap();

        let total: u32 = bundles.iter().map(|b| b.quantity).sum();
        assert_eq!(total, 8);
        assert!(bundles.iter().all(|b| b.bar_mark == "B-01"));
    }

    #[test]
    fn test_surplus_pieces_attach_to_last_served_mark() {
        // 行容量 12, 符号只需 10 根 -> 余 2 根挂同符号, 整件计余尺
        let p = pattern(vec![("M-A", 10_800, 12)]);
        let marks = vec![mark("B-01", 10_800, 10)];
        let mut seq = LotSequencer::new("PJ001");
        let (bundles, _) = BundleGenerator::new()
            .bundle(&p, &marks, 50, &mut seq)
            .unwrap();

        let total: u32 = bundles.iter().map(|b| b.quantity).sum();
        assert_eq!(total, 12);
        assert!(bundles.iter().all(|b| b.bar_mark == "B-01"));
        let surplus = bundles.iter().find(|b| b.quantity == 2).unwrap();
        assert!((surplus.waste_per_piece_mm - 10_800.0).abs() < 1e-9);
    }

    #[test]
    fn test_bundle_quantities_conserve_pattern_quantities() {
        // 符号根数 (140) 多于方案根数 (123): 短符号经台账跨根续供,
        // 捆包根数仍与方案行逐行一致
        let p = pattern(vec![("M-A", 10_500, 106), ("M-B", 11_000, 17)]);
        let marks = vec![mark("B-01", 10_400, 100), mark("B-02", 6_500, 40)];
        let mut seq = LotSequencer::new("PJ001");
        let (bundles, _) = BundleGenerator::new()
            .bundle(&p, &marks, 50, &mut seq)
            .unwrap();

        let total: u32 = bundles.iter().map(|b| b.quantity).sum();
        assert_eq!(total, 123);
        let on_10500: u32 = bundles
            .iter()
            .filter(|b| b.length_mm == 10_500)
            .map(|b| b.quantity)
            .sum();
        let on_11000: u32 = bundles
            .iter()
            .filter(|b| b.length_mm == 11_000)
            .map(|b| b.quantity)
            .sum();
        assert_eq!(on_10500, 106);
        assert_eq!(on_11000, 17);
        // 两个符号都出现在捆包里
        assert!(bundles.iter().any(|b| b.bar_mark == "B-01"));
        assert!(bundles.iter().any(|b| b.bar_mark == "B-02"));
    }

    #[test]
    fn test_waste_per_piece_is_stock_minus_unit() {
        // 余尺 = 所配定尺长度 - 符号单根长度 (非行聚合均值)
        let p = pattern(vec![("M-A", 10_500, 106), ("M-B", 11_000, 17)]);
        let marks = vec![mark("B-01", 10_400, 100), mark("B-02", 6_500, 40)];
        let mut seq = LotSequencer::new("PJ001");
        let (bundles, _) = BundleGenerator::new()
            .bundle(&p, &marks, 50, &mut seq)
            .unwrap();

        for b in &bundles {
            let expected = match (b.bar_mark.as_str(), b.length_mm) {
                ("B-01", 10_500) => 100.0,
                ("B-02", 10_500) => 4_000.0,
                ("B-02", 11_000) => 4_500.0,
                other => panic!("未预期的捆包: {:?}", other),
            };
            assert!((b.waste_per_piece_mm - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_capacity_shortfall_is_an_error() {
        // 符号总长超出方案容量: 报错而非虚增根数
        let p = pattern(vec![("M-A", 10_500, 1)]);
        let marks = vec![mark("B-01", 10_400, 5)];
        let mut seq = LotSequencer::new("PJ001");
        let res = BundleGenerator::new().bundle(&p, &marks, 50, &mut seq);
        assert!(matches!(res, Err(EngineError::InternalError(_))));
    }
}
