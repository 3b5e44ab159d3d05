// ==========================================
// 特殊定尺钢筋采购优化系统 - JIT 采购排程器
// ==========================================
// 职责: 捆包需求映射到时间轴, 按交货周期倒排下单日
// 规则: order_date = required_date - lead_time
//       order_date < today            -> Delayed (delay = today - order_date)
//       order_date <= today + 风险窗口 -> AtRisk
//       其余                           -> Planned
// 红线: 不可行订单显式标记返回 (PartialSchedule), 不得丢弃
// 红线: "today" 由调用方注入, 引擎不读壁钟
// ==========================================
// 供应商分配: 同 (直径, 定尺, 到货日) 的捆包汇总为一个下单
// 单元 (跨捆包吨位归约点); 先尝试在全部候选厂商间均分,
// 任一份额低于该厂商最小起订时收敛到最少厂商数 (单厂商),
// 平手按交货周期短者优先, 再按厂商ID升序。
// ==========================================

use crate::domain::bundle::Bundle;
use crate::domain::catalog::{Catalog, Policy, StockLength};
use crate::domain::order::{InfeasibleOrder, ProcurementOrder, ScheduleOutcome};
use crate::domain::types::{Diameter, OrderStatus};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::{instrument, warn};

// ==========================================
// ProcurementScheduler - JIT 采购排程器
// ==========================================
pub struct ProcurementScheduler;

impl ProcurementScheduler {
    pub fn new() -> Self {
        Self
    }

    /// 生成采购排程
    ///
    /// # 参数
    /// - bundles: 全部捆包 (跨直径)
    /// - catalog: 目录快照 (候选厂商与交货周期)
    /// - required_dates: 配筋符号 -> 要求到货日 (进度层供给)
    /// - today: 基准日 (调用方注入)
    /// - policy: 风险窗口等策略
    #[instrument(skip_all, fields(bundles = bundles.len(), today = %today))]
    pub fn schedule(
        &self,
        bundles: &[Bundle],
        catalog: &Catalog,
        required_dates: &HashMap<String, NaiveDate>,
        today: NaiveDate,
        policy: &Policy,
    ) -> ScheduleOutcome {
        let mut outcome = ScheduleOutcome::default();

        // 归约点: 同 (直径, 定尺, 到货日) 的捆包合并为下单单元
        let mut groups: BTreeMap<(Diameter, i64, NaiveDate), Vec<&Bundle>> = BTreeMap::new();
        for bundle in bundles {
            let Some(&required_date) = required_dates.get(&bundle.bar_mark) else {
                warn!(bundle_id = %bundle.bundle_id, bar_mark = %bundle.bar_mark, "缺少要求到货日");
                outcome.infeasible.push(InfeasibleOrder {
                    diameter: bundle.diameter,
                    length_mm: bundle.length_mm,
                    tonnage: bundle.tonnage(),
                    bundle_ids: vec![bundle.bundle_id.clone()],
                    required_date: today,
                    reason: format!("符号 {} 缺少要求到货日", bundle.bar_mark),
                });
                continue;
            };
            groups
                .entry((bundle.diameter, bundle.length_mm, required_date))
                .or_default()
                .push(bundle);
        }

        let mut order_seq: u32 = 0;
        for ((diameter, length_mm, required_date), group) in groups {
            self.schedule_group(
                diameter,
                length_mm,
                required_date,
                &group,
                catalog,
                today,
                policy,
                &mut order_seq,
                &mut outcome,
            );
        }

        outcome
    }

    /// 单个下单单元的供应商分配与状态判定
    #[allow(clippy::too_many_arguments)]
    fn schedule_group(
        &self,
        diameter: Diameter,
        length_mm: i64,
        required_date: NaiveDate,
        group: &[&Bundle],
        catalog: &Catalog,
        today: NaiveDate,
        policy: &Policy,
        order_seq: &mut u32,
        outcome: &mut ScheduleOutcome,
    ) {
        let total_qty: u32 = group.iter().map(|b| b.quantity).sum();
        let piece_t = diameter.piece_tonnage(length_mm);
        let total_t = piece_t * total_qty as f64;
        let bundle_ids: Vec<String> = group.iter().map(|b| b.bundle_id.clone()).collect();

        // 到货日已过: 零交货周期也不可达, 进不可行子集
        if required_date < today {
            outcome.infeasible.push(InfeasibleOrder {
                diameter,
                length_mm,
                tonnage: total_t,
                bundle_ids,
                required_date,
                reason: format!("要求到货日 {} 已早于基准日 {}", required_date, today),
            });
            return;
        }

        // 候选厂商: 目录中供应该 (直径, 定尺) 的行,
        // 按 (交货周期升序, 厂商ID升序) 确定性排序
        let mut suppliers: Vec<&StockLength> = catalog
            .stock_lengths
            .iter()
            .filter(|r| r.diameter == diameter && r.length_mm == length_mm)
            .collect();
        suppliers.sort_by(|a, b| {
            (a.min_lead_time_days, a.manufacturer_id.as_str())
                .cmp(&(b.min_lead_time_days, b.manufacturer_id.as_str()))
        });

        if suppliers.is_empty() {
            outcome.infeasible.push(InfeasibleOrder {
                diameter,
                length_mm,
                tonnage: total_t,
                bundle_ids,
                required_date,
                reason: format!("目录中无厂商供应 {} × {}mm", diameter, length_mm),
            });
            return;
        }

        // 先尝试全厂商均分 (每份额都满足各自最小起订才拆分)
        let splits = self.try_even_split(&suppliers, total_qty, piece_t);

        let assignments: Vec<(&StockLength, u32)> = match splits {
            Some(s) => s,
            None => {
                // 收敛到最少厂商数: 单厂商, 交货周期短者优先
                match suppliers
                    .iter()
                    .find(|s| total_t >= s.min_order_tonnage)
                {
                    Some(s) => vec![(*s, total_qty)],
                    None => {
                        outcome.infeasible.push(InfeasibleOrder {
                            diameter,
                            length_mm,
                            tonnage: total_t,
                            bundle_ids,
                            required_date,
                            reason: format!(
                                "合计 {:.3}t 低于所有厂商的最小起订吨位",
                                total_t
                            ),
                        });
                        return;
                    }
                }
            }
        };

        for (supplier, qty) in assignments {
            *order_seq += 1;
            let lead = supplier.min_lead_time_days;
            let order_date = required_date - Duration::days(lead);
            let delivery_date = order_date + Duration::days(lead);
            let (status, delay_days) = if order_date < today {
                (OrderStatus::Delayed, (today - order_date).num_days())
            } else if order_date <= today + Duration::days(policy.risk_window_days) {
                (OrderStatus::AtRisk, 0)
            } else {
                (OrderStatus::Planned, 0)
            };

            outcome.orders.push(ProcurementOrder {
                order_id: format!("PO-{:04}", order_seq),
                diameter,
                length_mm,
                supplier_id: supplier.manufacturer_id.clone(),
                quantity: qty,
                tonnage: piece_t * qty as f64,
                bundle_ids: bundle_ids.clone(),
                required_date,
                lead_time_days: lead,
                order_date,
                delivery_date,
                status,
                delay_days,
            });
        }
    }

    /// 全厂商均分尝试; 任一份额不足该厂商最小起订则放弃拆分
    fn try_even_split<'a>(
        &self,
        suppliers: &[&'a StockLength],
        total_qty: u32,
        piece_t: f64,
    ) -> Option<Vec<(&'a StockLength, u32)>> {
        let k = suppliers.len() as u32;
        if k <= 1 || total_qty < k {
            return None;
        }
        let base = total_qty / k;
        let remainder = total_qty % k;

        let mut splits = Vec::with_capacity(suppliers.len());
        for (i, supplier) in suppliers.iter().enumerate() {
            let qty = base + if (i as u32) < remainder { 1 } else { 0 };
            if (qty as f64) * piece_t < supplier.min_order_tonnage {
                return None;
            }
            splits.push((*supplier, qty));
        }
        Some(splits)
    }
}

impl Default for ProcurementScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Manufacturer;

    fn catalog(rows: Vec<(&str, i64, f64, i64)>) -> Catalog {
        Catalog {
            manufacturers: rows
                .iter()
                .map(|(id, _, _, lead)| Manufacturer {
                    manufacturer_id: id.to_string(),
                    name: id.to_string(),
                    carbon_factor_kg_per_kg: 0.8,
                    unit_price_per_kg: 0.1,
                    min_lead_time_days: *lead,
                })
                .collect(),
            stock_lengths: rows
                .into_iter()
                .map(|(id, len, min_t, lead)| StockLength {
                    manufacturer_id: id.to_string(),
                    diameter: Diameter::D25,
                    length_mm: len,
                    min_order_tonnage: min_t,
                    min_lead_time_days: lead,
                })
                .collect(),
        }
    }

    fn bundle(id: &str, bar_mark: &str, length_mm: i64, quantity: u32) -> Bundle {
        Bundle {
            bundle_id: id.to_string(),
            bar_mark: bar_mark.to_string(),
            diameter: Diameter::D25,
            length_mm,
            manufacturer_id: "M-A".to_string(),
            quantity,
            bundle_size: 50,
            waste_per_piece_mm: 0.0,
            cutting_sequence_index: 1,
            lot_no: "PJ001-D25-L0001".to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_delayed_order_example() {
        // required 2025-03-18, lead 14 天, today 2025-03-10
        // -> order_date 2025-03-04 < today -> Delayed, delay 6 天
        let cat = catalog(vec![("M-A", 10_800, 0.1, 14)]);
        let bundles = vec![bundle("BD-1", "B-01", 10_800, 50)];
        let mut dates = HashMap::new();
        dates.insert("B-01".to_string(), date(2025, 3, 18));

        let outcome = ProcurementScheduler::new().schedule(
            &bundles,
            &cat,
            &dates,
            date(2025, 3, 10),
            &Policy::default(),
        );

        assert_eq!(outcome.orders.len(), 1);
        let order = &outcome.orders[0];
        assert_eq!(order.order_date, date(2025, 3, 4));
        assert_eq!(order.delivery_date, date(2025, 3, 18));
        assert_eq!(order.status, OrderStatus::Delayed);
        assert_eq!(order.delay_days, 6);
        assert!(order.dates_consistent());
    }

    #[test]
    fn test_at_risk_within_window() {
        // order_date = today + 5, 风险窗口 7 天 -> AtRisk
        let cat = catalog(vec![("M-A", 10_800, 0.1, 14)]);
        let bundles = vec![bundle("BD-1", "B-01", 10_800, 50)];
        let mut dates = HashMap::new();
        dates.insert("B-01".to_string(), date(2025, 3, 29));

        let outcome = ProcurementScheduler::new().schedule(
            &bundles,
            &cat,
            &dates,
            date(2025, 3, 10),
            &Policy::default(),
        );

        assert_eq!(outcome.orders[0].status, OrderStatus::AtRisk);
        assert_eq!(outcome.orders[0].delay_days, 0);
    }

    #[test]
    fn test_planned_outside_window() {
        let cat = catalog(vec![("M-A", 10_800, 0.1, 14)]);
        let bundles = vec![bundle("BD-1", "B-01", 10_800, 50)];
        let mut dates = HashMap::new();
        dates.insert("B-01".to_string(), date(2025, 6, 1));

        let outcome = ProcurementScheduler::new().schedule(
            &bundles,
            &cat,
            &dates,
            date(2025, 3, 10),
            &Policy::default(),
        );

        assert_eq!(outcome.orders[0].status, OrderStatus::Planned);
        assert!(outcome.alarms().is_empty());
    }

    #[test]
    fn test_split_across_suppliers_when_minimums_hold() {
        // 100 根 D25×10.8m ≈ 4.3t, 两厂商最小起订各 1t -> 均分
        let cat = catalog(vec![("M-A", 10_800, 1.0, 14), ("M-B", 10_800, 1.0, 10)]);
        let bundles = vec![bundle("BD-1", "B-01", 10_800, 100)];
        let mut dates = HashMap::new();
        dates.insert("B-01".to_string(), date(2025, 6, 1));

        let outcome = ProcurementScheduler::new().schedule(
            &bundles,
            &cat,
            &dates,
            date(2025, 3, 10),
            &Policy::default(),
        );

        assert_eq!(outcome.orders.len(), 2);
        let qty: u32 = outcome.orders.iter().map(|o| o.quantity).sum();
        assert_eq!(qty, 100);
        // 交货周期短者排前
        assert_eq!(outcome.orders[0].supplier_id, "M-B");
    }

    #[test]
    fn test_consolidates_when_split_violates_minimum() {
        // 50 根 ≈ 2.15t; 均分后各 ~1.07t < M-A 最小起订 2t -> 收敛单厂商
        // 单厂商平手规则: 交货周期短者 (M-B, 10 天) 优先
        let cat = catalog(vec![("M-A", 10_800, 2.0, 14), ("M-B", 10_800, 2.0, 10)]);
        let bundles = vec![bundle("BD-1", "B-01", 10_800, 50)];
        let mut dates = HashMap::new();
        dates.insert("B-01".to_string(), date(2025, 6, 1));

        let outcome = ProcurementScheduler::new().schedule(
            &bundles,
            &cat,
            &dates,
            date(2025, 3, 10),
            &Policy::default(),
        );

        assert_eq!(outcome.orders.len(), 1);
        assert_eq!(outcome.orders[0].supplier_id, "M-B");
        assert_eq!(outcome.orders[0].quantity, 50);
    }

    #[test]
    fn test_infeasible_below_all_minimums_is_flagged_not_dropped() {
        let cat = catalog(vec![("M-A", 10_800, 40.0, 14)]);
        let bundles = vec![bundle("BD-1", "B-01", 10_800, 10)];
        let mut dates = HashMap::new();
        dates.insert("B-01".to_string(), date(2025, 6, 1));

        let outcome = ProcurementScheduler::new().schedule(
            &bundles,
            &cat,
            &dates,
            date(2025, 3, 10),
            &Policy::default(),
        );

        assert!(outcome.orders.is_empty());
        assert!(outcome.is_partial());
        assert_eq!(outcome.infeasible.len(), 1);
        assert!(outcome.infeasible[0].reason.contains("最小起订"));
    }

    #[test]
    fn test_required_date_in_past_goes_infeasible() {
        let cat = catalog(vec![("M-A", 10_800, 0.1, 14)]);
        let bundles = vec![bundle("BD-1", "B-01", 10_800, 10)];
        let mut dates = HashMap::new();
        dates.insert("B-01".to_string(), date(2025, 3, 1));

        let outcome = ProcurementScheduler::new().schedule(
            &bundles,
            &cat,
            &dates,
            date(2025, 3, 10),
            &Policy::default(),
        );

        assert!(outcome.orders.is_empty());
        assert_eq!(outcome.infeasible.len(), 1);
    }
}
