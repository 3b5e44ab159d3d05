// ==========================================
// 特殊定尺钢筋采购优化系统 - 需求聚合器
// ==========================================
// 职责: 配筋符号级需求 -> 按直径合计需要长度
// 红线: 按直径分组是可交换归约, 重复执行结果逐位一致
// ==========================================

use crate::domain::demand::{BarMarkSpec, DemandItem};
use crate::domain::types::Diameter;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// DemandAggregator - 需求聚合器
// ==========================================
pub struct DemandAggregator;

impl DemandAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 聚合全部配筋符号 -> 按直径需求列表 (直径升序)
    ///
    /// 说明: BTreeMap 归约保证与输入顺序无关; 同直径内
    /// 来源符号保持输入顺序 (捆包生成需要保持符号身份)。
    #[instrument(skip(self, bar_marks), fields(marks = bar_marks.len()))]
    pub fn aggregate(&self, bar_marks: &[BarMarkSpec]) -> Vec<DemandItem> {
        let mut grouped: BTreeMap<Diameter, Vec<BarMarkSpec>> = BTreeMap::new();
        for mark in bar_marks {
            grouped.entry(mark.diameter).or_default().push(mark.clone());
        }

        grouped
            .into_iter()
            .map(|(diameter, marks)| {
                let required_length_mm = marks.iter().map(|m| m.total_length_mm()).sum();
                DemandItem {
                    diameter,
                    required_length_mm,
                    source_bar_marks: marks,
                }
            })
            .collect()
    }

    /// 查询单直径需求; 无符号时返回 EmptyDemand
    pub fn demand_for(
        &self,
        bar_marks: &[BarMarkSpec],
        diameter: Diameter,
    ) -> EngineResult<DemandItem> {
        self.aggregate(bar_marks)
            .into_iter()
            .find(|d| d.diameter == diameter)
            .ok_or(EngineError::EmptyDemand { diameter })
    }
}

impl Default for DemandAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(bar_mark: &str, diameter: Diameter, unit_length_mm: i64, count: u32) -> BarMarkSpec {
        BarMarkSpec {
            bar_mark: bar_mark.to_string(),
            diameter,
            unit_length_mm,
            count,
            required_date: None,
        }
    }

    #[test]
    fn test_groups_by_diameter_and_sums() {
        let marks = vec![
            mark("B-01", Diameter::D25, 10_800, 10),
            mark("B-02", Diameter::D13, 7_500, 4),
            mark("B-03", Diameter::D25, 9_000, 2),
        ];
        let items = DemandAggregator::new().aggregate(&marks);

        assert_eq!(items.len(), 2);
        // 直径升序
        assert_eq!(items[0].diameter, Diameter::D13);
        assert_eq!(items[0].required_length_mm, 30_000);
        assert_eq!(items[1].diameter, Diameter::D25);
        assert_eq!(items[1].required_length_mm, 126_000);
        assert!(items.iter().all(|i| i.is_consistent()));
    }

    #[test]
    fn test_order_independent() {
        let a = vec![
            mark("B-01", Diameter::D25, 10_800, 10),
            mark("B-02", Diameter::D13, 7_500, 4),
        ];
        let b: Vec<BarMarkSpec> = a.iter().rev().cloned().collect();

        let agg = DemandAggregator::new();
        let items_a = agg.aggregate(&a);
        let items_b = agg.aggregate(&b);

        // 合计值逐位一致 (来源符号顺序随输入, 合计与分组不受影响)
        assert_eq!(items_a.len(), items_b.len());
        for (x, y) in items_a.iter().zip(items_b.iter()) {
            assert_eq!(x.diameter, y.diameter);
            assert_eq!(x.required_length_mm, y.required_length_mm);
        }
    }

    #[test]
    fn test_empty_demand_error() {
        let marks = vec![mark("B-01", Diameter::D25, 10_800, 10)];
        let err = DemandAggregator::new()
            .demand_for(&marks, Diameter::D32)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::EmptyDemand {
                diameter: Diameter::D32
            }
        ));
    }

    #[test]
    fn test_source_marks_preserved_in_input_order() {
        let marks = vec![
            mark("B-03", Diameter::D25, 9_000, 2),
            mark("B-01", Diameter::D25, 10_800, 10),
        ];
        let items = DemandAggregator::new().aggregate(&marks);
        let names: Vec<&str> = items[0]
            .source_bar_marks
            .iter()
            .map(|m| m.bar_mark.as_str())
            .collect();
        assert_eq!(names, vec!["B-03", "B-01"]);
    }
}
