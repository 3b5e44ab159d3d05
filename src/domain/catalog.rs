// ==========================================
// 特殊定尺钢筋采购优化系统 - 目录与策略实体
// ==========================================
// 职责: 厂商主数据、可订定尺长度、全局长度策略
// 红线: Policy 为进程级只读快照, 加载一次不再变更
// ==========================================

use crate::domain::types::Diameter;
use serde::{Deserialize, Serialize};

/// 定尺长度分辨率 (毫米) - 目录粒度 1cm
pub const LENGTH_GRANULARITY_MM: i64 = 10;

// ==========================================
// Manufacturer - 厂商主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub manufacturer_id: String,      // 厂商ID
    pub name: String,                 // 厂商名称
    pub carbon_factor_kg_per_kg: f64, // 碳排放系数 (kgCO2/kg钢材)
    pub unit_price_per_kg: f64,       // 单价 (元/kg)
    pub min_lead_time_days: i64,      // 最短交货周期 (天)
}

// ==========================================
// StockLength - 可订定尺长度 (目录行)
// ==========================================
// 不变量: length_mm 必须为 10mm 粒度可表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLength {
    pub manufacturer_id: String, // 厂商ID
    pub diameter: Diameter,      // 直径
    pub length_mm: i64,          // 定尺长度 (毫米)
    pub min_order_tonnage: f64,  // 最小起订吨位 (吨)
    pub min_lead_time_days: i64, // 最短交货周期 (天)
}

impl StockLength {
    /// 长度是否满足目录粒度 (10mm)
    pub fn is_granular(&self) -> bool {
        self.length_mm % LENGTH_GRANULARITY_MM == 0
    }

    /// 单根重量 (吨)
    pub fn piece_tonnage(&self) -> f64 {
        self.diameter.piece_tonnage(self.length_mm)
    }
}

// ==========================================
// Policy - 全局长度策略
// ==========================================
// 依据: 特殊定尺可订范围 6.0m - 12.0m
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub min_usable_length_mm: i64, // 最小可用长度 (毫米)
    pub max_usable_length_mm: i64, // 最大可用长度 (毫米)
    pub risk_window_days: i64,     // 下单风险窗口 (天)
    pub bundle_max_size: u32,      // 单捆最大根数
}

impl Policy {
    /// 长度是否落在全局可用范围内
    pub fn contains(&self, length_mm: i64) -> bool {
        length_mm >= self.min_usable_length_mm && length_mm <= self.max_usable_length_mm
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_usable_length_mm: 6_000,
            max_usable_length_mm: 12_000,
            risk_window_days: 7,
            bundle_max_size: 50,
        }
    }
}

// ==========================================
// Catalog - 校验后目录快照 (只读, 按直径切片)
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub manufacturers: Vec<Manufacturer>, // 厂商主数据
    pub stock_lengths: Vec<StockLength>,  // 目录行
}

impl Catalog {
    /// 查询厂商
    pub fn manufacturer(&self, manufacturer_id: &str) -> Option<&Manufacturer> {
        self.manufacturers
            .iter()
            .find(|m| m.manufacturer_id == manufacturer_id)
    }

    /// 某直径的目录行 (按 (length, manufacturer) 升序, 保证确定性)
    pub fn rows_for(&self, diameter: Diameter) -> Vec<&StockLength> {
        let mut rows: Vec<&StockLength> = self
            .stock_lengths
            .iter()
            .filter(|r| r.diameter == diameter)
            .collect();
        rows.sort_by(|a, b| {
            (a.length_mm, a.manufacturer_id.as_str())
                .cmp(&(b.length_mm, b.manufacturer_id.as_str()))
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_contains() {
        let policy = Policy::default();
        assert!(policy.contains(6_000));
        assert!(policy.contains(12_000));
        assert!(!policy.contains(5_990));
        assert!(!policy.contains(12_010));
    }

    #[test]
    fn test_stock_length_granularity() {
        let mut row = StockLength {
            manufacturer_id: "M-A".to_string(),
            diameter: Diameter::D25,
            length_mm: 10_800,
            min_order_tonnage: 1.0,
            min_lead_time_days: 14,
        };
        assert!(row.is_granular());
        row.length_mm = 10_805;
        assert!(!row.is_granular());
    }

    #[test]
    fn test_catalog_rows_sorted() {
        let catalog = Catalog {
            manufacturers: vec![],
            stock_lengths: vec![
                StockLength {
                    manufacturer_id: "M-B".to_string(),
                    diameter: Diameter::D25,
                    length_mm: 11_000,
                    min_order_tonnage: 1.0,
                    min_lead_time_days: 10,
                },
                StockLength {
                    manufacturer_id: "M-A".to_string(),
                    diameter: Diameter::D25,
                    length_mm: 10_500,
                    min_order_tonnage: 1.0,
                    min_lead_time_days: 14,
                },
                StockLength {
                    manufacturer_id: "M-A".to_string(),
                    diameter: Diameter::D13,
                    length_mm: 9_000,
                    min_order_tonnage: 1.0,
                    min_lead_time_days: 14,
                },
            ],
        };

        let rows = catalog.rows_for(Diameter::D25);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].length_mm, 10_500);
        assert_eq!(rows[1].length_mm, 11_000);
    }
}
