// ==========================================
// 特殊定尺钢筋采购优化系统 - 切割方案实体
// ==========================================
// 职责: 优化器输出的按直径切割方案与指标快照
// 不变量: Σ(length × quantity) >= required_length (覆盖约束)
// ==========================================

use crate::domain::types::{Diameter, Objective};
use serde::{Deserialize, Serialize};

// ==========================================
// PatternLineItem - 方案行 (定尺长度 × 数量)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternLineItem {
    pub manufacturer_id: String, // 供应厂商
    pub length_mm: i64,          // 定尺长度 (毫米)
    pub quantity: u32,           // 根数
    pub waste_per_piece_mm: f64, // 单根余尺 (毫米)
}

impl PatternLineItem {
    /// 行合计供给长度 (毫米)
    pub fn supplied_length_mm(&self) -> i64 {
        self.length_mm * self.quantity as i64
    }
}

// ==========================================
// CuttingPattern - 按直径切割方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingPattern {
    pub diameter: Diameter,              // 直径
    pub objective: Objective,            // 驱动目标
    pub required_length_mm: i64,         // 需求长度 (毫米)
    pub line_items: Vec<PatternLineItem>, // 方案行 (按 (length, manufacturer) 升序)
    pub objective_score: f64,            // 优化器自报的目标值
}

impl CuttingPattern {
    /// 合计供给长度 (毫米)
    pub fn total_supplied_mm(&self) -> i64 {
        self.line_items.iter().map(|li| li.supplied_length_mm()).sum()
    }

    /// 合计余尺 (毫米)
    pub fn total_waste_mm(&self) -> i64 {
        self.total_supplied_mm() - self.required_length_mm
    }

    /// 合计供给重量 (吨)
    pub fn total_supplied_tonnage(&self) -> f64 {
        self.diameter.piece_tonnage(self.total_supplied_mm())
    }

    /// 某厂商/长度对的分配吨位 (最小起订校验用)
    pub fn pair_tonnage(&self, manufacturer_id: &str, length_mm: i64) -> f64 {
        self.line_items
            .iter()
            .filter(|li| li.manufacturer_id == manufacturer_id && li.length_mm == length_mm)
            .map(|li| self.diameter.piece_tonnage(li.length_mm) * li.quantity as f64)
            .sum()
    }

    /// 覆盖约束是否成立
    pub fn covers_demand(&self) -> bool {
        self.total_supplied_mm() >= self.required_length_mm
    }
}

// ==========================================
// PatternMetrics - 三指标快照 (Metrics Engine 输出)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternMetrics {
    pub rcw_pct: f64, // 余尺废料率 (%)
    pub co2_kg: f64,  // 碳排放 (kgCO2)
    pub cost: f64,    // 采购成本 (元)
}
