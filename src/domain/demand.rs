// ==========================================
// 特殊定尺钢筋采购优化系统 - 需求实体
// ==========================================
// 职责: 配筋符号 (bar mark) 级需求与按直径聚合结果
// 不变量: DemandItem.required_length_mm == Σ(unit_length × count)
// ==========================================

use crate::domain::types::Diameter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// BarMarkSpec - 配筋符号规格 (设计/BIM 层供给)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarMarkSpec {
    pub bar_mark: String,                 // 配筋符号 (设计内唯一)
    pub diameter: Diameter,               // 直径
    pub unit_length_mm: i64,              // 单根长度 (毫米)
    pub count: u32,                       // 根数
    pub required_date: Option<NaiveDate>, // 工程进度要求到货日 (进度层供给)
}

impl BarMarkSpec {
    /// 该符号的合计长度 (毫米)
    pub fn total_length_mm(&self) -> i64 {
        self.unit_length_mm * self.count as i64
    }

    /// 该符号的合计重量 (吨)
    pub fn total_tonnage(&self) -> f64 {
        self.diameter.piece_tonnage(self.unit_length_mm) * self.count as f64
    }
}

// ==========================================
// DemandItem - 按直径聚合后的需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandItem {
    pub diameter: Diameter,              // 直径 (优化单元)
    pub required_length_mm: i64,         // 合计需要长度 (毫米)
    pub source_bar_marks: Vec<BarMarkSpec>, // 来源符号 (保序)
}

impl DemandItem {
    /// 合计需要重量 (吨)
    pub fn required_tonnage(&self) -> f64 {
        self.diameter.piece_tonnage(self.required_length_mm)
    }

    /// 不变量检查: Σ(unit_length × count) == required_length_mm
    pub fn is_consistent(&self) -> bool {
        let sum: i64 = self.source_bar_marks.iter().map(|m| m.total_length_mm()).sum();
        sum == self.required_length_mm
    }
}
