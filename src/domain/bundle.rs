// ==========================================
// 特殊定尺钢筋采购优化系统 - 加工捆包与批次实体
// ==========================================
// 职责: 切割方案行 -> 物理加工捆包 -> 批次 (Lot) 追溯
// 红线: 批次号确定性生成, 同一修订内严格递增
// ==========================================

use crate::domain::types::Diameter;
use serde::{Deserialize, Serialize};

// ==========================================
// Bundle - 加工捆包
// ==========================================
// 由方案行按 bundle_max_size 切分而来, 一捆只属一个配筋符号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub bundle_id: String,           // 捆包ID (修订内唯一)
    pub bar_mark: String,            // 配筋符号
    pub diameter: Diameter,          // 直径
    pub length_mm: i64,              // 定尺长度 (毫米)
    pub manufacturer_id: String,     // 供应厂商
    pub quantity: u32,               // 根数 (<= bundle_max_size)
    pub bundle_size: u32,            // 捆包上限 (策略值快照)
    pub waste_per_piece_mm: f64,     // 单根余尺 (毫米)
    pub cutting_sequence_index: u32, // 切割顺序 (按 (直径, 长度) 升序编号)
    pub lot_no: String,              // 所属批次号
}

impl Bundle {
    /// 捆包吨位
    pub fn tonnage(&self) -> f64 {
        self.diameter.piece_tonnage(self.length_mm) * self.quantity as f64
    }
}

// ==========================================
// Lot - 加工批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub lot_no: String,          // 批次号 f(project, diameter, seq)
    pub diameter: Diameter,      // 直径
    pub length_mm: i64,          // 定尺长度 (毫米)
    pub bundle_ids: Vec<String>, // 捆包ID集合
}

// ==========================================
// LotSequencer - 单写者批次号发生器 (修订内作用域)
// ==========================================
// 红线: 不做跨修订的全局单例; 每次优化运行重新创建
#[derive(Debug)]
pub struct LotSequencer {
    project_id: String,
    counter: u32,
}

impl LotSequencer {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            counter: 0,
        }
    }

    /// 发放下一个批次号 (确定性, 严格递增)
    pub fn next_lot_no(&mut self, diameter: Diameter) -> String {
        self.counter += 1;
        format!("{}-{}-L{:04}", self.project_id, diameter, self.counter)
    }

    /// 已发放数量
    pub fn issued(&self) -> u32 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_sequencer_is_deterministic_and_increasing() {
        let mut seq = LotSequencer::new("PJ001");
        assert_eq!(seq.next_lot_no(Diameter::D13), "PJ001-D13-L0001");
        assert_eq!(seq.next_lot_no(Diameter::D13), "PJ001-D13-L0002");
        assert_eq!(seq.next_lot_no(Diameter::D25), "PJ001-D25-L0003");
        assert_eq!(seq.issued(), 3);

        // 新修订重置计数器
        let mut seq2 = LotSequencer::new("PJ001");
        assert_eq!(seq2.next_lot_no(Diameter::D13), "PJ001-D13-L0001");
    }

    #[test]
    fn test_bundle_tonnage() {
        let bundle = Bundle {
            bundle_id: "BD-0001".to_string(),
            bar_mark: "B-01".to_string(),
            diameter: Diameter::D25,
            length_mm: 10_800,
            manufacturer_id: "M-A".to_string(),
            quantity: 50,
            bundle_size: 50,
            waste_per_piece_mm: 0.0,
            cutting_sequence_index: 1,
            lot_no: "PJ001-D25-L0001".to_string(),
        };
        // 50 × 10.8m × 3.98kg/m = 2.1492 t
        assert!((bundle.tonnage() - 2.1492).abs() < 1e-9);
    }
}
