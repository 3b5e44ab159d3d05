// ==========================================
// 特殊定尺钢筋采购优化系统 - 领域类型定义
// ==========================================
// 依据: JIS G 3112 异形钢筋规格 (公称直径/单位质量)
// 红线: 直径是优化单元, 切割方案不得跨直径混排
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 直径 (Diameter)
// ==========================================
// 公称直径标识 (D10..D51), 单位质量用于吨位换算
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Diameter {
    D10,
    D13,
    D16,
    D19,
    D22,
    D25,
    D29,
    D32,
    D35,
    D38,
    D41,
    D51,
}

impl Diameter {
    /// 全部直径 (升序, 用于确定性遍历)
    pub const ALL: [Diameter; 12] = [
        Diameter::D10,
        Diameter::D13,
        Diameter::D16,
        Diameter::D19,
        Diameter::D22,
        Diameter::D25,
        Diameter::D29,
        Diameter::D32,
        Diameter::D35,
        Diameter::D38,
        Diameter::D41,
        Diameter::D51,
    ];

    /// 单位质量 (kg/m, JIS G 3112)
    pub fn unit_mass_kg_per_m(&self) -> f64 {
        match self {
            Diameter::D10 => 0.560,
            Diameter::D13 => 0.995,
            Diameter::D16 => 1.56,
            Diameter::D19 => 2.25,
            Diameter::D22 => 3.04,
            Diameter::D25 => 3.98,
            Diameter::D29 => 5.04,
            Diameter::D32 => 6.23,
            Diameter::D35 => 7.51,
            Diameter::D38 => 8.95,
            Diameter::D41 => 10.5,
            Diameter::D51 => 15.9,
        }
    }

    /// 单根重量 (吨)
    ///
    /// # 参数
    /// - length_mm: 钢筋长度 (毫米)
    pub fn piece_tonnage(&self, length_mm: i64) -> f64 {
        (length_mm as f64 / 1000.0) * self.unit_mass_kg_per_m() / 1000.0
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diameter::D10 => "D10",
            Diameter::D13 => "D13",
            Diameter::D16 => "D16",
            Diameter::D19 => "D19",
            Diameter::D22 => "D22",
            Diameter::D25 => "D25",
            Diameter::D29 => "D29",
            Diameter::D32 => "D32",
            Diameter::D35 => "D35",
            Diameter::D38 => "D38",
            Diameter::D41 => "D41",
            Diameter::D51 => "D51",
        }
    }
}

impl fmt::Display for Diameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Diameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "D10" => Ok(Diameter::D10),
            "D13" => Ok(Diameter::D13),
            "D16" => Ok(Diameter::D16),
            "D19" => Ok(Diameter::D19),
            "D22" => Ok(Diameter::D22),
            "D25" => Ok(Diameter::D25),
            "D29" => Ok(Diameter::D29),
            "D32" => Ok(Diameter::D32),
            "D35" => Ok(Diameter::D35),
            "D38" => Ok(Diameter::D38),
            "D41" => Ok(Diameter::D41),
            "D51" => Ok(Diameter::D51),
            other => Err(format!("未知直径标识: {}", other)),
        }
    }
}

// ==========================================
// 优化目标 (Objective)
// ==========================================
// 红线: 目标可切换, DP 算法只写一次 (Scorable 抽象)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Objective {
    Rcw,  // 余尺废料率最小
    Co2,  // 碳排放最小
    Cost, // 采购成本最小
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Rcw => "RCW",
            Objective::Co2 => "CO2",
            Objective::Cost => "COST",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RCW" => Ok(Objective::Rcw),
            "CO2" => Ok(Objective::Co2),
            "COST" => Ok(Objective::Cost),
            other => Err(format!("未知优化目标: {}", other)),
        }
    }
}

impl Default for Objective {
    fn default() -> Self {
        Objective::Rcw
    }
}

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 依据: JIT 排程规则 - order_date 相对 today 的时间窗判定
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Planned, // 计划中
    Ordered, // 已下单
    AtRisk,  // 风险窗口内
    Delayed, // 已延误
}

impl OrderStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Planned => "PLANNED",
            OrderStatus::Ordered => "ORDERED",
            OrderStatus::AtRisk => "AT_RISK",
            OrderStatus::Delayed => "DELAYED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, String> {
        match s {
            "PLANNED" => Ok(OrderStatus::Planned),
            "ORDERED" => Ok(OrderStatus::Ordered),
            "AT_RISK" => Ok(OrderStatus::AtRisk),
            "DELAYED" => Ok(OrderStatus::Delayed),
            other => Err(format!("未知订单状态: {}", other)),
        }
    }

    /// 是否需要进入告警列表 (供 Alarm 协作方消费)
    pub fn is_alarm(&self) -> bool {
        matches!(self, OrderStatus::AtRisk | OrderStatus::Delayed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 修订版本状态 (Revision Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionStatus {
    Computing,  // 计算中
    Completed,  // 计算完成
    Superseded, // 被新修订取代 (保留审计历史)
}

impl RevisionStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RevisionStatus::Computing => "COMPUTING",
            RevisionStatus::Completed => "COMPLETED",
            RevisionStatus::Superseded => "SUPERSEDED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, String> {
        match s {
            "COMPUTING" => Ok(RevisionStatus::Computing),
            "COMPLETED" => Ok(RevisionStatus::Completed),
            "SUPERSEDED" => Ok(RevisionStatus::Superseded),
            other => Err(format!("未知修订状态: {}", other)),
        }
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
