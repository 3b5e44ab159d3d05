// ==========================================
// 特殊定尺钢筋采购优化系统 - 采购订单实体
// ==========================================
// 依据: JIT 排程规则 - order_date = required_date - lead_time
// 不变量: delivery_date == order_date + lead_time_days
// ==========================================

use crate::domain::types::{Diameter, OrderStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ProcurementOrder - 采购订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementOrder {
    pub order_id: String,          // 订单ID (修订内唯一)
    pub diameter: Diameter,        // 直径
    pub length_mm: i64,            // 定尺长度 (毫米)
    pub supplier_id: String,       // 供应厂商
    pub quantity: u32,             // 根数
    pub tonnage: f64,              // 订单吨位
    pub bundle_ids: Vec<String>,   // 覆盖的捆包
    pub required_date: NaiveDate,  // 要求到货日
    pub lead_time_days: i64,       // 交货周期 (天)
    pub order_date: NaiveDate,     // 应下单日
    pub delivery_date: NaiveDate,  // 预计到货日
    pub status: OrderStatus,       // 状态
    pub delay_days: i64,           // 延误天数 (Delayed 时 > 0)
}

impl ProcurementOrder {
    /// 日期不变量: delivery_date == order_date + lead_time_days
    pub fn dates_consistent(&self) -> bool {
        self.delivery_date == self.order_date + chrono::Duration::days(self.lead_time_days)
    }
}

// ==========================================
// InfeasibleOrder - 无法按期下单的需求 (显式标记, 不得丢弃)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfeasibleOrder {
    pub diameter: Diameter,       // 直径
    pub length_mm: i64,           // 定尺长度 (毫米)
    pub tonnage: f64,             // 未能落单的吨位
    pub bundle_ids: Vec<String>,  // 受影响捆包
    pub required_date: NaiveDate, // 要求到货日
    pub reason: String,           // 不可行原因 (可解释性)
}

// ==========================================
// ScheduleOutcome - 排程结果 (PartialSchedule 语义)
// ==========================================
// 红线: 不可行子集显式返回, 不因个别不可行而整体失败
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub orders: Vec<ProcurementOrder>,    // 可行订单 (含 AtRisk/Delayed)
    pub infeasible: Vec<InfeasibleOrder>, // 不可行子集
}

impl ScheduleOutcome {
    /// 是否为部分排程 (存在不可行子集)
    pub fn is_partial(&self) -> bool {
        !self.infeasible.is_empty()
    }

    /// 告警订单 (AtRisk/Delayed, 供 Alarm 协作方消费)
    pub fn alarms(&self) -> Vec<&ProcurementOrder> {
        self.orders.iter().filter(|o| o.status.is_alarm()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_dates_consistent() {
        let order = ProcurementOrder {
            order_id: "PO-0001".to_string(),
            diameter: Diameter::D25,
            length_mm: 10_800,
            supplier_id: "M-A".to_string(),
            quantity: 120,
            tonnage: 5.16,
            bundle_ids: vec![],
            required_date: NaiveDate::from_ymd_opt(2025, 3, 18).unwrap(),
            lead_time_days: 14,
            order_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            delivery_date: NaiveDate::from_ymd_opt(2025, 3, 18).unwrap(),
            status: OrderStatus::Delayed,
            delay_days: 6,
        };
        assert!(order.dates_consistent());
    }

    #[test]
    fn test_outcome_alarms_only_risky() {
        let planned = ProcurementOrder {
            order_id: "PO-0001".to_string(),
            diameter: Diameter::D13,
            length_mm: 9_000,
            supplier_id: "M-A".to_string(),
            quantity: 10,
            tonnage: 0.09,
            bundle_ids: vec![],
            required_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            lead_time_days: 7,
            order_date: NaiveDate::from_ymd_opt(2025, 5, 25).unwrap(),
            delivery_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            status: OrderStatus::Planned,
            delay_days: 0,
        };
        let mut risky = planned.clone();
        risky.order_id = "PO-0002".to_string();
        risky.status = OrderStatus::AtRisk;

        let outcome = ScheduleOutcome {
            orders: vec![planned, risky],
            infeasible: vec![],
        };
        let alarms = outcome.alarms();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].order_id, "PO-0002");
        assert!(!outcome.is_partial());
    }
}
