// ==========================================
// 特殊定尺钢筋采购优化系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务不变量
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod bundle;
pub mod catalog;
pub mod demand;
pub mod order;
pub mod pattern;
pub mod revision;
pub mod types;

// 重导出核心类型
pub use bundle::{Bundle, Lot, LotSequencer};
pub use catalog::{Catalog, Manufacturer, Policy, StockLength, LENGTH_GRANULARITY_MM};
pub use demand::{BarMarkSpec, DemandItem};
pub use order::{InfeasibleOrder, ProcurementOrder, ScheduleOutcome};
pub use pattern::{CuttingPattern, PatternLineItem, PatternMetrics};
pub use revision::{DiameterOutcome, RevisionResultSet, RevisionSummary};
pub use types::{Diameter, Objective, OrderStatus, RevisionStatus};
