// ==========================================
// 特殊定尺钢筋采购优化系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 采购决策支持系统 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配与入口支撑
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Diameter, Objective, OrderStatus, RevisionStatus};

// 领域实体
pub use domain::{
    BarMarkSpec, Bundle, Catalog, CuttingPattern, DemandItem, DiameterOutcome, InfeasibleOrder,
    Lot, Manufacturer, PatternMetrics, Policy, ProcurementOrder, RevisionResultSet,
    RevisionSummary, ScheduleOutcome, StockLength,
};

// 引擎
pub use engine::{
    BundleGenerator, CatalogValidator, CuttingPatternOptimizer, DemandAggregator, MetricsEngine,
    OptimizationOrchestrator, OptimizationRequest, ProcurementScheduler,
};

// API
pub use api::{CatalogApi, ExportApi, OptimizeApi, ProcurementApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "特殊定尺钢筋采购优化系统";
