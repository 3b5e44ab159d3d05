// ==========================================
// 特殊定尺钢筋采购优化系统 - 引擎层
// ==========================================
// 职责: 实现优化/捆包/排程业务规则, 不拼 SQL
// 红线: 引擎为纯计算, 不读时钟不做 I/O; 规则拒绝必须输出原因
// ==========================================

pub mod aggregator;
pub mod bundler;
pub mod error;
pub mod metrics;
pub mod objective;
pub mod optimizer;
pub mod orchestrator;
pub mod scheduler;
pub mod validator;

// 重导出核心引擎
pub use aggregator::DemandAggregator;
pub use bundler::BundleGenerator;
pub use error::{EngineError, EngineResult};
pub use metrics::MetricsEngine;
pub use objective::{scorable_for, Co2Objective, CostObjective, RcwObjective, Scorable};
pub use optimizer::CuttingPatternOptimizer;
pub use orchestrator::{OptimizationOrchestrator, OptimizationRequest};
pub use scheduler::ProcurementScheduler;
pub use validator::CatalogValidator;
