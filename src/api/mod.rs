// ==========================================
// 特殊定尺钢筋采购优化系统 - API 层
// ==========================================
// 职责: 面向调用方的业务接口 (CLI / 上层服务)
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod export_api;
pub mod optimize_api;
pub mod procurement_api;

// 重导出核心类型
pub use catalog_api::CatalogApi;
pub use error::{ApiError, ApiResult};
pub use export_api::ExportApi;
pub use optimize_api::OptimizeApi;
pub use procurement_api::{DiameterMetricsRow, ProcurementApi};
