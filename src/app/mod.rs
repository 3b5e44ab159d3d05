// ==========================================
// 特殊定尺钢筋采购优化系统 - 应用层
// ==========================================
// 职责: 应用装配 (仓储/引擎/API 的依赖注入)
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
