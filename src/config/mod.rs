// ==========================================
// 特殊定尺钢筋采购优化系统 - 配置层
// ==========================================
// 职责: 系统配置管理 (策略参数、优化目标默认值)
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

pub use config_manager::{config_keys, ConfigManager};
