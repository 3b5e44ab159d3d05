// ==========================================
// 特殊定尺钢筋采购优化系统 - 导入层
// ==========================================
// 职责: 目录/配筋表文件导入 (CSV/Excel)
// 流程: 解析 -> 字段映射 -> 数据质量校验 -> 落库
// ==========================================

pub mod bar_mark_importer;
pub mod catalog_importer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;

pub use bar_mark_importer::{BarMarkImportSource, BarMarkImportSummary, BarMarkImporter};
pub use catalog_importer::{CatalogImportSource, CatalogImportSummary, CatalogImporter};
pub use error::{ImportError, ImportResult};
pub use file_parser::UniversalFileParser;
