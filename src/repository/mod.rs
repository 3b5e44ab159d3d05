// ==========================================
// 特殊定尺钢筋采购优化系统 - 数据仓储层
// ==========================================
// 职责: SQLite 数据访问; 修订结果集表为追加型
// 红线: 修订历史只增不改 (审计要求)
// ==========================================

pub mod bar_mark_repo;
pub mod catalog_repo;
pub mod error;
pub mod order_repo;
pub mod pattern_repo;
pub mod revision_repo;

// 重导出核心类型
pub use bar_mark_repo::BarMarkRepository;
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::OrderRepository;
pub use pattern_repo::PatternRepository;
pub use revision_repo::RevisionRepository;

use crate::domain::types::Diameter;
use chrono::NaiveDate;
use std::str::FromStr;

/// 行内直径列解析 (TEXT -> Diameter)
pub(crate) fn parse_diameter(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Diameter> {
    let s: String = row.get(idx)?;
    Diameter::from_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

/// 行内日期列解析 (TEXT "%Y-%m-%d" -> NaiveDate)
pub(crate) fn parse_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

/// 日期列格式化 (NaiveDate -> TEXT)
pub(crate) fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
