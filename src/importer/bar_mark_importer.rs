// ==========================================
// 特殊定尺钢筋采购优化系统 - 配筋表导入器
// ==========================================
// 职责: 设计/BIM 层配筋符号表的文件导入 (项目全量替换)
// ==========================================
// 列约定:
//   bar_mark, diameter, unit_length_mm, count, required_date (可空, YYYY-MM-DD)
// ==========================================

use crate::domain::demand::BarMarkSpec;
use crate::domain::types::Diameter;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{parse_optional_date, parse_u32, parse_i64, required};
use crate::importer::file_parser::UniversalFileParser;
use crate::repository::bar_mark_repo::BarMarkRepository;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// 导入汇总
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BarMarkImportSummary {
    pub marks_imported: usize,
    pub total_pieces: u64,
}

// ==========================================
// BarMarkImportSource Trait
// ==========================================
#[async_trait]
pub trait BarMarkImportSource: Send + Sync {
    /// 导入某项目的配筋符号表 (全量替换该项目现有数据)
    async fn import_bar_marks(
        &self,
        project_id: &str,
        path: &Path,
    ) -> ImportResult<BarMarkImportSummary>;
}

// ==========================================
// BarMarkImporter - 文件配筋表导入实现
// ==========================================
pub struct BarMarkImporter {
    repo: Arc<BarMarkRepository>,
}

impl BarMarkImporter {
    pub fn new(repo: Arc<BarMarkRepository>) -> Self {
        Self { repo }
    }

    fn map_bar_mark(
        row: &std::collections::HashMap<String, String>,
        row_no: usize,
    ) -> ImportResult<BarMarkSpec> {
        let bar_mark = required(row, row_no, "bar_mark")?;
        let diameter_raw = required(row, row_no, "diameter")?;
        let diameter =
            Diameter::from_str(&diameter_raw).map_err(|e| ImportError::TypeConversionError {
                row: row_no,
                field: "diameter".to_string(),
                message: e,
            })?;

        let unit_length_mm = parse_i64(row, row_no, "unit_length_mm")?;
        if unit_length_mm <= 0 {
            return Err(ImportError::TypeConversionError {
                row: row_no,
                field: "unit_length_mm".to_string(),
                message: format!("单根长度必须为正数, 实际 {}", unit_length_mm),
            });
        }

        Ok(BarMarkSpec {
            bar_mark,
            diameter,
            unit_length_mm,
            count: parse_u32(row, row_no, "count")?,
            required_date: parse_optional_date(row, row_no, "required_date")?,
        })
    }
}

#[async_trait]
impl BarMarkImportSource for BarMarkImporter {
    #[instrument(skip(self))]
    async fn import_bar_marks(
        &self,
        project_id: &str,
        path: &Path,
    ) -> ImportResult<BarMarkImportSummary> {
        let rows = UniversalFileParser.parse(path)?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut marks = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let row_no = idx + 2; // 表头占第 1 行
            let mark = Self::map_bar_mark(row, row_no)?;

            // 配筋符号在设计内唯一
            if !seen.insert(mark.bar_mark.clone()) {
                return Err(ImportError::DuplicateRecord {
                    row: row_no,
                    key: mark.bar_mark,
                });
            }
            marks.push(mark);
        }

        self.repo.replace_all(project_id, &marks)?;

        let summary = BarMarkImportSummary {
            marks_imported: marks.len(),
            total_pieces: marks.iter().map(|m| m.count as u64).sum(),
        };
        info!(
            project_id,
            marks = summary.marks_imported,
            pieces = summary.total_pieces,
            "配筋表导入完成"
        );
        Ok(summary)
    }
}
