// ==========================================
// 特殊定尺钢筋采购优化系统 - 目录导入器
// ==========================================
// 职责: 厂商主数据与可订定尺长度的文件导入
// 流程: 解析 -> 字段映射 -> 数据质量校验 -> 落库 (UPSERT)
// ==========================================
// 列约定 (厂商文件):
//   manufacturer_id, name, carbon_factor_kg_per_kg,
//   unit_price_per_kg, min_lead_time_days
// 列约定 (定尺目录文件):
//   manufacturer_id, diameter, length_mm,
//   min_order_tonnage, min_lead_time_days
// ==========================================

use crate::domain::catalog::{Manufacturer, StockLength};
use crate::domain::types::Diameter;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{parse_f64, parse_i64, required};
use crate::importer::file_parser::UniversalFileParser;
use crate::repository::catalog_repo::CatalogRepository;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// 导入汇总
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CatalogImportSummary {
    pub manufacturers_imported: usize,
    pub stock_lengths_imported: usize,
    pub rows_skipped: usize, // 重复行 (保留首行)
}

// ==========================================
// CatalogImportSource Trait
// ==========================================
#[async_trait]
pub trait CatalogImportSource: Send + Sync {
    /// 导入厂商主数据 + 定尺目录 (两个文件)
    async fn import_catalog(
        &self,
        manufacturers_path: &Path,
        stock_lengths_path: &Path,
    ) -> ImportResult<CatalogImportSummary>;
}

// ==========================================
// CatalogImporter - 文件目录导入实现
// ==========================================
pub struct CatalogImporter {
    repo: Arc<CatalogRepository>,
}

impl CatalogImporter {
    pub fn new(repo: Arc<CatalogRepository>) -> Self {
        Self { repo }
    }

    fn map_manufacturer(
        row: &std::collections::HashMap<String, String>,
        row_no: usize,
    ) -> ImportResult<Manufacturer> {
        let manufacturer_id = required(row, row_no, "manufacturer_id")?;
        Ok(Manufacturer {
            name: required(row, row_no, "name")?,
            carbon_factor_kg_per_kg: parse_f64(row, row_no, "carbon_factor_kg_per_kg")?,
            unit_price_per_kg: parse_f64(row, row_no, "unit_price_per_kg")?,
            min_lead_time_days: parse_i64(row, row_no, "min_lead_time_days")?,
            manufacturer_id,
        })
    }

    fn map_stock_length(
        row: &std::collections::HashMap<String, String>,
        row_no: usize,
    ) -> ImportResult<StockLength> {
        let manufacturer_id = required(row, row_no, "manufacturer_id")?;
        let diameter_raw = required(row, row_no, "diameter")?;
        let diameter =
            Diameter::from_str(&diameter_raw).map_err(|e| ImportError::TypeConversionError {
                row: row_no,
                field: "diameter".to_string(),
                message: e,
            })?;

        Ok(StockLength {
            manufacturer_id,
            diameter,
            length_mm: parse_i64(row, row_no, "length_mm")?,
            min_order_tonnage: parse_f64(row, row_no, "min_order_tonnage")?,
            min_lead_time_days: parse_i64(row, row_no, "min_lead_time_days")?,
        })
    }
}

#[async_trait]
impl CatalogImportSource for CatalogImporter {
    #[instrument(skip(self))]
    async fn import_catalog(
        &self,
        manufacturers_path: &Path,
        stock_lengths_path: &Path,
    ) -> ImportResult<CatalogImportSummary> {
        let parser = UniversalFileParser;
        let mut summary = CatalogImportSummary::default();

        // ===== 厂商主数据 =====
        let rows = parser.parse(manufacturers_path)?;
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut manufacturers = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_no = idx + 2; // 表头占第 1 行
            let m = Self::map_manufacturer(row, row_no)?;
            if !seen_ids.insert(m.manufacturer_id.clone()) {
                warn!(row = row_no, manufacturer_id = %m.manufacturer_id, "重复厂商行, 保留首行");
                summary.rows_skipped += 1;
                continue;
            }
            manufacturers.push(m);
        }

        // ===== 定尺目录 =====
        let rows = parser.parse(stock_lengths_path)?;
        let mut seen_rows: HashSet<(String, Diameter, i64)> = HashSet::new();
        let mut stock_lengths = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_no = idx + 2;
            let sl = Self::map_stock_length(row, row_no)?;

            if !seen_ids.contains(&sl.manufacturer_id) {
                return Err(ImportError::UnknownManufacturerRef {
                    row: row_no,
                    manufacturer_id: sl.manufacturer_id,
                });
            }
            let key = (sl.manufacturer_id.clone(), sl.diameter, sl.length_mm);
            if !seen_rows.insert(key) {
                warn!(row = row_no, "重复目录行, 保留首行");
                summary.rows_skipped += 1;
                continue;
            }
            stock_lengths.push(sl);
        }

        // ===== 落库 (导入为全量替换) =====
        self.repo.clear()?;
        for m in &manufacturers {
            self.repo.upsert_manufacturer(m)?;
        }
        for sl in &stock_lengths {
            self.repo.upsert_stock_length(sl)?;
        }

        summary.manufacturers_imported = manufacturers.len();
        summary.stock_lengths_imported = stock_lengths.len();
        info!(
            manufacturers = summary.manufacturers_imported,
            stock_lengths = summary.stock_lengths_imported,
            skipped = summary.rows_skipped,
            "目录导入完成"
        );
        Ok(summary)
    }
}
