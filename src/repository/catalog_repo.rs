// ==========================================
// 特殊定尺钢筋采购优化系统 - 目录仓储
// ==========================================
// 职责: 厂商主数据与可订定尺长度的持久化与快照装载
// ==========================================

use crate::domain::catalog::{Catalog, Manufacturer, StockLength};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// CatalogRepository - 目录仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入/更新厂商主数据
    pub fn upsert_manufacturer(&self, m: &Manufacturer) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO manufacturer (
                manufacturer_id, name, carbon_factor_kg_per_kg,
                unit_price_per_kg, min_lead_time_days
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(manufacturer_id) DO UPDATE SET
                name = excluded.name,
                carbon_factor_kg_per_kg = excluded.carbon_factor_kg_per_kg,
                unit_price_per_kg = excluded.unit_price_per_kg,
                min_lead_time_days = excluded.min_lead_time_days"#,
            params![
                &m.manufacturer_id,
                &m.name,
                &m.carbon_factor_kg_per_kg,
                &m.unit_price_per_kg,
                &m.min_lead_time_days,
            ],
        )?;
        Ok(())
    }

    /// 写入/更新目录行
    pub fn upsert_stock_length(&self, row: &StockLength) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO stock_length (
                manufacturer_id, diameter, length_mm,
                min_order_tonnage, min_lead_time_days
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(manufacturer_id, diameter, length_mm) DO UPDATE SET
                min_order_tonnage = excluded.min_order_tonnage,
                min_lead_time_days = excluded.min_lead_time_days"#,
            params![
                &row.manufacturer_id,
                row.diameter.as_str(),
                &row.length_mm,
                &row.min_order_tonnage,
                &row.min_lead_time_days,
            ],
        )?;
        Ok(())
    }

    /// 装载完整目录快照 (只读共享给引擎层)
    pub fn load_catalog(&self) -> RepositoryResult<Catalog> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT manufacturer_id, name, carbon_factor_kg_per_kg,
                      unit_price_per_kg, min_lead_time_days
               FROM manufacturer
               ORDER BY manufacturer_id"#,
        )?;
        let manufacturers = stmt
            .query_map([], |row| {
                Ok(Manufacturer {
                    manufacturer_id: row.get(0)?,
                    name: row.get(1)?,
                    carbon_factor_kg_per_kg: row.get(2)?,
                    unit_price_per_kg: row.get(3)?,
                    min_lead_time_days: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"SELECT manufacturer_id, diameter, length_mm,
                      min_order_tonnage, min_lead_time_days
               FROM stock_length
               ORDER BY diameter, length_mm, manufacturer_id"#,
        )?;
        let stock_lengths = stmt
            .query_map([], |row| {
                Ok(StockLength {
                    manufacturer_id: row.get(0)?,
                    diameter: crate::repository::parse_diameter(row, 1)?,
                    length_mm: row.get(2)?,
                    min_order_tonnage: row.get(3)?,
                    min_lead_time_days: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Catalog {
            manufacturers,
            stock_lengths,
        })
    }

    /// 清空目录 (导入前重置)
    pub fn clear(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM stock_length", [])?;
        conn.execute("DELETE FROM manufacturer", [])?;
        Ok(())
    }
}
