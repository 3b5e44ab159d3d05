// ==========================================
// 特殊定尺钢筋采购优化系统 - 捆包/批次/订单仓储
// ==========================================
// 职责: 捆包、批次与采购排程结果的版本化持久化
// 红线: 不可行订单与可行订单同表系保存, 审计不丢信息
// ==========================================

use crate::domain::bundle::{Bundle, Lot};
use crate::domain::order::{InfeasibleOrder, ProcurementOrder, ScheduleOutcome};
use crate::domain::types::OrderStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_date, parse_date, parse_diameter};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// OrderRepository - 捆包/批次/订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存一次修订的捆包/批次/排程结果 (单事务, 追加型)
    pub fn save_results(
        &self,
        revision_id: &str,
        bundles: &[Bundle],
        lots: &[Lot],
        schedule: &ScheduleOutcome,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for b in bundles {
            tx.execute(
                r#"INSERT INTO bundle (
                    revision_id, bundle_id, bar_mark, diameter, length_mm,
                    manufacturer_id, quantity, bundle_size, waste_per_piece_mm,
                    cutting_sequence_index, lot_no
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    revision_id,
                    &b.bundle_id,
                    &b.bar_mark,
                    b.diameter.as_str(),
                    &b.length_mm,
                    &b.manufacturer_id,
                    &b.quantity,
                    &b.bundle_size,
                    &b.waste_per_piece_mm,
                    &b.cutting_sequence_index,
                    &b.lot_no,
                ],
            )?;
        }

        for lot in lots {
            tx.execute(
                r#"INSERT INTO lot (
                    revision_id, lot_no, diameter, length_mm, bundle_ids_json
                ) VALUES (?, ?, ?, ?, ?)"#,
                params![
                    revision_id,
                    &lot.lot_no,
                    lot.diameter.as_str(),
                    &lot.length_mm,
                    serde_json::to_string(&lot.bundle_ids)?,
                ],
            )?;
        }

        for order in &schedule.orders {
            tx.execute(
                r#"INSERT INTO procurement_order (
                    revision_id, order_id, diameter, length_mm, supplier_id,
                    quantity, tonnage, bundle_ids_json, required_date,
                    lead_time_days, order_date, delivery_date, status, delay_days
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    revision_id,
                    &order.order_id,
                    order.diameter.as_str(),
                    &order.length_mm,
                    &order.supplier_id,
                    &order.quantity,
                    &order.tonnage,
                    serde_json::to_string(&order.bundle_ids)?,
                    format_date(order.required_date),
                    &order.lead_time_days,
                    format_date(order.order_date),
                    format_date(order.delivery_date),
                    order.status.to_db_str(),
                    &order.delay_days,
                ],
            )?;
        }

        for (seq, inf) in schedule.infeasible.iter().enumerate() {
            tx.execute(
                r#"INSERT INTO infeasible_order (
                    revision_id, seq, diameter, length_mm, tonnage,
                    bundle_ids_json, required_date, reason
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    revision_id,
                    seq as i64,
                    inf.diameter.as_str(),
                    &inf.length_mm,
                    &inf.tonnage,
                    serde_json::to_string(&inf.bundle_ids)?,
                    format_date(inf.required_date),
                    &inf.reason,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 装载一次修订的捆包 (切割顺序升序)
    pub fn load_bundles(&self, revision_id: &str) -> RepositoryResult<Vec<Bundle>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT bundle_id, bar_mark, diameter, length_mm, manufacturer_id,
                      quantity, bundle_size, waste_per_piece_mm,
                      cutting_sequence_index, lot_no
               FROM bundle
               WHERE revision_id = ?
               ORDER BY cutting_sequence_index"#,
        )?;
        let bundles = stmt
            .query_map(params![revision_id], |row| {
                Ok(Bundle {
                    bundle_id: row.get(0)?,
                    bar_mark: row.get(1)?,
                    diameter: parse_diameter(row, 2)?,
                    length_mm: row.get(3)?,
                    manufacturer_id: row.get(4)?,
                    quantity: row.get(5)?,
                    bundle_size: row.get(6)?,
                    waste_per_piece_mm: row.get(7)?,
                    cutting_sequence_index: row.get(8)?,
                    lot_no: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bundles)
    }

    /// 装载一次修订的批次
    pub fn load_lots(&self, revision_id: &str) -> RepositoryResult<Vec<Lot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT lot_no, diameter, length_mm, bundle_ids_json
               FROM lot
               WHERE revision_id = ?
               ORDER BY lot_no"#,
        )?;
        let rows = stmt
            .query_map(params![revision_id], |row| {
                let json: String = row.get(3)?;
                Ok((
                    Lot {
                        lot_no: row.get(0)?,
                        diameter: parse_diameter(row, 1)?,
                        length_mm: row.get(2)?,
                        bundle_ids: Vec::new(),
                    },
                    json,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut lot, json)| {
                lot.bundle_ids = serde_json::from_str(&json)?;
                Ok(lot)
            })
            .collect()
    }

    /// 装载一次修订的排程结果 (可行 + 不可行)
    pub fn load_schedule(&self, revision_id: &str) -> RepositoryResult<ScheduleOutcome> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT order_id, diameter, length_mm, supplier_id, quantity,
                      tonnage, bundle_ids_json, required_date, lead_time_days,
                      order_date, delivery_date, status, delay_days
               FROM procurement_order
               WHERE revision_id = ?
               ORDER BY order_id"#,
        )?;
        let order_rows = stmt
            .query_map(params![revision_id], |row| {
                let json: String = row.get(6)?;
                let status_str: String = row.get(11)?;
                let status = OrderStatus::from_db_str(&status_str).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        11,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?;
                Ok((
                    ProcurementOrder {
                        order_id: row.get(0)?,
                        diameter: parse_diameter(row, 1)?,
                        length_mm: row.get(2)?,
                        supplier_id: row.get(3)?,
                        quantity: row.get(4)?,
                        tonnage: row.get(5)?,
                        bundle_ids: Vec::new(),
                        required_date: parse_date(row, 7)?,
                        lead_time_days: row.get(8)?,
                        order_date: parse_date(row, 9)?,
                        delivery_date: parse_date(row, 10)?,
                        status,
                        delay_days: row.get(12)?,
                    },
                    json,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let orders = order_rows
            .into_iter()
            .map(|(mut order, json)| {
                order.bundle_ids = serde_json::from_str(&json)?;
                Ok(order)
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            r#"SELECT diameter, length_mm, tonnage, bundle_ids_json,
                      required_date, reason
               FROM infeasible_order
               WHERE revision_id = ?
               ORDER BY seq"#,
        )?;
        let inf_rows = stmt
            .query_map(params![revision_id], |row| {
                let json: String = row.get(3)?;
                Ok((
                    InfeasibleOrder {
                        diameter: parse_diameter(row, 0)?,
                        length_mm: row.get(1)?,
                        tonnage: row.get(2)?,
                        bundle_ids: Vec::new(),
                        required_date: parse_date(row, 4)?,
                        reason: row.get(5)?,
                    },
                    json,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let infeasible = inf_rows
            .into_iter()
            .map(|(mut inf, json)| {
                inf.bundle_ids = serde_json::from_str(&json)?;
                Ok(inf)
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(ScheduleOutcome { orders, infeasible })
    }
}
