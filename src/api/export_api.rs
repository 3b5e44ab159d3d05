// ==========================================
// 特殊定尺钢筋采购优化系统 - 导出 API
// ==========================================
// 职责: ERP 切割清单 CSV 与采购订单 CSV 导出
// 红线: 切割清单列序冻结 (ERP 对接契约):
//       bar_mark, diameter, length, quantity, waste, lot_no, cutting_sequence
// ==========================================

use crate::api::error::ApiResult;
use crate::repository::order_repo::OrderRepository;
use csv::Writer;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// ExportApi - 导出 API
// ==========================================
pub struct ExportApi {
    order_repo: Arc<OrderRepository>,
}

impl ExportApi {
    pub fn new(order_repo: Arc<OrderRepository>) -> Self {
        Self { order_repo }
    }

    /// 导出切割清单 CSV (本体, 任意 Write 目标)
    ///
    /// 行序 = 切割顺序升序 (仓储层已保证)
    pub fn write_cutting_list<W: Write>(&self, revision_id: &str, out: W) -> ApiResult<usize> {
        let bundles = self.order_repo.load_bundles(revision_id)?;

        let mut writer = Writer::from_writer(out);
        writer.write_record([
            "bar_mark",
            "diameter",
            "length",
            "quantity",
            "waste",
            "lot_no",
            "cutting_sequence",
        ])?;

        for b in &bundles {
            writer.write_record([
                b.bar_mark.as_str(),
                b.diameter.as_str(),
                &b.length_mm.to_string(),
                &b.quantity.to_string(),
                &format!("{:.1}", b.waste_per_piece_mm),
                b.lot_no.as_str(),
                &b.cutting_sequence_index.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(bundles.len())
    }

    /// 导出切割清单 CSV 到文件
    #[instrument(skip(self))]
    pub fn export_cutting_list(&self, revision_id: &str, path: &Path) -> ApiResult<usize> {
        let file = std::fs::File::create(path)?;
        let rows = self.write_cutting_list(revision_id, file)?;
        info!(revision_id, rows, path = %path.display(), "切割清单已导出");
        Ok(rows)
    }

    /// 导出采购订单 CSV (本体)
    pub fn write_order_list<W: Write>(&self, revision_id: &str, out: W) -> ApiResult<usize> {
        let schedule = self.order_repo.load_schedule(revision_id)?;

        let mut writer = Writer::from_writer(out);
        writer.write_record([
            "order_id",
            "diameter",
            "length",
            "supplier",
            "quantity",
            "tonnage",
            "required_date",
            "order_date",
            "delivery_date",
            "status",
            "delay_days",
        ])?;

        for o in &schedule.orders {
            writer.write_record([
                o.order_id.as_str(),
                o.diameter.as_str(),
                &o.length_mm.to_string(),
                o.supplier_id.as_str(),
                &o.quantity.to_string(),
                &format!("{:.3}", o.tonnage),
                &o.required_date.format("%Y-%m-%d").to_string(),
                &o.order_date.format("%Y-%m-%d").to_string(),
                &o.delivery_date.format("%Y-%m-%d").to_string(),
                o.status.to_db_str(),
                &o.delay_days.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(schedule.orders.len())
    }

    /// 导出采购订单 CSV 到文件
    #[instrument(skip(self))]
    pub fn export_order_list(&self, revision_id: &str, path: &Path) -> ApiResult<usize> {
        let file = std::fs::File::create(path)?;
        let rows = self.write_order_list(revision_id, file)?;
        info!(revision_id, rows, path = %path.display(), "订单清单已导出");
        Ok(rows)
    }
}
