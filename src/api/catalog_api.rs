// ==========================================
// 特殊定尺钢筋采购优化系统 - 目录 API
// ==========================================
// 职责: 目录查询与人工定尺提案
// 红线: 人工提案长度必须重新走校验器 (策略范围 + 粒度)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::catalog::{Catalog, StockLength};
use crate::engine::validator::CatalogValidator;
use crate::repository::catalog_repo::CatalogRepository;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// CatalogApi - 目录 API
// ==========================================
pub struct CatalogApi {
    catalog_repo: Arc<CatalogRepository>,
    config: Arc<ConfigManager>,
    validator: CatalogValidator,
}

impl CatalogApi {
    pub fn new(catalog_repo: Arc<CatalogRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            catalog_repo,
            config,
            validator: CatalogValidator::new(),
        }
    }

    /// 当前目录快照
    pub fn get_catalog(&self) -> ApiResult<Catalog> {
        Ok(self.catalog_repo.load_catalog()?)
    }

    /// 人工提案新定尺长度 (校验通过后写入目录)
    ///
    /// # 返回
    /// - Ok(()): 提案通过, 目录已更新
    /// - Err(CatalogValidationError): 越界/粒度非法, 带显式原因
    #[instrument(skip(self), fields(
        manufacturer = %row.manufacturer_id,
        diameter = %row.diameter,
        length_mm = row.length_mm
    ))]
    pub fn propose_stock_length(&self, row: &StockLength) -> ApiResult<()> {
        let catalog = self.catalog_repo.load_catalog()?;
        if catalog.manufacturer(&row.manufacturer_id).is_none() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "未知厂商: {}",
                row.manufacturer_id
            )));
        }

        let policy = self
            .config
            .get_policy()
            .map_err(|e| ApiError::InternalError(format!("策略加载失败: {}", e)))?;
        self.validator.validate_length(&policy, row)?;

        self.catalog_repo.upsert_stock_length(row)?;
        info!("人工定尺提案已入目录");
        Ok(())
    }
}
