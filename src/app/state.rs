// ==========================================
// 特殊定尺钢筋采购优化系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和 API 实例
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, ExportApi, OptimizeApi, ProcurementApi};
use crate::config::ConfigManager;
use crate::db::{configure_sqlite_connection, init_schema};
use crate::importer::{BarMarkImporter, CatalogImporter};
use crate::repository::bar_mark_repo::BarMarkRepository;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::pattern_repo::PatternRepository;
use crate::repository::revision_repo::RevisionRepository;

/// 应用状态
///
/// 包含所有 API 实例和共享资源, 由 CLI 入口或上层服务持有
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 优化 API
    pub optimize_api: Arc<OptimizeApi>,

    /// 采购 API
    pub procurement_api: Arc<ProcurementApi>,

    /// 导出 API
    pub export_api: Arc<ExportApi>,

    /// 目录 API
    pub catalog_api: Arc<CatalogApi>,

    /// 目录导入器
    pub catalog_importer: Arc<CatalogImporter>,

    /// 配筋表导入器
    pub bar_mark_importer: Arc<BarMarkImporter>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开共享数据库连接并初始化表结构 (幂等)
    /// 2. 初始化 Repository 层
    /// 3. 创建所有 API 实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState, 数据库路径: {}", db_path);

        let conn = Connection::open(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        configure_sqlite_connection(&conn).map_err(|e| format!("数据库配置失败: {}", e))?;
        init_schema(&conn).map_err(|e| format!("表结构初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repository 层
        // ==========================================
        let bar_mark_repo = Arc::new(BarMarkRepository::new(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let revision_repo = Arc::new(RevisionRepository::new(conn.clone()));
        let pattern_repo = Arc::new(PatternRepository::new(conn.clone()));
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));

        // 配置管理器 (共享同一连接)
        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // API 层
        // ==========================================
        let optimize_api = Arc::new(OptimizeApi::new(
            bar_mark_repo.clone(),
            catalog_repo.clone(),
            revision_repo,
            pattern_repo.clone(),
            order_repo.clone(),
            config.clone(),
        ));

        let procurement_api = Arc::new(ProcurementApi::new(order_repo.clone(), pattern_repo));
        let export_api = Arc::new(ExportApi::new(order_repo));
        let catalog_api = Arc::new(CatalogApi::new(catalog_repo.clone(), config.clone()));

        let catalog_importer = Arc::new(CatalogImporter::new(catalog_repo));
        let bar_mark_importer = Arc::new(BarMarkImporter::new(bar_mark_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            optimize_api,
            procurement_api,
            export_api,
            catalog_api,
            catalog_importer,
            bar_mark_importer,
            config,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 REBAR_APS_DB_PATH 优先
/// - 否则: 用户数据目录/rebar-aps/rebar_aps.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径 (便于调试/测试/CI)
    if let Ok(path) = std::env::var("REBAR_APS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./rebar_aps.db");

    if let Some(data_dir) = dirs::data_dir() {
        path = data_dir.join("rebar-aps");
        std::fs::create_dir_all(&path).ok();
        path = path.join("rebar_aps.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    // 注意: AppState::new() 的测试需要真实的数据库文件, 在集成测试中进行
}
