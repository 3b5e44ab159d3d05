// ==========================================
// 特殊定尺钢筋采购优化系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout, 减少并发写入时的偶发 busy 错误
// - 结果集表为追加型 (修订历史只增不改)
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化全部表结构 (幂等)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS manufacturer (
            manufacturer_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            carbon_factor_kg_per_kg REAL NOT NULL,
            unit_price_per_kg REAL NOT NULL,
            min_lead_time_days INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stock_length (
            manufacturer_id TEXT NOT NULL REFERENCES manufacturer(manufacturer_id),
            diameter TEXT NOT NULL,
            length_mm INTEGER NOT NULL,
            min_order_tonnage REAL NOT NULL,
            min_lead_time_days INTEGER NOT NULL,
            PRIMARY KEY (manufacturer_id, diameter, length_mm)
        );

        CREATE TABLE IF NOT EXISTS bar_mark (
            project_id TEXT NOT NULL,
            bar_mark TEXT NOT NULL,
            diameter TEXT NOT NULL,
            unit_length_mm INTEGER NOT NULL,
            count INTEGER NOT NULL,
            required_date TEXT,
            PRIMARY KEY (project_id, bar_mark)
        );

        CREATE TABLE IF NOT EXISTS revision (
            revision_id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            revision_no INTEGER NOT NULL,
            objective TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            elapsed_ms INTEGER NOT NULL,
            UNIQUE (project_id, revision_no)
        );

        CREATE TABLE IF NOT EXISTS cutting_pattern (
            revision_id TEXT NOT NULL REFERENCES revision(revision_id),
            diameter TEXT NOT NULL,
            outcome_kind TEXT NOT NULL,
            required_length_mm INTEGER NOT NULL,
            objective TEXT NOT NULL,
            objective_score REAL NOT NULL,
            line_items_json TEXT NOT NULL,
            rcw_pct REAL,
            co2_kg REAL,
            cost REAL,
            infeasible_reason TEXT,
            PRIMARY KEY (revision_id, diameter)
        );

        CREATE TABLE IF NOT EXISTS bundle (
            revision_id TEXT NOT NULL REFERENCES revision(revision_id),
            bundle_id TEXT NOT NULL,
            bar_mark TEXT NOT NULL,
            diameter TEXT NOT NULL,
            length_mm INTEGER NOT NULL,
            manufacturer_id TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            bundle_size INTEGER NOT NULL,
            waste_per_piece_mm REAL NOT NULL,
            cutting_sequence_index INTEGER NOT NULL,
            lot_no TEXT NOT NULL,
            PRIMARY KEY (revision_id, bundle_id)
        );

        CREATE TABLE IF NOT EXISTS lot (
            revision_id TEXT NOT NULL REFERENCES revision(revision_id),
            lot_no TEXT NOT NULL,
            diameter TEXT NOT NULL,
            length_mm INTEGER NOT NULL,
            bundle_ids_json TEXT NOT NULL,
            PRIMARY KEY (revision_id, lot_no)
        );

        CREATE TABLE IF NOT EXISTS procurement_order (
            revision_id TEXT NOT NULL REFERENCES revision(revision_id),
            order_id TEXT NOT NULL,
            diameter TEXT NOT NULL,
            length_mm INTEGER NOT NULL,
            supplier_id TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            tonnage REAL NOT NULL,
            bundle_ids_json TEXT NOT NULL,
            required_date TEXT NOT NULL,
            lead_time_days INTEGER NOT NULL,
            order_date TEXT NOT NULL,
            delivery_date TEXT NOT NULL,
            status TEXT NOT NULL,
            delay_days INTEGER NOT NULL,
            PRIMARY KEY (revision_id, order_id)
        );

        CREATE TABLE IF NOT EXISTS infeasible_order (
            revision_id TEXT NOT NULL REFERENCES revision(revision_id),
            seq INTEGER NOT NULL,
            diameter TEXT NOT NULL,
            length_mm INTEGER NOT NULL,
            tonnage REAL NOT NULL,
            bundle_ids_json TEXT NOT NULL,
            required_date TEXT NOT NULL,
            reason TEXT NOT NULL,
            PRIMARY KEY (revision_id, seq)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}

/// 打开连接并保证表结构就绪
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}
