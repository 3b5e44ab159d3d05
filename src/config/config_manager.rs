// ==========================================
// 特殊定尺钢筋采购优化系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 红线: 优化运行前取一次 Policy 快照, 运行中不再读库
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::catalog::Policy;
use crate::domain::types::Objective;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值 (UPSERT, SQLite 3.24.0+)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 在创建修订版本时记录配置快照
    /// - 保证修订审计时配置可追溯
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 长度策略配置 =====

    /// 构建当前全局长度策略快照
    ///
    /// # 返回
    /// - Policy: 缺失或非法的配置项回落到默认值
    pub fn get_policy(&self) -> Result<Policy, Box<dyn Error>> {
        let defaults = Policy::default();

        let min_usable = self
            .get_config_or_default(
                config_keys::MIN_USABLE_LENGTH_MM,
                &defaults.min_usable_length_mm.to_string(),
            )?
            .parse::<i64>()
            .unwrap_or(defaults.min_usable_length_mm);

        let max_usable = self
            .get_config_or_default(
                config_keys::MAX_USABLE_LENGTH_MM,
                &defaults.max_usable_length_mm.to_string(),
            )?
            .parse::<i64>()
            .unwrap_or(defaults.max_usable_length_mm);

        let risk_window = self
            .get_config_or_default(
                config_keys::RISK_WINDOW_DAYS,
                &defaults.risk_window_days.to_string(),
            )?
            .parse::<i64>()
            .unwrap_or(defaults.risk_window_days);

        let bundle_max = self
            .get_config_or_default(
                config_keys::BUNDLE_MAX_SIZE,
                &defaults.bundle_max_size.to_string(),
            )?
            .parse::<u32>()
            .unwrap_or(defaults.bundle_max_size);

        if min_usable > max_usable {
            tracing::warn!(
                min_usable_length_mm = min_usable,
                max_usable_length_mm = max_usable,
                "长度策略区间非法 (min > max), 回落到默认策略"
            );
            return Ok(defaults);
        }

        let bundle_max = if bundle_max == 0 {
            tracing::warn!(
                config_key = config_keys::BUNDLE_MAX_SIZE,
                "单捆最大根数不得为 0, 回落到默认值"
            );
            defaults.bundle_max_size
        } else {
            bundle_max
        };

        Ok(Policy {
            min_usable_length_mm: min_usable,
            max_usable_length_mm: max_usable,
            risk_window_days: risk_window,
            bundle_max_size: bundle_max,
        })
    }

    /// 获取默认优化目标 (未配置时为 RCW)
    pub fn get_default_objective(&self) -> Result<Objective, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_OBJECTIVE, "RCW")?;
        match value.to_uppercase().as_str() {
            "RCW" => Ok(Objective::Rcw),
            "CO2" => Ok(Objective::Co2),
            "COST" => Ok(Objective::Cost),
            other => {
                tracing::warn!(
                    config_key = config_keys::DEFAULT_OBJECTIVE,
                    raw_value = %other,
                    "未知优化目标配置, 使用 RCW"
                );
                Ok(Objective::Rcw)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 长度策略
    pub const MIN_USABLE_LENGTH_MM: &str = "min_usable_length_mm";
    pub const MAX_USABLE_LENGTH_MM: &str = "max_usable_length_mm";

    // JIT 排程
    pub const RISK_WINDOW_DAYS: &str = "risk_window_days";

    // 捆包
    pub const BUNDLE_MAX_SIZE: &str = "bundle_max_size";

    // 优化目标
    pub const DEFAULT_OBJECTIVE: &str = "default_objective";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn manager_in_memory() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_policy_defaults_when_unset() {
        let mgr = manager_in_memory();
        let policy = mgr.get_policy().unwrap();
        assert_eq!(policy, Policy::default());
    }

    #[test]
    fn test_policy_reads_overrides() {
        let mgr = manager_in_memory();
        mgr.set_config_value(config_keys::MIN_USABLE_LENGTH_MM, "7000")
            .unwrap();
        mgr.set_config_value(config_keys::BUNDLE_MAX_SIZE, "30").unwrap();

        let policy = mgr.get_policy().unwrap();
        assert_eq!(policy.min_usable_length_mm, 7_000);
        assert_eq!(policy.max_usable_length_mm, 12_000);
        assert_eq!(policy.bundle_max_size, 30);
    }

    #[test]
    fn test_policy_falls_back_on_inverted_range() {
        let mgr = manager_in_memory();
        mgr.set_config_value(config_keys::MIN_USABLE_LENGTH_MM, "13000")
            .unwrap();
        let policy = mgr.get_policy().unwrap();
        assert_eq!(policy, Policy::default());
    }

    #[test]
    fn test_policy_rejects_zero_bundle_max_size() {
        let mgr = manager_in_memory();
        mgr.set_config_value(config_keys::BUNDLE_MAX_SIZE, "0").unwrap();
        let policy = mgr.get_policy().unwrap();
        assert_eq!(policy.bundle_max_size, Policy::default().bundle_max_size);
    }

    #[test]
    fn test_default_objective() {
        let mgr = manager_in_memory();
        assert_eq!(mgr.get_default_objective().unwrap(), Objective::Rcw);
        mgr.set_config_value(config_keys::DEFAULT_OBJECTIVE, "CO2")
            .unwrap();
        assert_eq!(mgr.get_default_objective().unwrap(), Objective::Co2);
        mgr.set_config_value(config_keys::DEFAULT_OBJECTIVE, "bogus")
            .unwrap();
        assert_eq!(mgr.get_default_objective().unwrap(), Objective::Rcw);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mgr = manager_in_memory();
        mgr.set_config_value(config_keys::RISK_WINDOW_DAYS, "10").unwrap();
        let snapshot = mgr.get_config_snapshot().unwrap();
        let map: HashMap<String, String> = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(map.get("risk_window_days").map(String::as_str), Some("10"));
    }
}
