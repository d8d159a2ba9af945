// ==========================================
// NSPIRE 合规系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 整改期限规则本身固定, 不受配置影响
// ==========================================

use crate::db::{ensure_base_schema, open_sqlite_connection};
use chrono::Duration;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 临期窗口默认值（小时）
pub const DEFAULT_DUE_SOON_WINDOW_HOURS: i64 = 72;

/// 临期窗口上限（小时, 约 10 年）
pub const MAX_DUE_SOON_WINDOW_HOURS: i64 = 87_600;

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

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
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 并建立 config_kv（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            ensure_base_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
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
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    // ===== 期限展示配置 =====

    /// 获取临期窗口
    ///
    /// # 默认值
    /// - 72 小时; 非数字、非正数或超过 MAX_DUE_SOON_WINDOW_HOURS 时回退默认值
    pub fn get_due_soon_window(&self) -> Result<Duration, Box<dyn Error>> {
        let default = DEFAULT_DUE_SOON_WINDOW_HOURS.to_string();
        let value = self.get_config_or_default(config_keys::DUE_SOON_WINDOW_HOURS, &default)?;

        let window = value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|h| (1..=MAX_DUE_SOON_WINDOW_HOURS).contains(h))
            .and_then(Duration::try_hours);

        match window {
            Some(window) => Ok(window),
            None => {
                tracing::warn!(
                    config_key = config_keys::DUE_SOON_WINDOW_HOURS,
                    raw_value = %value,
                    max_hours = MAX_DUE_SOON_WINDOW_HOURS,
                    "临期窗口配置无效，使用默认值"
                );
                Ok(Duration::hours(DEFAULT_DUE_SOON_WINDOW_HOURS))
            }
        }
    }

    /// 获取界面语言
    ///
    /// # 默认值
    /// - zh-CN; 仅支持 zh-CN / en
    pub fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LOCALE, DEFAULT_LOCALE)?;
        match value.trim() {
            "zh-CN" | "en" => Ok(value.trim().to_string()),
            other => {
                tracing::warn!(config_key = config_keys::LOCALE, raw_value = other, "不支持的语言，使用默认值");
                Ok(DEFAULT_LOCALE.to_string())
            }
        }
    }

    // ===== 快照 =====

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名 global 配置, 不删除快照之外的配置
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            let affected = tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            count += affected;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 临期窗口（小时）
    pub const DUE_SOON_WINDOW_HOURS: &str = "due_soon_window_hours";

    // 界面语言
    pub const LOCALE: &str = "locale";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = memory_config();
        assert_eq!(config.get_due_soon_window().unwrap(), Duration::hours(72));
        assert_eq!(config.get_locale().unwrap(), "zh-CN");
    }

    #[test]
    fn test_due_soon_window_fallback() {
        let config = memory_config();

        config.set_global_config_value(config_keys::DUE_SOON_WINDOW_HOURS, "48").unwrap();
        assert_eq!(config.get_due_soon_window().unwrap(), Duration::hours(48));

        config.set_global_config_value(config_keys::DUE_SOON_WINDOW_HOURS, "0").unwrap();
        assert_eq!(config.get_due_soon_window().unwrap(), Duration::hours(72));

        config.set_global_config_value(config_keys::DUE_SOON_WINDOW_HOURS, "abc").unwrap();
        assert_eq!(config.get_due_soon_window().unwrap(), Duration::hours(72));

        // 超出上限的值（含 TimeDelta 可表示范围之外的值）
        for raw in ["87601", "2400000000", "9000000000000000", "9223372036854775807"] {
            config.set_global_config_value(config_keys::DUE_SOON_WINDOW_HOURS, raw).unwrap();
            assert_eq!(config.get_due_soon_window().unwrap(), Duration::hours(72));
        }

        config.set_global_config_value(config_keys::DUE_SOON_WINDOW_HOURS, "87600").unwrap();
        assert_eq!(
            config.get_due_soon_window().unwrap(),
            Duration::hours(MAX_DUE_SOON_WINDOW_HOURS)
        );
    }

    #[test]
    fn test_unsupported_locale_falls_back() {
        let config = memory_config();
        config.set_global_config_value(config_keys::LOCALE, "fr").unwrap();
        assert_eq!(config.get_locale().unwrap(), "zh-CN");
    }
}
