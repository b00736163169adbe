// ==========================================
// 车队安全运营系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::safety_config_trait::{ConfigError, SafetyConfigReader};
use crate::db::{ensure_schema, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
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
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
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

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 读取并解析数值配置; 缺失或格式错误时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Copy,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(
                        config_key = key,
                        raw_value = %raw,
                        "配置格式错误，使用默认值"
                    );
                    Ok(default)
                }
            },
        }
    }

    /// 获取所有配置的快照（JSON格式, 按键排序）
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// SafetyConfigReader Trait 实现
// ==========================================
#[async_trait]
impl SafetyConfigReader for ConfigManager {
    async fn get_request_timeout_ms(&self) -> Result<u64, ConfigError> {
        let value = self.get_parsed_or_default(
            config_keys::REQUEST_TIMEOUT_MS,
            defaults::REQUEST_TIMEOUT_MS,
        )?;
        // 0 会让所有调用立即超时
        Ok(if value == 0 {
            defaults::REQUEST_TIMEOUT_MS
        } else {
            value
        })
    }

    async fn get_bulk_max_concurrency(&self) -> Result<usize, ConfigError> {
        let value = self.get_parsed_or_default(
            config_keys::BULK_MAX_CONCURRENCY,
            defaults::BULK_MAX_CONCURRENCY,
        )?;
        Ok(value.max(1))
    }

    async fn get_bulk_item_timeout_ms(&self) -> Result<u64, ConfigError> {
        let value = self.get_parsed_or_default(
            config_keys::BULK_ITEM_TIMEOUT_MS,
            defaults::BULK_ITEM_TIMEOUT_MS,
        )?;
        Ok(if value == 0 {
            defaults::BULK_ITEM_TIMEOUT_MS
        } else {
            value
        })
    }

    async fn get_default_driver_risk_score(&self) -> Result<i64, ConfigError> {
        self.get_parsed_or_default(
            config_keys::DEFAULT_DRIVER_RISK_SCORE,
            defaults::DEFAULT_DRIVER_RISK_SCORE,
        )
    }

    async fn get_reminder_min_message_len(&self) -> Result<usize, ConfigError> {
        self.get_parsed_or_default(
            config_keys::REMINDER_MIN_MESSAGE_LEN,
            defaults::REMINDER_MIN_MESSAGE_LEN,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 存储调用
    pub const REQUEST_TIMEOUT_MS: &str = "request_timeout_ms";

    // 批量操作
    pub const BULK_MAX_CONCURRENCY: &str = "bulk_max_concurrency";
    pub const BULK_ITEM_TIMEOUT_MS: &str = "bulk_item_timeout_ms";

    // 驾驶员
    pub const DEFAULT_DRIVER_RISK_SCORE: &str = "default_driver_risk_score";

    // 提醒
    pub const REMINDER_MIN_MESSAGE_LEN: &str = "reminder_min_message_len";
}

pub mod defaults {
    use crate::engine::bulk::{DEFAULT_ITEM_TIMEOUT_MS, DEFAULT_MAX_CONCURRENCY};
    use crate::engine::error::DEFAULT_REQUEST_TIMEOUT_MS;
    use crate::engine::reminder::DEFAULT_MIN_MESSAGE_LEN;

    pub const REQUEST_TIMEOUT_MS: u64 = DEFAULT_REQUEST_TIMEOUT_MS;
    pub const BULK_MAX_CONCURRENCY: usize = DEFAULT_MAX_CONCURRENCY;
    pub const BULK_ITEM_TIMEOUT_MS: u64 = DEFAULT_ITEM_TIMEOUT_MS;
    pub const DEFAULT_DRIVER_RISK_SCORE: i64 = 0;
    pub const REMINDER_MIN_MESSAGE_LEN: usize = DEFAULT_MIN_MESSAGE_LEN;
}
