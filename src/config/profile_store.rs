// ==========================================
// 车队安全运营系统 - 本地用户档案
// ==========================================
// 职责: 持久化本地操作员档案 (显示名/邮箱/角色)
// 存储: config_kv 表, scope_id='profile', key='user_profile' (JSON)
// 生命周期: 启动时加载, 变更时写入, 注销时清除
// ==========================================

use crate::config::safety_config_trait::ConfigError;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const PROFILE_KEY: &str = "user_profile";

/// 本地用户档案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl UserProfile {
    /// 写入操作日志时使用的操作人标识
    pub fn actor(&self) -> &str {
        &self.display_name
    }
}

/// 档案存储接口
pub trait ProfileStore: Send + Sync {
    fn get(&self) -> Result<Option<UserProfile>, ConfigError>;
    fn set(&self, profile: &UserProfile) -> Result<(), ConfigError>;
    fn clear(&self) -> Result<(), ConfigError>;
}

// ==========================================
// SqliteProfileStore
// ==========================================
pub struct SqliteProfileStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProfileStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl ProfileStore for SqliteProfileStore {
    fn get(&self) -> Result<Option<UserProfile>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'profile' AND key = ?1",
            params![PROFILE_KEY],
            |row| row.get::<_, String>(0),
        );

        let raw = match result {
            Ok(raw) => raw,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(Box::new(e)),
        };

        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                // 损坏的档案按未登录处理
                tracing::warn!(error = %e, "用户档案解析失败，忽略");
                Ok(None)
            }
        }
    }

    fn set(&self, profile: &UserProfile) -> Result<(), ConfigError> {
        if profile.display_name.trim().is_empty() {
            return Err("显示名不能为空".into());
        }
        let raw = serde_json::to_string(profile)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('profile', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![PROFILE_KEY, raw],
        )?;
        tracing::debug!(display_name = %profile.display_name, "用户档案已保存");
        Ok(())
    }

    fn clear(&self) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'profile' AND key = ?1",
            params![PROFILE_KEY],
        )?;
        Ok(())
    }
}
