// ==========================================
// 车队安全运营系统 - 配置层
// ==========================================
// 职责: 运行参数管理与本地用户档案
// 存储: config_kv 表 (scope: global / profile)
// ==========================================

pub mod config_manager;
pub mod profile_store;
pub mod safety_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use profile_store::{ProfileStore, SqliteProfileStore, UserProfile};
pub use safety_config_trait::{ConfigError, SafetyConfigReader};
