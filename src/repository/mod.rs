// ==========================================
// 车队安全运营系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供后端存储/文件存储接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod document_store;
pub mod error;
pub mod file_storage;
pub mod fleet_store;
pub mod fleet_store_impl;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use document_store::DocumentStore;
pub use error::{RepositoryError, RepositoryResult};
pub use file_storage::{FileStorage, LocalFileStorage};
pub use fleet_store::FleetStore;
pub use fleet_store_impl::SqliteFleetStore;
