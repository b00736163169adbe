// ==========================================
// 车队安全运营系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 返回结构化结果
// ==========================================

pub mod coaching_api;
pub mod document_api;
pub mod driver_api;
pub mod dto;
pub mod error;
pub mod validator;

// 重导出核心类型
pub use coaching_api::CoachingApi;
pub use document_api::DocumentApi;
pub use driver_api::DriverApi;
pub use dto::{BulkOutcome, BulkSummary, ReminderOutcome, RiskOverview};
pub use error::{ApiError, ApiResult};
