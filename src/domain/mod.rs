// ==========================================
// 车队安全运营系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod coaching;
pub mod document;
pub mod driver;
pub mod risk_event;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use coaching::{CheckIn, CheckInField, CoachingPlan, CoachingPlanPatch, NewCoachingPlan};
pub use document::{Document, DocumentMetadata, DocumentPatch, DocumentUpload};
pub use driver::{Driver, DriverPatch, NewDriver};
pub use risk_event::{NewRiskEvent, RiskEvent};
pub use types::{CheckInStatus, DriverStatus, PlanStatus, RiskBand, RiskEventType};
