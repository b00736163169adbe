// ==========================================
// 车队安全运营系统 - 引擎层
// ==========================================
// 职责: 实现业务规则 (风险分级/风险台账/辅导排程/打卡状态机)
//       以及乐观更新与批量协调
// 红线: Engine 不拼 SQL, 所有存储调用经 bounded() 设置超时
// ==========================================

pub mod bulk;
pub mod check_in_state;
pub mod coaching_scheduler;
pub mod error;
pub mod optimistic;
pub mod reminder;
pub mod risk_band;
pub mod risk_ledger;

// 重导出核心引擎
pub use bulk::{BulkFailure, BulkKey, BulkOperationCoordinator, BulkOperationResult};
pub use check_in_state::{apply_check_in_field, recompute_plan_status, CheckInStateMachine};
pub use coaching_scheduler::{generate_check_ins, validate_duration_weeks, CoachingPlanScheduler};
pub use error::{bounded, EngineError, EngineResult};
pub use optimistic::{KeyedLocks, LocalMirror, OptimisticUpdateGuard};
pub use reminder::{
    next_reminder, CoachingReminder, CoachingReminderSender, NoOpReminderSender, NotifyError,
};
pub use risk_band::classify as classify_risk_band;
pub use risk_ledger::RiskEventLedger;
