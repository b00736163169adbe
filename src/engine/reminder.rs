// ==========================================
// 车队安全运营系统 - 辅导提醒策略
// ==========================================
// 职责: 决定何时调用通知服务 (不负责投递)
// 条件: 计划 ACTIVE 且至少有一个 PENDING 打卡
// 目标: 最早的 PENDING 周
// ==========================================

use crate::domain::coaching::CoachingPlan;
use crate::domain::driver::Driver;
use crate::domain::types::PlanStatus;
use crate::engine::error::{EngineError, EngineResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 附言最小长度默认值
pub const DEFAULT_MIN_MESSAGE_LEN: usize = 10;

/// 辅导提醒
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingReminder {
    pub driver_name: String,
    pub driver_email: String,
    pub coaching_type: String,
    pub check_in_date: NaiveDate,
    pub week: u32,
    /// 附言 (可选)
    pub message: Option<String>,
}

/// 通知服务错误
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("通知服务不可用: {0}")]
    Unavailable(String),

    #[error("通知服务超时")]
    Timeout,
}

// ==========================================
// 通知服务 Trait
// ==========================================

/// 辅导提醒发送者
///
/// 返回 Ok(false) 表示通知服务明确拒绝 (非瞬时错误)
#[async_trait]
pub trait CoachingReminderSender: Send + Sync {
    async fn send_coaching_reminder(&self, reminder: &CoachingReminder)
        -> Result<bool, NotifyError>;
}

/// 空操作发送者
///
/// 用于未接入通知服务的场景
#[derive(Debug, Clone, Default)]
pub struct NoOpReminderSender;

#[async_trait]
impl CoachingReminderSender for NoOpReminderSender {
    async fn send_coaching_reminder(
        &self,
        reminder: &CoachingReminder,
    ) -> Result<bool, NotifyError> {
        tracing::debug!(
            "NoOpReminderSender: 跳过提醒发送 - driver={}, week={}, due={}",
            reminder.driver_name,
            reminder.week,
            reminder.check_in_date
        );
        Ok(true)
    }
}

/// 计算下一次提醒
///
/// # 返回
/// - Some: 计划 ACTIVE 且存在 PENDING 打卡
/// - None: 计划已完成或没有待办打卡
///
/// 驾驶员邮箱为空时仍返回提醒, driver_email 为空串, 由调用方判断能否投递
pub fn next_reminder(plan: &CoachingPlan, driver: &Driver) -> Option<CoachingReminder> {
    if plan.status != PlanStatus::Active {
        return None;
    }
    let pending = plan.next_pending()?;

    Some(CoachingReminder {
        driver_name: driver.full_name.clone(),
        driver_email: driver.email.clone().unwrap_or_default(),
        coaching_type: plan.plan_type.clone(),
        check_in_date: pending.due_date,
        week: pending.week,
        message: None,
    })
}

/// 校验附言长度 (按字符计)
pub fn validate_message(message: Option<&str>, min_len: usize) -> EngineResult<()> {
    if let Some(text) = message {
        let len = text.trim().chars().count();
        if len < min_len {
            return Err(EngineError::Validation(format!(
                "提醒附言过短: 至少 {} 个字符, 实际={}",
                min_len, len
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CheckInStatus, DriverStatus};
    use crate::engine::coaching_scheduler::generate_check_ins;
    use chrono::Utc;

    fn driver(email: Option<&str>) -> Driver {
        let now = Utc::now().naive_utc();
        Driver {
            driver_id: "D1".to_string(),
            full_name: "Alex Rivera".to_string(),
            email: email.map(str::to_string),
            status: DriverStatus::Active,
            risk_score: 55,
            created_at: now,
            updated_at: now,
        }
    }

    fn plan(weeks: u32) -> CoachingPlan {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let now = Utc::now().naive_utc();
        CoachingPlan {
            plan_id: "P1".to_string(),
            driver_id: "D1".to_string(),
            driver_name: "Alex Rivera".to_string(),
            plan_type: "Defensive Driving".to_string(),
            start_date: start,
            duration_weeks: weeks,
            status: PlanStatus::Active,
            check_ins: generate_check_ins(start, weeks).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_targets_earliest_pending_week() {
        let mut p = plan(3);
        p.check_ins[0].status = CheckInStatus::Complete;

        let reminder = next_reminder(&p, &driver(Some("alex@example.com"))).unwrap();
        assert_eq!(reminder.week, 2);
        assert_eq!(reminder.check_in_date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(reminder.coaching_type, "Defensive Driving");
        assert_eq!(reminder.driver_email, "alex@example.com");
    }

    #[test]
    fn test_no_reminder_for_completed_plan() {
        let mut p = plan(2);
        for c in p.check_ins.iter_mut() {
            c.status = CheckInStatus::Complete;
        }
        p.status = PlanStatus::Completed;
        assert!(next_reminder(&p, &driver(None)).is_none());
    }

    #[test]
    fn test_message_length() {
        assert!(validate_message(None, 10).is_ok());
        assert!(validate_message(Some("Please review week 2"), 10).is_ok());
        assert!(matches!(
            validate_message(Some("  hi  "), 10),
            Err(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_noop_sender_accepts() {
        let sender = NoOpReminderSender;
        let reminder = next_reminder(&plan(1), &driver(None)).unwrap();
        assert!(sender.send_coaching_reminder(&reminder).await.unwrap());
    }
}
