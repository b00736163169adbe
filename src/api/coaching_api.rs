// ==========================================
// 车队安全运营系统 - 辅导计划 API
// ==========================================
// 职责: 辅导计划创建/删除、打卡编辑、辅导提醒
// 乐观更新: 打卡编辑先写本地镜像, 失败时恢复
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::dto::{BulkSummary, ReminderOutcome};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::coaching::{CheckInField, CoachingPlan};
use crate::domain::types::PlanStatus;
use crate::engine::bulk::BulkOperationCoordinator;
use crate::engine::check_in_state::{apply_check_in_field, CheckInStateMachine};
use crate::engine::coaching_scheduler::CoachingPlanScheduler;
use crate::engine::error::bounded;
use crate::engine::optimistic::{KeyedLocks, LocalMirror, OptimisticUpdateGuard};
use crate::engine::reminder::{self, CoachingReminderSender, NotifyError};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::fleet_store::FleetStore;

// ==========================================
// CoachingApi - 辅导计划 API
// ==========================================
pub struct CoachingApi {
    store: Arc<dyn FleetStore>,
    scheduler: CoachingPlanScheduler,
    state_machine: CheckInStateMachine,
    sender: Arc<dyn CoachingReminderSender>,
    coordinator: BulkOperationCoordinator,
    action_log_repo: Arc<ActionLogRepository>,
    mirror: Arc<LocalMirror<CoachingPlan>>,
    edit_locks: KeyedLocks,
    request_timeout: Duration,
    min_message_len: usize,
}

impl CoachingApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn FleetStore>,
        sender: Arc<dyn CoachingReminderSender>,
        coordinator: BulkOperationCoordinator,
        action_log_repo: Arc<ActionLogRepository>,
        mirror: Arc<LocalMirror<CoachingPlan>>,
        request_timeout: Duration,
        min_message_len: usize,
    ) -> Self {
        Self {
            scheduler: CoachingPlanScheduler::new(store.clone(), request_timeout),
            state_machine: CheckInStateMachine::new(store.clone(), request_timeout),
            store,
            sender,
            coordinator,
            action_log_repo,
            mirror,
            edit_locks: KeyedLocks::new(),
            request_timeout,
            min_message_len,
        }
    }

    /// 本地计划镜像
    pub fn mirror(&self) -> &LocalMirror<CoachingPlan> {
        &self.mirror
    }

    fn record(&self, log: ActionLog) {
        // 尝试记录ActionLog，失败时只记录警告（不影响主要操作）
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!(error = %e, action_type = %log.action_type, "记录操作日志失败");
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询辅导计划 (可按驾驶员过滤) 并刷新镜像
    pub async fn list_plans(&self, driver_id: Option<&str>) -> ApiResult<Vec<CoachingPlan>> {
        let plans = bounded(
            self.request_timeout,
            "list_coaching_plans",
            self.store.list_coaching_plans(driver_id),
        )
        .await?;

        let entries = plans.iter().map(|p| (p.plan_id.clone(), p.clone()));
        match driver_id {
            None => self.mirror.replace_all(entries),
            Some(_) => entries.for_each(|(id, plan)| self.mirror.reconcile(&id, plan)),
        }
        Ok(plans)
    }

    pub async fn get_plan(&self, plan_id: &str) -> ApiResult<CoachingPlan> {
        let plan = self.state_machine.load(plan_id).await?;
        self.mirror.reconcile(plan_id, plan.clone());
        Ok(plan)
    }

    // ==========================================
    // 计划生命周期
    // ==========================================

    /// 创建辅导计划
    ///
    /// # 返回
    /// - Err(ValidationError): 周期不在 1-12 周 (未发起存储调用)
    /// - Err(NotFound): 驾驶员不存在
    pub async fn create_plan(
        &self,
        driver_id: &str,
        plan_type: &str,
        start_date: NaiveDate,
        duration_weeks: u32,
        actor: &str,
    ) -> ApiResult<CoachingPlan> {
        let plan = self
            .scheduler
            .create_plan(driver_id, plan_type, start_date, duration_weeks)
            .await?;
        self.mirror.upsert(&plan.plan_id, plan.clone());

        self.record(
            ActionLog::new(ActionType::CreateCoachingPlan, Some(plan.plan_id.clone()), actor)
                .with_payload(json!({
                    "driver_id": plan.driver_id,
                    "plan_type": plan.plan_type,
                    "start_date": plan.start_date.to_string(),
                    "duration_weeks": plan.duration_weeks,
                })),
        );
        Ok(plan)
    }

    /// 删除辅导计划
    ///
    /// 先从镜像移除; 存储端失败时恢复, NotFound 时保持移除
    pub async fn delete_plan(&self, plan_id: &str, actor: &str) -> ApiResult<()> {
        let snapshot = self.mirror.remove(plan_id);

        match self.scheduler.delete_plan(plan_id).await {
            Ok(()) => {
                self.record(ActionLog::new(
                    ActionType::DeleteCoachingPlan,
                    Some(plan_id.to_string()),
                    actor,
                ));
                Ok(())
            }
            Err(e) => {
                let err = ApiError::from(e);
                if !matches!(err, ApiError::NotFound(_)) {
                    if let Some(plan) = snapshot {
                        self.mirror.upsert(plan_id, plan);
                    }
                }
                Err(err)
            }
        }
    }

    // ==========================================
    // 打卡编辑
    // ==========================================

    /// 编辑某周打卡 (乐观更新)
    ///
    /// 同一计划的编辑依次执行: 每次编辑都从上一次已确认 (或已回滚) 的计划派生,
    /// 失败编辑的暂定状态不会被后续编辑写入存储
    ///
    /// # 参数
    /// - `plan_id`: 计划ID
    /// - `week`: 周序号
    /// - `field`: 变更字段 (备注/负责人/状态)
    /// - `actor`: 操作人
    ///
    /// # 返回
    /// - Ok(CoachingPlan): 存储端返回的计划 (状态已重新计算)
    /// - Err: 镜像已恢复为编辑前状态
    pub async fn set_check_in_field(
        &self,
        plan_id: &str,
        week: u32,
        field: CheckInField,
        actor: &str,
    ) -> ApiResult<CoachingPlan> {
        let _edit = self.edit_locks.lock(plan_id).await;

        let current = match self.mirror.get(plan_id) {
            Some(plan) => plan,
            None => self.get_plan(plan_id).await?,
        };
        let tentative = apply_check_in_field(&current, week, &field, chrono::Utc::now().naive_utc())?;
        let status_changed = tentative.status != current.status;

        let guard = OptimisticUpdateGuard::begin(&self.mirror, plan_id, tentative.clone());
        match self.state_machine.commit(&tentative).await {
            Ok(saved) => {
                guard.commit_with(saved.clone());
                if status_changed {
                    info!(plan_id = %plan_id, status = %saved.status, "辅导计划状态变更");
                }
                self.record(
                    ActionLog::new(ActionType::UpdateCheckIn, Some(plan_id.to_string()), actor)
                        .with_payload(json!({
                            "week": week,
                            "field": field,
                            "plan_status": saved.status.as_str(),
                        })),
                );
                Ok(saved)
            }
            Err(e) => {
                warn!(plan_id = %plan_id, week = week, error = %e, "打卡编辑失败, 已回滚");
                guard.revert();
                Err(e.into())
            }
        }
    }

    // ==========================================
    // 辅导提醒
    // ==========================================

    /// 发送单个计划的辅导提醒
    ///
    /// # 参数
    /// - `message`: 附言 (可选, 不少于配置的最小长度)
    pub async fn send_coaching_reminder(
        &self,
        plan_id: &str,
        message: Option<String>,
        actor: &str,
    ) -> ApiResult<ReminderOutcome> {
        reminder::validate_message(message.as_deref(), self.min_message_len)?;

        let plan = self.get_plan(plan_id).await?;
        let outcome = self.deliver(&plan, message).await?;

        if let ReminderOutcome::Sent { week } = outcome {
            self.record(
                ActionLog::new(ActionType::SendReminder, Some(plan_id.to_string()), actor)
                    .with_payload(json!({ "week": week })),
            );
        }
        Ok(outcome)
    }

    /// 向所有进行中的计划发送提醒
    pub async fn send_due_reminders(
        &self,
        actor: &str,
    ) -> ApiResult<BulkSummary<(String, ReminderOutcome)>> {
        let active: Vec<CoachingPlan> = self
            .list_plans(None)
            .await?
            .into_iter()
            .filter(|p| p.status == PlanStatus::Active)
            .collect();

        let result = self
            .coordinator
            .execute("send_due_reminders", active, move |plan| async move {
                let outcome = self.deliver(&plan, None).await?;
                Ok::<_, ApiError>((plan.plan_id, outcome))
            })
            .await;

        let sent = result
            .succeeded
            .iter()
            .filter(|(_, o)| matches!(o, ReminderOutcome::Sent { .. }))
            .count();
        self.record(
            ActionLog::new(ActionType::SendReminder, None, actor)
                .with_payload(json!({
                    "total": result.total,
                    "sent": sent,
                    "failed_keys": result.failed_keys(),
                }))
                .with_detail("batch"),
        );
        Ok(BulkSummary::from(result))
    }

    async fn deliver(
        &self,
        plan: &CoachingPlan,
        message: Option<String>,
    ) -> ApiResult<ReminderOutcome> {
        let driver = bounded(
            self.request_timeout,
            "get_driver_by_id",
            self.store.get_driver_by_id(&plan.driver_id),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Driver(id={})不存在", plan.driver_id)))?;

        let Some(mut reminder) = reminder::next_reminder(plan, &driver) else {
            debug!(plan_id = %plan.plan_id, "无待办打卡, 跳过提醒");
            return Ok(ReminderOutcome::NotNeeded);
        };
        if reminder.driver_email.trim().is_empty() {
            return Ok(ReminderOutcome::NoRecipient);
        }
        reminder.message = message;

        let week = reminder.week;
        let delivered = tokio::time::timeout(
            self.request_timeout,
            self.sender.send_coaching_reminder(&reminder),
        )
        .await
        .unwrap_or(Err(NotifyError::Timeout))
        .map_err(|e| {
            warn!(plan_id = %plan.plan_id, week, error = %e, "辅导提醒发送失败");
            ApiError::TransientIo(e.to_string())
        })?;

        Ok(if delivered {
            ReminderOutcome::Sent { week }
        } else {
            ReminderOutcome::Rejected { week }
        })
    }
}
