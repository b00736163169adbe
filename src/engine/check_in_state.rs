// ==========================================
// 车队安全运营系统 - 打卡状态机
// ==========================================
// 状态: PENDING <-> COMPLETE (人工切换,双向,非时间驱动)
// 红线: 任何打卡变更后必须重新计算计划状态
// 持久化: 打卡列表与计划状态在同一次更新中写入
// ==========================================

use crate::domain::coaching::{CheckInField, CoachingPlan, CoachingPlanPatch};
use crate::domain::types::{CheckInStatus, PlanStatus};
use crate::engine::error::{bounded, EngineError, EngineResult};
use crate::repository::fleet_store::FleetStore;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 重新计算计划状态
///
/// 全部打卡 COMPLETE => COMPLETED, 否则 ACTIVE
pub fn recompute_plan_status(plan: &mut CoachingPlan) {
    let all_complete =
        !plan.check_ins.is_empty() && plan.check_ins.iter().all(|c| c.is_complete());
    plan.status = if all_complete {
        PlanStatus::Completed
    } else {
        PlanStatus::Active
    };
}

/// 对计划中的某一周打卡应用字段变更 (纯函数)
///
/// # 参数
/// - `plan`: 当前计划
/// - `week`: 目标周
/// - `field`: 变更字段
/// - `now`: 当前时间 (COMPLETE 时写入 completed_date)
///
/// # 返回
/// - Ok(CoachingPlan): 变更后的计划 (状态已重新计算)
/// - Err(NotFound): 周不存在
pub fn apply_check_in_field(
    plan: &CoachingPlan,
    week: u32,
    field: &CheckInField,
    now: NaiveDateTime,
) -> EngineResult<CoachingPlan> {
    let mut next = plan.clone();
    let check_in = next
        .check_ins
        .iter_mut()
        .find(|c| c.week == week)
        .ok_or_else(|| EngineError::not_found("CheckIn", &format!("{}#{}", plan.plan_id, week)))?;

    match field {
        CheckInField::Notes(notes) => check_in.notes = notes.clone(),
        CheckInField::AssignedTo(assignee) => check_in.assigned_to = assignee.clone(),
        CheckInField::Status(CheckInStatus::Complete) => {
            // 已完成的打卡保留原完成时间
            if check_in.status != CheckInStatus::Complete {
                check_in.status = CheckInStatus::Complete;
                check_in.completed_date = Some(now);
            }
        }
        CheckInField::Status(CheckInStatus::Pending) => {
            check_in.status = CheckInStatus::Pending;
            check_in.completed_date = None;
        }
    }

    next.updated_at = now;
    recompute_plan_status(&mut next);
    Ok(next)
}

// ==========================================
// CheckInStateMachine
// ==========================================
pub struct CheckInStateMachine {
    store: Arc<dyn FleetStore>,
    request_timeout: Duration,
}

impl CheckInStateMachine {
    pub fn new(store: Arc<dyn FleetStore>, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    /// 加载计划
    pub async fn load(&self, plan_id: &str) -> EngineResult<CoachingPlan> {
        bounded(
            self.request_timeout,
            "get_coaching_plan",
            self.store.get_coaching_plan(plan_id),
        )
        .await?
        .ok_or_else(|| EngineError::not_found("CoachingPlan", plan_id))
    }

    /// 写入变更后的计划 (打卡列表 + 状态)
    ///
    /// 写入前再次计算状态,调用方传入的状态不被信任
    pub async fn commit(&self, plan: &CoachingPlan) -> EngineResult<CoachingPlan> {
        let mut normalized = plan.clone();
        recompute_plan_status(&mut normalized);

        let saved = bounded(
            self.request_timeout,
            "update_coaching_plan",
            self.store
                .update_coaching_plan(&normalized.plan_id, CoachingPlanPatch::from(&normalized)),
        )
        .await?;

        debug!(
            plan_id = %saved.plan_id,
            status = %saved.status,
            completed = saved.completed_count(),
            total = saved.check_ins.len(),
            "打卡变更已写入"
        );
        Ok(saved)
    }
}
