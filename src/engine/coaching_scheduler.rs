// ==========================================
// 车队安全运营系统 - 辅导计划排程器
// ==========================================
// 职责: 生成周度打卡排程、创建/删除辅导计划
// 规则: due_date[week] = start_date + (week-1) * 7 天
// 确定性: 相同输入总是得到相同输出
// ==========================================

use crate::domain::coaching::{
    CheckIn, CoachingPlan, NewCoachingPlan, MAX_DURATION_WEEKS, MIN_DURATION_WEEKS,
};
use crate::domain::types::{CheckInStatus, PlanStatus};
use crate::engine::error::{bounded, EngineError, EngineResult};
use crate::repository::fleet_store::FleetStore;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 生成周度打卡列表
///
/// # 参数
/// - `start_date`: 计划开始日期
/// - `duration_weeks`: 周期 (周)
///
/// # 返回
/// - Ok: 长度为 duration_weeks 的有序打卡列表, 全部 PENDING
/// - Err(Validation): 某周截止日期超出可表示的日期范围
pub fn generate_check_ins(
    start_date: NaiveDate,
    duration_weeks: u32,
) -> EngineResult<Vec<CheckIn>> {
    (1..=duration_weeks)
        .map(|week| {
            let offset = Days::new(u64::from(week - 1) * 7);
            let due_date = start_date.checked_add_days(offset).ok_or_else(|| {
                EngineError::Validation(format!(
                    "第 {} 周截止日期超出日期范围, start_date={}",
                    week, start_date
                ))
            })?;
            Ok(CheckIn {
                week,
                due_date,
                status: CheckInStatus::Pending,
                completed_date: None,
                notes: None,
                assigned_to: None,
            })
        })
        .collect()
}

/// 校验周期范围 (1-12周)
pub fn validate_duration_weeks(duration_weeks: u32) -> EngineResult<()> {
    if !(MIN_DURATION_WEEKS..=MAX_DURATION_WEEKS).contains(&duration_weeks) {
        return Err(EngineError::Validation(format!(
            "辅导周期必须在 {}-{} 周之间, 实际={}",
            MIN_DURATION_WEEKS, MAX_DURATION_WEEKS, duration_weeks
        )));
    }
    Ok(())
}

// ==========================================
// CoachingPlanScheduler
// ==========================================
pub struct CoachingPlanScheduler {
    store: Arc<dyn FleetStore>,
    request_timeout: Duration,
}

impl CoachingPlanScheduler {
    pub fn new(store: Arc<dyn FleetStore>, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    /// 创建辅导计划
    ///
    /// # 参数
    /// - `driver_id`: 驾驶员ID
    /// - `plan_type`: 辅导类型
    /// - `start_date`: 开始日期
    /// - `duration_weeks`: 周期 (1-12周)
    ///
    /// # 返回
    /// - Ok(CoachingPlan): status=ACTIVE, 含全部打卡
    /// - Err(Validation): 参数非法或截止日期越界 (未发起任何存储调用)
    /// - Err(NotFound): 驾驶员不存在
    pub async fn create_plan(
        &self,
        driver_id: &str,
        plan_type: &str,
        start_date: NaiveDate,
        duration_weeks: u32,
    ) -> EngineResult<CoachingPlan> {
        validate_duration_weeks(duration_weeks)?;
        let plan_type = plan_type.trim();
        if plan_type.is_empty() {
            return Err(EngineError::Validation("辅导类型不能为空".to_string()));
        }
        let check_ins = generate_check_ins(start_date, duration_weeks)?;

        let driver = bounded(
            self.request_timeout,
            "get_driver_by_id",
            self.store.get_driver_by_id(driver_id),
        )
        .await?
        .ok_or_else(|| EngineError::not_found("Driver", driver_id))?;

        let new_plan = NewCoachingPlan {
            plan_type: plan_type.to_string(),
            start_date,
            duration_weeks,
            status: PlanStatus::Active,
            check_ins,
        };

        let plan = bounded(
            self.request_timeout,
            "add_coaching_plan",
            self.store
                .add_coaching_plan(&driver.driver_id, &driver.full_name, new_plan),
        )
        .await?;

        info!(
            plan_id = %plan.plan_id,
            driver_id = %plan.driver_id,
            weeks = plan.duration_weeks,
            "辅导计划已创建"
        );
        Ok(plan)
    }

    /// 删除辅导计划
    ///
    /// # 返回
    /// - Err(NotFound): 计划不存在 (重复删除同样返回 NotFound)
    pub async fn delete_plan(&self, plan_id: &str) -> EngineResult<()> {
        bounded(
            self.request_timeout,
            "delete_coaching_plan",
            self.store.delete_coaching_plan(plan_id),
        )
        .await?;

        info!(plan_id = %plan_id, "辅导计划已删除");
        Ok(())
    }
}
