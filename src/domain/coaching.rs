// ==========================================
// 车队安全运营系统 - 辅导计划领域模型
// ==========================================
// 不变量:
// - week 取值为 1..=duration_weeks,连续且唯一,创建后固定
// - status == COMPLETED 当且仅当全部打卡为 COMPLETE
// ==========================================

use crate::domain::types::{CheckInStatus, PlanStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 辅导周期下限 (周)
pub const MIN_DURATION_WEEKS: u32 = 1;
/// 辅导周期上限 (周)
pub const MAX_DURATION_WEEKS: u32 = 12;

// ==========================================
// CheckIn - 周度打卡
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub week: u32,                           // 第几周 (从1开始)
    pub due_date: NaiveDate,                 // 到期日 = start_date + (week-1)*7
    pub status: CheckInStatus,               // 打卡状态
    pub completed_date: Option<NaiveDateTime>, // 完成时间 (回退时清空)
    pub notes: Option<String>,               // 备注
    pub assigned_to: Option<String>,         // 负责人
}

impl CheckIn {
    pub fn is_complete(&self) -> bool {
        self.status == CheckInStatus::Complete
    }
}

// ==========================================
// CoachingPlan - 辅导计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingPlan {
    pub plan_id: String,           // 计划ID
    pub driver_id: String,         // 驾驶员ID
    pub driver_name: String,       // 驾驶员姓名 (冗余,提醒使用)
    pub plan_type: String,         // 辅导类型
    pub start_date: NaiveDate,     // 开始日期
    pub duration_weeks: u32,       // 周期 (1-12周)
    pub status: PlanStatus,        // 派生状态
    pub check_ins: Vec<CheckIn>,   // 有序打卡列表
    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}

impl CoachingPlan {
    /// 按周查找打卡
    pub fn check_in(&self, week: u32) -> Option<&CheckIn> {
        self.check_ins.iter().find(|c| c.week == week)
    }

    /// 最早的未完成打卡
    pub fn next_pending(&self) -> Option<&CheckIn> {
        self.check_ins
            .iter()
            .filter(|c| !c.is_complete())
            .min_by_key(|c| c.week)
    }

    /// 已完成打卡数
    pub fn completed_count(&self) -> usize {
        self.check_ins.iter().filter(|c| c.is_complete()).count()
    }
}

// ==========================================
// NewCoachingPlan - 待持久化的新计划
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoachingPlan {
    pub plan_type: String,
    pub start_date: NaiveDate,
    pub duration_weeks: u32,
    pub status: PlanStatus,
    pub check_ins: Vec<CheckIn>,
}

// ==========================================
// CoachingPlanPatch - 计划更新
// ==========================================
// 说明: 打卡列表与派生状态总是一起写入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingPlanPatch {
    pub status: PlanStatus,
    pub check_ins: Vec<CheckIn>,
}

impl From<&CoachingPlan> for CoachingPlanPatch {
    fn from(plan: &CoachingPlan) -> Self {
        Self {
            status: plan.status,
            check_ins: plan.check_ins.clone(),
        }
    }
}

// ==========================================
// CheckInField - 可编辑打卡字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum CheckInField {
    Notes(Option<String>),
    AssignedTo(Option<String>),
    Status(CheckInStatus),
}
