// ==========================================
// 车队安全运营系统 - API 结构化结果
// ==========================================
// 职责: 替代界面提示, 以结构化数据返回操作结果
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::RiskBand;
use crate::engine::bulk::{BulkFailure, BulkOperationResult};
use serde::{Deserialize, Serialize};

// ==========================================
// BulkOutcome - 批量结果分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkOutcome {
    FullSuccess,
    PartialSuccess,
    FullFailure,
}

/// 批量操作摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSummary<O> {
    pub outcome: BulkOutcome,
    pub total: usize,
    pub succeeded: Vec<O>,
    pub failed: Vec<BulkFailure>,
}

impl<O> BulkSummary<O> {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// 存在失败条目时转换为 PartialFailure
    pub fn ensure_complete(self) -> ApiResult<Vec<O>> {
        if self.failed.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(ApiError::PartialFailure {
                succeeded: self.succeeded.len(),
                failed: self.failed,
            })
        }
    }
}

impl<O> From<BulkOperationResult<O>> for BulkSummary<O> {
    fn from(result: BulkOperationResult<O>) -> Self {
        let outcome = if result.failed.is_empty() {
            BulkOutcome::FullSuccess
        } else if result.succeeded.is_empty() {
            BulkOutcome::FullFailure
        } else {
            BulkOutcome::PartialSuccess
        };
        Self {
            outcome,
            total: result.total,
            succeeded: result.succeeded,
            failed: result.failed,
        }
    }
}

// ==========================================
// ReminderOutcome - 提醒发送结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderOutcome {
    /// 已交给通知服务
    Sent { week: u32 },
    /// 通知服务拒绝
    Rejected { week: u32 },
    /// 计划已完成或无待办打卡
    NotNeeded,
    /// 驾驶员无邮箱
    NoRecipient,
}

// ==========================================
// RiskOverview - 车队风险概览
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskOverview {
    pub total_drivers: usize,
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
    pub active_plans: usize,
}

impl RiskOverview {
    pub fn count_band(&mut self, band: RiskBand) {
        self.total_drivers += 1;
        match band {
            RiskBand::Green => self.green += 1,
            RiskBand::Yellow => self.yellow += 1,
            RiskBand::Red => self.red += 1,
        }
    }
}
