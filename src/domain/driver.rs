// ==========================================
// 车队安全运营系统 - 驾驶员领域模型
// ==========================================
// 红线: risk_score 只能通过风险事件台账或直接编辑变更
// ==========================================

use crate::domain::types::{DriverStatus, RiskBand};
use crate::engine::risk_band;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Driver - 驾驶员
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: String,         // 驾驶员ID
    pub full_name: String,         // 姓名
    pub email: Option<String>,     // 邮箱 (提醒通知使用)
    pub status: DriverStatus,      // 状态
    pub risk_score: i64,           // 累计风险分 (基础分 + 事件分值之和)
    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}

impl Driver {
    /// 当前风险色带
    pub fn risk_band(&self) -> RiskBand {
        risk_band::classify(self.risk_score)
    }

    /// 应用补丁后的新状态 (不落库)
    pub fn with_patch(&self, patch: &DriverPatch, now: NaiveDateTime) -> Driver {
        let mut next = self.clone();
        if let Some(name) = &patch.full_name {
            next.full_name = name.clone();
        }
        if let Some(email) = &patch.email {
            next.email = email.clone();
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        next.updated_at = now;
        next
    }
}

// ==========================================
// NewDriver - 新建驾驶员
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDriver {
    pub full_name: String,
    pub email: Option<String>,
    pub base_risk_score: i64,
}

// ==========================================
// DriverPatch - 驾驶员直接编辑
// ==========================================
// 说明: risk_score 不在补丁内,分值只经台账变更
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverPatch {
    pub full_name: Option<String>,
    pub email: Option<Option<String>>,
    pub status: Option<DriverStatus>,
}

impl DriverPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none() && self.status.is_none()
    }
}
