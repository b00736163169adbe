// ==========================================
// 车队安全运营系统 - 风险事件领域模型
// ==========================================
// 红线: 只追加,不修改,不删除
// ==========================================

use crate::domain::types::RiskEventType;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// RiskEvent - 风险事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub event_id: String,          // 事件ID
    pub driver_id: String,         // 驾驶员ID
    pub event_date: NaiveDate,     // 发生日期
    pub event_type: RiskEventType, // 事件类型
    pub points: i64,               // 分值 (创建时按类型派生)
    pub notes: Option<String>,     // 备注
    pub created_at: NaiveDateTime, // 记录时间
}

// ==========================================
// NewRiskEvent - 风险事件录入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRiskEvent {
    pub driver_id: String,
    pub event_date: NaiveDate,
    pub event_type: RiskEventType,
    pub notes: Option<String>,
}
