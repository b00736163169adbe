// ==========================================
// 车队安全运营系统 - 操作日志领域模型
// ==========================================
// 红线: 引擎的每次写入都记录审计日志
// 说明: 日志写入失败只告警,不影响主操作
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,               // 日志ID
    pub action_type: String,             // 操作类型 (存储为字符串)
    pub entity_id: Option<String>,       // 关联实体 (驾驶员/计划/文档)
    pub action_ts: NaiveDateTime,        // 操作时间戳
    pub actor: String,                   // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateDriver,        // 新建驾驶员
    AddRiskEvent,        // 录入风险事件
    UpdateDriver,        // 编辑驾驶员
    CreateCoachingPlan,  // 创建辅导计划
    DeleteCoachingPlan,  // 删除辅导计划
    UpdateCheckIn,       // 编辑打卡
    SendReminder,        // 发送辅导提醒
    UploadDocuments,     // 批量上传文档
    UpdateDocuments,     // 批量更新文档元数据
    ArchiveDocuments,    // 批量归档文档
    DeleteDocument,      // 删除文档
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateDriver => "CreateDriver",
            ActionType::AddRiskEvent => "AddRiskEvent",
            ActionType::UpdateDriver => "UpdateDriver",
            ActionType::CreateCoachingPlan => "CreateCoachingPlan",
            ActionType::DeleteCoachingPlan => "DeleteCoachingPlan",
            ActionType::UpdateCheckIn => "UpdateCheckIn",
            ActionType::SendReminder => "SendReminder",
            ActionType::UploadDocuments => "UploadDocuments",
            ActionType::UpdateDocuments => "UpdateDocuments",
            ActionType::ArchiveDocuments => "ArchiveDocuments",
            ActionType::DeleteDocument => "DeleteDocument",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CreateDriver" => Some(ActionType::CreateDriver),
            "AddRiskEvent" => Some(ActionType::AddRiskEvent),
            "UpdateDriver" => Some(ActionType::UpdateDriver),
            "CreateCoachingPlan" => Some(ActionType::CreateCoachingPlan),
            "DeleteCoachingPlan" => Some(ActionType::DeleteCoachingPlan),
            "UpdateCheckIn" => Some(ActionType::UpdateCheckIn),
            "SendReminder" => Some(ActionType::SendReminder),
            "UploadDocuments" => Some(ActionType::UploadDocuments),
            "UpdateDocuments" => Some(ActionType::UpdateDocuments),
            "ArchiveDocuments" => Some(ActionType::ArchiveDocuments),
            "DeleteDocument" => Some(ActionType::DeleteDocument),
            _ => None,
        }
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志
    ///
    /// # 参数
    /// - `action_type`: 操作类型
    /// - `entity_id`: 关联实体ID (批量操作可为None)
    /// - `actor`: 操作人
    pub fn new(action_type: ActionType, entity_id: Option<String>, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            entity_id,
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    /// 附加操作参数
    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    /// 附加描述
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_round_trip() {
        for t in [
            ActionType::AddRiskEvent,
            ActionType::UpdateCheckIn,
            ActionType::ArchiveDocuments,
            ActionType::DeleteDocument,
        ] {
            assert_eq!(ActionType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::from_str("Recalc"), None);
    }

    #[test]
    fn test_builder_sets_fields() {
        let log = ActionLog::new(ActionType::DeleteCoachingPlan, Some("P1".into()), "admin")
            .with_detail("cleanup")
            .with_payload(serde_json::json!({"plan_id": "P1"}));

        assert_eq!(log.action_type, "DeleteCoachingPlan");
        assert_eq!(log.entity_id.as_deref(), Some("P1"));
        assert_eq!(log.detail.as_deref(), Some("cleanup"));
        assert!(log.payload_json.is_some());
    }
}
