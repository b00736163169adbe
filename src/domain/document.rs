// ==========================================
// 车队安全运营系统 - 文档领域模型
// ==========================================
// 用途: 批量上传/批量元数据更新/批量归档
// 说明: 文件内容对核心不透明,只持有存储路径
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// DocumentMetadata - 文档元数据
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub required: bool,                    // 是否必备文档
    pub expiration_date: Option<NaiveDate>, // 到期日
}

// ==========================================
// Document - 文档
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,        // 文档ID
    pub file_name: String,          // 原始文件名
    pub driver_id: Option<String>,  // 所属驾驶员 (可选)
    pub category: String,           // 分类
    pub doc_type: String,           // 文档类型
    pub metadata: DocumentMetadata, // 元数据
    pub storage_path: String,       // 存储路径
    pub archived: bool,             // 是否已归档
    pub uploaded_at: NaiveDateTime, // 上传时间
    pub updated_at: NaiveDateTime,  // 更新时间
}

// ==========================================
// DocumentUpload - 单个上传文件
// ==========================================
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub driver_id: Option<String>,
    pub category: String,
    pub doc_type: String,
    pub metadata: DocumentMetadata,
    pub content: Vec<u8>,
}

// ==========================================
// DocumentPatch - 批量元数据更新
// ==========================================
// 约束: 至少选择一个字段,否则校验失败
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    pub category: Option<String>,
    pub doc_type: Option<String>,
    pub required: Option<bool>,
    pub expiration_date: Option<Option<NaiveDate>>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.doc_type.is_none()
            && self.required.is_none()
            && self.expiration_date.is_none()
    }

    /// 应用补丁 (不落库)
    pub fn apply_to(&self, doc: &Document, now: NaiveDateTime) -> Document {
        let mut next = doc.clone();
        if let Some(category) = &self.category {
            next.category = category.clone();
        }
        if let Some(doc_type) = &self.doc_type {
            next.doc_type = doc_type.clone();
        }
        if let Some(required) = self.required {
            next.metadata.required = required;
        }
        if let Some(expiration) = self.expiration_date {
            next.metadata.expiration_date = expiration;
        }
        next.updated_at = now;
        next
    }
}
