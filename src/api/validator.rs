// ==========================================
// 车队安全运营系统 - 请求前置校验
// ==========================================
// 职责: 在任何存储调用之前检出调用方错误
// 返回: ApiError::ValidationError (不自动重试)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::document::{DocumentPatch, DocumentUpload};
use crate::domain::driver::{DriverPatch, NewDriver};
use std::collections::HashSet;

/// 校验ID列表: 非空, 无空白ID
///
/// 重复ID会被去重, 保持首次出现的顺序
pub fn validate_id_list(ids: &[String], what: &str) -> ApiResult<Vec<String>> {
    if ids.is_empty() {
        return Err(ApiError::ValidationError(format!("未选择任何{}", what)));
    }

    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ApiError::ValidationError(format!("{}ID不能为空", what)));
        }
        if seen.insert(trimmed.to_string()) {
            unique.push(trimmed.to_string());
        }
    }
    Ok(unique)
}

/// 校验上传文件选择
pub fn validate_file_selection(files: &[DocumentUpload]) -> ApiResult<()> {
    if files.is_empty() {
        return Err(ApiError::ValidationError("未选择任何文件".to_string()));
    }
    for file in files {
        if file.file_name.trim().is_empty() {
            return Err(ApiError::ValidationError("文件名不能为空".to_string()));
        }
        if file.category.trim().is_empty() || file.doc_type.trim().is_empty() {
            return Err(ApiError::ValidationError(format!(
                "文件{}缺少分类或文档类型",
                file.file_name
            )));
        }
    }
    Ok(())
}

/// 校验批量元数据更新: 至少选择一个字段
pub fn validate_document_patch(patch: &DocumentPatch) -> ApiResult<()> {
    if patch.is_empty() {
        return Err(ApiError::ValidationError(
            "批量更新至少需要选择一个字段".to_string(),
        ));
    }
    if matches!(&patch.category, Some(c) if c.trim().is_empty())
        || matches!(&patch.doc_type, Some(t) if t.trim().is_empty())
    {
        return Err(ApiError::ValidationError("分类/文档类型不能为空".to_string()));
    }
    Ok(())
}

/// 校验新建驾驶员
pub fn validate_new_driver(driver: &NewDriver) -> ApiResult<()> {
    if driver.full_name.trim().is_empty() {
        return Err(ApiError::ValidationError("驾驶员姓名不能为空".to_string()));
    }
    if driver.base_risk_score < 0 {
        return Err(ApiError::ValidationError(format!(
            "基础风险分不能为负数: {}",
            driver.base_risk_score
        )));
    }
    validate_email(driver.email.as_deref())
}

/// 校验驾驶员编辑
pub fn validate_driver_patch(patch: &DriverPatch) -> ApiResult<()> {
    if patch.is_empty() {
        return Err(ApiError::ValidationError("未选择任何修改字段".to_string()));
    }
    if matches!(&patch.full_name, Some(n) if n.trim().is_empty()) {
        return Err(ApiError::ValidationError("驾驶员姓名不能为空".to_string()));
    }
    match &patch.email {
        Some(email) => validate_email(email.as_deref()),
        None => Ok(()),
    }
}

fn validate_email(email: Option<&str>) -> ApiResult<()> {
    match email {
        Some(e) if !e.contains('@') || e.trim() != e => Err(ApiError::ValidationError(
            format!("邮箱格式错误: {}", e),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::DocumentMetadata;

    #[test]
    fn test_id_list() {
        assert!(matches!(
            validate_id_list(&[], "文档"),
            Err(ApiError::ValidationError(_))
        ));
        assert!(validate_id_list(&["".to_string()], "文档").is_err());

        let ids = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(validate_id_list(&ids, "文档").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_file_selection() {
        assert!(validate_file_selection(&[]).is_err());

        let upload = DocumentUpload {
            file_name: "license.pdf".into(),
            driver_id: None,
            category: "Licensing".into(),
            doc_type: "CDL".into(),
            metadata: DocumentMetadata::default(),
            content: vec![1, 2, 3],
        };
        assert!(validate_file_selection(&[upload.clone()]).is_ok());

        let untyped = DocumentUpload {
            doc_type: " ".into(),
            ..upload
        };
        assert!(validate_file_selection(&[untyped]).is_err());
    }

    #[test]
    fn test_document_patch_requires_field() {
        assert!(validate_document_patch(&DocumentPatch::default()).is_err());
        assert!(validate_document_patch(&DocumentPatch {
            required: Some(true),
            ..Default::default()
        })
        .is_ok());
        // 清空到期日也算选择了字段
        assert!(validate_document_patch(&DocumentPatch {
            expiration_date: Some(None),
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn test_driver_validation() {
        let driver = NewDriver {
            full_name: "Sam Lee".into(),
            email: Some("sam@example.com".into()),
            base_risk_score: 0,
        };
        assert!(validate_new_driver(&driver).is_ok());
        assert!(validate_new_driver(&NewDriver {
            email: Some("not-an-email".into()),
            ..driver.clone()
        })
        .is_err());
        assert!(validate_new_driver(&NewDriver {
            base_risk_score: -1,
            ..driver
        })
        .is_err());

        assert!(validate_driver_patch(&DriverPatch::default()).is_err());
        assert!(validate_driver_patch(&DriverPatch {
            email: Some(None),
            ..Default::default()
        })
        .is_ok());
    }
}
