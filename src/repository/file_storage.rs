// ==========================================
// 车队安全运营系统 - 文件存储接口
// ==========================================
// 职责: 接收不透明的二进制内容,返回存储路径/下载链接
// 红线: 核心从不解析文件内容
// 实现者: LocalFileStorage（本地目录,file:// 链接）
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// 保存文件内容
    ///
    /// # 返回
    /// - Ok(storage_path): 存储路径 (相对存储根目录)
    async fn put(&self, file_name: &str, content: &[u8]) -> RepositoryResult<String>;

    /// 删除已存储文件
    async fn remove(&self, storage_path: &str) -> RepositoryResult<()>;

    /// 生成下载链接
    async fn download_url(&self, storage_path: &str) -> RepositoryResult<String>;
}

// ==========================================
// LocalFileStorage - 本地目录存储
// ==========================================
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, storage_path: &str) -> RepositoryResult<PathBuf> {
        let relative = Path::new(storage_path);
        // 禁止越出存储根目录
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(RepositoryError::FieldValueError {
                field: "storage_path".to_string(),
                message: format!("非法存储路径: {}", storage_path),
            });
        }
        Ok(self.root.join(relative))
    }
}

/// 文件名清洗: 仅保留字母数字与 `.-_`
fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, file_name: &str, content: &[u8]) -> RepositoryResult<String> {
        let storage_path = format!("{}/{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let full_path = self.resolve(&storage_path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
        }
        tokio::fs::write(&full_path, content)
            .await
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?;

        tracing::debug!(storage_path = %storage_path, bytes = content.len(), "文件已存储");
        Ok(storage_path)
    }

    async fn remove(&self, storage_path: &str) -> RepositoryResult<()> {
        let full_path = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RepositoryError::not_found("StoredFile", storage_path))
            }
            Err(e) => Err(RepositoryError::StorageError(e.to_string())),
        }
    }

    async fn download_url(&self, storage_path: &str) -> RepositoryResult<String> {
        let full_path = self.resolve(storage_path)?;
        if !tokio::fs::try_exists(&full_path)
            .await
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?
        {
            return Err(RepositoryError::not_found("StoredFile", storage_path));
        }
        Ok(format!("file://{}", full_path.display()))
    }
}
