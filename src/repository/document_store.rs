// ==========================================
// 车队安全运营系统 - 文档 Store Trait
// ==========================================
// 职责: 文档元数据的数据访问接口
// 说明: 批量更新/批量归档由 BulkOperationCoordinator 扇出到单条接口
// ==========================================

use crate::domain::document::{Document, DocumentPatch};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 查询文档列表
    ///
    /// # 参数
    /// - include_archived: 是否包含已归档文档
    async fn list_documents(&self, include_archived: bool) -> RepositoryResult<Vec<Document>>;

    /// 按ID查询文档
    async fn get_document(&self, document_id: &str) -> RepositoryResult<Option<Document>>;

    /// 写入新文档记录 (文件已上传至存储)
    async fn insert_document(&self, document: Document) -> RepositoryResult<Document>;

    /// 更新单个文档元数据
    ///
    /// # 错误
    /// - NotFound: 文档不存在
    async fn update_document_metadata(
        &self,
        document_id: &str,
        patch: DocumentPatch,
    ) -> RepositoryResult<Document>;

    /// 归档单个文档
    async fn archive_document(&self, document_id: &str) -> RepositoryResult<Document>;

    /// 删除文档记录
    async fn delete_document(&self, document_id: &str) -> RepositoryResult<()>;
}
