// ==========================================
// 车队安全运营系统 - 文档 API
// ==========================================
// 职责: 文档批量上传/批量元数据更新/批量归档/删除/下载链接
// 批量: 每个条目独立执行, 失败按条目汇总, 不中断其余条目
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::api::dto::BulkSummary;
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::document::{Document, DocumentPatch, DocumentUpload};
use crate::engine::bulk::{BulkOperationCoordinator, BulkOperationResult};
use crate::engine::error::{bounded, EngineError};
use crate::engine::optimistic::LocalMirror;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::document_store::DocumentStore;
use crate::repository::file_storage::FileStorage;

// ==========================================
// DocumentApi - 文档 API
// ==========================================
pub struct DocumentApi {
    doc_store: Arc<dyn DocumentStore>,
    file_storage: Arc<dyn FileStorage>,
    coordinator: BulkOperationCoordinator,
    action_log_repo: Arc<ActionLogRepository>,
    mirror: Arc<LocalMirror<Document>>,
    request_timeout: Duration,
}

impl DocumentApi {
    pub fn new(
        doc_store: Arc<dyn DocumentStore>,
        file_storage: Arc<dyn FileStorage>,
        coordinator: BulkOperationCoordinator,
        action_log_repo: Arc<ActionLogRepository>,
        mirror: Arc<LocalMirror<Document>>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            doc_store,
            file_storage,
            coordinator,
            action_log_repo,
            mirror,
            request_timeout,
        }
    }

    /// 本地文档镜像
    pub fn mirror(&self) -> &LocalMirror<Document> {
        &self.mirror
    }

    fn record(&self, log: ActionLog) {
        // 尝试记录ActionLog，失败时只记录警告（不影响主要操作）
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!(error = %e, action_type = %log.action_type, "记录操作日志失败");
        }
    }

    fn record_bulk<O>(&self, action_type: ActionType, result: &BulkOperationResult<O>, actor: &str) {
        self.record(ActionLog::new(action_type, None, actor).with_payload(json!({
            "total": result.total,
            "succeeded": result.succeeded_count(),
            "failed": result.failed,
        })));
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询文档列表并刷新镜像
    pub async fn list_documents(&self, include_archived: bool) -> ApiResult<Vec<Document>> {
        let documents = bounded(
            self.request_timeout,
            "list_documents",
            self.doc_store.list_documents(include_archived),
        )
        .await?;

        self.mirror.replace_all(
            documents
                .iter()
                .map(|d| (d.document_id.clone(), d.clone())),
        );
        Ok(documents)
    }

    /// 获取文档下载链接
    pub async fn get_download_url(&self, document_id: &str) -> ApiResult<String> {
        let document = self.require(document_id).await?;
        Ok(bounded(
            self.request_timeout,
            "download_url",
            self.file_storage.download_url(&document.storage_path),
        )
        .await?)
    }

    // ==========================================
    // 批量操作
    // ==========================================

    /// 批量上传文档
    ///
    /// # 返回
    /// - Err(ValidationError): 未选择文件 (未发起任何存储调用)
    /// - Ok(BulkSummary): 每个文件成功或失败之一
    pub async fn upload_documents(
        &self,
        files: Vec<DocumentUpload>,
        actor: &str,
    ) -> ApiResult<BulkSummary<Document>> {
        validator::validate_file_selection(&files)?;

        let result = self
            .coordinator
            .execute("upload_documents", files, move |upload| async move {
                let document = self.upload_one(upload).await?;
                self.mirror.upsert(&document.document_id, document.clone());
                Ok::<_, EngineError>(document)
            })
            .await;

        self.record_bulk(ActionType::UploadDocuments, &result, actor);
        Ok(BulkSummary::from(result))
    }

    /// 批量更新文档元数据
    ///
    /// 重复的文档ID只处理一次, 汇总的 total 为去重后的文档数
    ///
    /// # 返回
    /// - Err(ValidationError): 未选择文档或未选择任何字段
    pub async fn bulk_update_documents(
        &self,
        document_ids: &[String],
        patch: DocumentPatch,
        actor: &str,
    ) -> ApiResult<BulkSummary<Document>> {
        validator::validate_document_patch(&patch)?;
        let ids = validator::validate_id_list(document_ids, "文档")?;

        let patch = &patch;
        let result = self
            .coordinator
            .execute("bulk_update_documents", ids, move |id| async move {
                let updated = bounded(
                    self.request_timeout,
                    "update_document_metadata",
                    self.doc_store.update_document_metadata(&id, patch.clone()),
                )
                .await?;
                self.mirror.reconcile(&id, updated.clone());
                Ok::<_, EngineError>(updated)
            })
            .await;

        self.record_bulk(ActionType::UpdateDocuments, &result, actor);
        Ok(BulkSummary::from(result))
    }

    /// 批量归档文档
    ///
    /// 重复的文档ID只处理一次, 汇总的 total 为去重后的文档数
    pub async fn bulk_archive_documents(
        &self,
        document_ids: &[String],
        actor: &str,
    ) -> ApiResult<BulkSummary<Document>> {
        let ids = validator::validate_id_list(document_ids, "文档")?;

        let result = self
            .coordinator
            .execute("bulk_archive_documents", ids, move |id| async move {
                let archived = bounded(
                    self.request_timeout,
                    "archive_document",
                    self.doc_store.archive_document(&id),
                )
                .await?;
                self.mirror.reconcile(&id, archived.clone());
                Ok::<_, EngineError>(archived)
            })
            .await;

        self.record_bulk(ActionType::ArchiveDocuments, &result, actor);
        Ok(BulkSummary::from(result))
    }

    // ==========================================
    // 单条操作
    // ==========================================

    /// 删除文档 (记录与文件)
    ///
    /// # 返回
    /// - Err(NotFound): 文档不存在
    pub async fn delete_document(&self, document_id: &str, actor: &str) -> ApiResult<()> {
        let document = self.require(document_id).await?;

        bounded(
            self.request_timeout,
            "delete_document",
            self.doc_store.delete_document(document_id),
        )
        .await?;
        self.mirror.remove(document_id);

        // 记录已删除, 文件残留只影响存储占用
        if let Err(e) = bounded(
            self.request_timeout,
            "remove_file",
            self.file_storage.remove(&document.storage_path),
        )
        .await
        {
            warn!(document_id = %document_id, error = %e, "文档文件删除失败");
        }

        self.record(
            ActionLog::new(ActionType::DeleteDocument, Some(document_id.to_string()), actor)
                .with_payload(json!({ "file_name": document.file_name })),
        );
        info!(document_id = %document_id, "文档已删除");
        Ok(())
    }

    async fn require(&self, document_id: &str) -> ApiResult<Document> {
        bounded(
            self.request_timeout,
            "get_document",
            self.doc_store.get_document(document_id),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Document(id={})不存在", document_id)))
    }

    /// 上传单个文件: 写文件 -> 写记录; 记录写入失败时清理文件
    async fn upload_one(&self, upload: DocumentUpload) -> Result<Document, EngineError> {
        let storage_path = bounded(
            self.request_timeout,
            "put_file",
            self.file_storage.put(&upload.file_name, &upload.content),
        )
        .await?;

        let now = Utc::now().naive_utc();
        let document = Document {
            document_id: uuid::Uuid::new_v4().to_string(),
            file_name: upload.file_name,
            driver_id: upload.driver_id,
            category: upload.category,
            doc_type: upload.doc_type,
            metadata: upload.metadata,
            storage_path: storage_path.clone(),
            archived: false,
            uploaded_at: now,
            updated_at: now,
        };

        match bounded(
            self.request_timeout,
            "insert_document",
            self.doc_store.insert_document(document),
        )
        .await
        {
            Ok(saved) => Ok(saved),
            Err(e) => {
                if let Err(cleanup) = self.file_storage.remove(&storage_path).await {
                    warn!(storage_path = %storage_path, error = %cleanup, "孤立文件清理失败");
                }
                Err(e)
            }
        }
    }
}
