// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、故障注入 Store、内存文件存储、
//       记录型提醒发送者、API 测试环境
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

use fleet_safety::api::{CoachingApi, DocumentApi, DriverApi};
use fleet_safety::db::{ensure_schema, open_sqlite_connection};
use fleet_safety::domain::coaching::{CoachingPlan, CoachingPlanPatch, NewCoachingPlan};
use fleet_safety::domain::document::{Document, DocumentMetadata, DocumentPatch, DocumentUpload};
use fleet_safety::domain::driver::{Driver, DriverPatch, NewDriver};
use fleet_safety::domain::risk_event::{NewRiskEvent, RiskEvent};
use fleet_safety::domain::types::RiskEventType;
use fleet_safety::engine::bulk::BulkOperationCoordinator;
use fleet_safety::engine::optimistic::LocalMirror;
use fleet_safety::engine::reminder::{CoachingReminder, CoachingReminderSender, NotifyError};
use fleet_safety::logging;
use fleet_safety::repository::{
    ActionLogRepository, DocumentStore, FileStorage, FleetStore, RepositoryError,
    RepositoryResult, SqliteFleetStore,
};

/// 测试用单次存储调用超时
pub const TEST_REQUEST_TIMEOUT: Duration = Duration::from_millis(300);

/// 测试用批量单条超时
pub const TEST_ITEM_TIMEOUT: Duration = Duration::from_millis(500);

pub const ACTOR: &str = "tester";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径非 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn new_driver(name: &str, base: i64) -> NewDriver {
    NewDriver {
        full_name: name.to_string(),
        email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        base_risk_score: base,
    }
}

pub fn risk_event(driver_id: &str, event_type: RiskEventType) -> NewRiskEvent {
    NewRiskEvent {
        driver_id: driver_id.to_string(),
        event_date: date(2024, 5, 1),
        event_type,
        notes: None,
    }
}

pub fn upload(file_name: &str) -> DocumentUpload {
    DocumentUpload {
        file_name: file_name.to_string(),
        driver_id: None,
        category: "Compliance".to_string(),
        doc_type: "Medical Card".to_string(),
        metadata: DocumentMetadata::default(),
        content: file_name.as_bytes().to_vec(),
    }
}

// ==========================================
// FaultyStore - 故障注入 Store
// ==========================================
// 包装 SqliteFleetStore; 按操作名或实体ID注入失败/挂起

#[derive(Default)]
struct Faults {
    fail_ops: HashSet<String>,
    fail_ids: HashSet<String>,
    hang_ops: HashSet<String>,
    slow_fail_once: HashMap<String, Duration>,
}

pub struct FaultyStore {
    inner: Arc<SqliteFleetStore>,
    faults: Mutex<Faults>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteFleetStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &SqliteFleetStore {
        &self.inner
    }

    /// 指定操作一律失败
    pub fn fail_on(&self, op: &str) {
        self.faults.lock().unwrap().fail_ops.insert(op.to_string());
    }

    /// 针对指定实体ID的任何调用失败
    pub fn fail_for_id(&self, id: &str) {
        self.faults.lock().unwrap().fail_ids.insert(id.to_string());
    }

    /// 指定操作永不返回
    pub fn hang_on(&self, op: &str) {
        self.faults.lock().unwrap().hang_ops.insert(op.to_string());
    }

    /// 指定操作的下一次调用延迟后失败 (仅一次)
    pub fn slow_fail_once(&self, op: &str, delay: Duration) {
        self.faults
            .lock()
            .unwrap()
            .slow_fail_once
            .insert(op.to_string(), delay);
    }

    /// 清除所有故障
    pub fn heal(&self) {
        *self.faults.lock().unwrap() = Faults::default();
    }

    /// 操作被调用次数
    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    async fn check(&self, op: &str, id: &str) -> RepositoryResult<()> {
        *self.calls.lock().unwrap().entry(op.to_string()).or_insert(0) += 1;

        let (fail, hang, slow_fail) = {
            let mut faults = self.faults.lock().unwrap();
            (
                faults.fail_ops.contains(op) || faults.fail_ids.contains(id),
                faults.hang_ops.contains(op),
                faults.slow_fail_once.remove(op),
            )
        };
        if let Some(delay) = slow_fail {
            tokio::time::sleep(delay).await;
            return Err(RepositoryError::DatabaseConnectionError(format!(
                "injected slow failure: {} {}",
                op, id
            )));
        }
        if hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if fail {
            return Err(RepositoryError::DatabaseConnectionError(format!(
                "injected failure: {} {}",
                op, id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FleetStore for FaultyStore {
    async fn get_driver_by_id(&self, driver_id: &str) -> RepositoryResult<Option<Driver>> {
        self.check("get_driver_by_id", driver_id).await?;
        self.inner.get_driver_by_id(driver_id).await
    }

    async fn list_drivers(&self) -> RepositoryResult<Vec<Driver>> {
        self.check("list_drivers", "").await?;
        self.inner.list_drivers().await
    }

    async fn insert_driver(&self, driver: NewDriver) -> RepositoryResult<Driver> {
        self.check("insert_driver", "").await?;
        self.inner.insert_driver(driver).await
    }

    async fn update_driver(&self, driver_id: &str, patch: DriverPatch) -> RepositoryResult<Driver> {
        self.check("update_driver", driver_id).await?;
        self.inner.update_driver(driver_id, patch).await
    }

    async fn update_driver_score(&self, driver_id: &str, score: i64) -> RepositoryResult<Driver> {
        self.check("update_driver_score", driver_id).await?;
        self.inner.update_driver_score(driver_id, score).await
    }

    async fn increment_driver_score(
        &self,
        driver_id: &str,
        delta: i64,
    ) -> RepositoryResult<Driver> {
        self.check("increment_driver_score", driver_id).await?;
        self.inner.increment_driver_score(driver_id, delta).await
    }

    async fn add_risk_event(&self, event: NewRiskEvent, points: i64) -> RepositoryResult<RiskEvent> {
        self.check("add_risk_event", &event.driver_id).await?;
        self.inner.add_risk_event(event, points).await
    }

    async fn list_risk_events(&self, driver_id: &str) -> RepositoryResult<Vec<RiskEvent>> {
        self.check("list_risk_events", driver_id).await?;
        self.inner.list_risk_events(driver_id).await
    }

    async fn add_coaching_plan(
        &self,
        driver_id: &str,
        driver_name: &str,
        plan: NewCoachingPlan,
    ) -> RepositoryResult<CoachingPlan> {
        self.check("add_coaching_plan", driver_id).await?;
        self.inner.add_coaching_plan(driver_id, driver_name, plan).await
    }

    async fn get_coaching_plan(&self, plan_id: &str) -> RepositoryResult<Option<CoachingPlan>> {
        self.check("get_coaching_plan", plan_id).await?;
        self.inner.get_coaching_plan(plan_id).await
    }

    async fn list_coaching_plans(
        &self,
        driver_id: Option<&str>,
    ) -> RepositoryResult<Vec<CoachingPlan>> {
        self.check("list_coaching_plans", driver_id.unwrap_or("")).await?;
        self.inner.list_coaching_plans(driver_id).await
    }

    async fn update_coaching_plan(
        &self,
        plan_id: &str,
        patch: CoachingPlanPatch,
    ) -> RepositoryResult<CoachingPlan> {
        self.check("update_coaching_plan", plan_id).await?;
        self.inner.update_coaching_plan(plan_id, patch).await
    }

    async fn delete_coaching_plan(&self, plan_id: &str) -> RepositoryResult<()> {
        self.check("delete_coaching_plan", plan_id).await?;
        self.inner.delete_coaching_plan(plan_id).await
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn list_documents(&self, include_archived: bool) -> RepositoryResult<Vec<Document>> {
        self.check("list_documents", "").await?;
        self.inner.list_documents(include_archived).await
    }

    async fn get_document(&self, document_id: &str) -> RepositoryResult<Option<Document>> {
        self.check("get_document", document_id).await?;
        self.inner.get_document(document_id).await
    }

    async fn insert_document(&self, document: Document) -> RepositoryResult<Document> {
        self.check("insert_document", &document.file_name).await?;
        self.inner.insert_document(document).await
    }

    async fn update_document_metadata(
        &self,
        document_id: &str,
        patch: DocumentPatch,
    ) -> RepositoryResult<Document> {
        self.check("update_document_metadata", document_id).await?;
        self.inner.update_document_metadata(document_id, patch).await
    }

    async fn archive_document(&self, document_id: &str) -> RepositoryResult<Document> {
        self.check("archive_document", document_id).await?;
        self.inner.archive_document(document_id).await
    }

    async fn delete_document(&self, document_id: &str) -> RepositoryResult<()> {
        self.check("delete_document", document_id).await?;
        self.inner.delete_document(document_id).await
    }
}

// ==========================================
// MemoryFileStorage - 内存文件存储
// ==========================================
#[derive(Default)]
pub struct MemoryFileStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    reject_names: Mutex<HashSet<String>>,
}

impl MemoryFileStorage {
    /// 指定文件名的上传失败
    pub fn reject(&self, file_name: &str) {
        self.reject_names.lock().unwrap().insert(file_name.to_string());
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn contains(&self, storage_path: &str) -> bool {
        self.files.lock().unwrap().contains_key(storage_path)
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn put(&self, file_name: &str, content: &[u8]) -> RepositoryResult<String> {
        if self.reject_names.lock().unwrap().contains(file_name) {
            return Err(RepositoryError::StorageError(format!(
                "quota exceeded: {}",
                file_name
            )));
        }
        let path = format!("{}/{}", uuid::Uuid::new_v4(), file_name);
        self.files
            .lock()
            .unwrap()
            .insert(path.clone(), content.to_vec());
        Ok(path)
    }

    async fn remove(&self, storage_path: &str) -> RepositoryResult<()> {
        match self.files.lock().unwrap().remove(storage_path) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::not_found("File", storage_path)),
        }
    }

    async fn download_url(&self, storage_path: &str) -> RepositoryResult<String> {
        if !self.contains(storage_path) {
            return Err(RepositoryError::not_found("File", storage_path));
        }
        Ok(format!("memory://{}", storage_path))
    }
}

// ==========================================
// RecordingReminderSender - 记录型提醒发送者
// ==========================================
#[derive(Default)]
pub struct RecordingReminderSender {
    sent: Mutex<Vec<CoachingReminder>>,
    reject: Mutex<bool>,
    failures: AtomicUsize,
    hang: Mutex<bool>,
}

impl RecordingReminderSender {
    pub fn sent(&self) -> Vec<CoachingReminder> {
        self.sent.lock().unwrap().clone()
    }

    /// 通知服务返回 false
    pub fn set_reject(&self, reject: bool) {
        *self.reject.lock().unwrap() = reject;
    }

    /// 接下来 n 次调用返回错误
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// 调用挂起不返回
    pub fn set_hang(&self, hang: bool) {
        *self.hang.lock().unwrap() = hang;
    }
}

#[async_trait]
impl CoachingReminderSender for RecordingReminderSender {
    async fn send_coaching_reminder(
        &self,
        reminder: &CoachingReminder,
    ) -> Result<bool, NotifyError> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(NotifyError::Unavailable("smtp down".to_string()));
        }
        if *self.hang.lock().unwrap() {
            std::future::pending::<()>().await;
        }
        if *self.reject.lock().unwrap() {
            return Ok(false);
        }
        self.sent.lock().unwrap().push(reminder.clone());
        Ok(true)
    }
}

// ==========================================
// TestEnv - API 测试环境
// ==========================================
pub struct TestEnv {
    _db: NamedTempFile,
    pub db_path: String,
    pub store: Arc<FaultyStore>,
    pub files: Arc<MemoryFileStorage>,
    pub sender: Arc<RecordingReminderSender>,
    pub action_log_repo: Arc<ActionLogRepository>,
    pub driver_api: DriverApi,
    pub coaching_api: CoachingApi,
    pub document_api: DocumentApi,
}

impl TestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::with_concurrency(4)
    }

    pub fn with_concurrency(max_concurrency: usize) -> Result<Self, Box<dyn Error>> {
        logging::init_test();
        let (db, db_path) = create_test_db()?;
        let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));

        let store = Arc::new(FaultyStore::new(Arc::new(SqliteFleetStore::from_connection(
            conn.clone(),
        ))));
        let files = Arc::new(MemoryFileStorage::default());
        let sender = Arc::new(RecordingReminderSender::default());
        let action_log_repo = Arc::new(ActionLogRepository::new(conn));
        let coordinator = BulkOperationCoordinator::new(max_concurrency, TEST_ITEM_TIMEOUT);

        let driver_api = DriverApi::new(
            store.clone(),
            coordinator.clone(),
            action_log_repo.clone(),
            Arc::new(LocalMirror::new()),
            TEST_REQUEST_TIMEOUT,
        );
        let coaching_api = CoachingApi::new(
            store.clone(),
            sender.clone(),
            coordinator.clone(),
            action_log_repo.clone(),
            Arc::new(LocalMirror::new()),
            TEST_REQUEST_TIMEOUT,
            10,
        );
        let document_api = DocumentApi::new(
            store.clone(),
            files.clone(),
            coordinator,
            action_log_repo.clone(),
            Arc::new(LocalMirror::new()),
            TEST_REQUEST_TIMEOUT,
        );

        Ok(Self {
            _db: db,
            db_path,
            store,
            files,
            sender,
            action_log_repo,
            driver_api,
            coaching_api,
            document_api,
        })
    }

    /// 直接在存储端创建驾驶员 (不经过 API)
    pub async fn seed_driver(&self, name: &str, base: i64) -> Driver {
        self.store
            .inner()
            .insert_driver(new_driver(name, base))
            .await
            .unwrap()
    }
}
