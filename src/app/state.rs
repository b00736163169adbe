// ==========================================
// 车队安全运营系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::api::{ApiError, ApiResult, CoachingApi, DocumentApi, DriverApi};
use crate::config::{ConfigManager, ProfileStore, SafetyConfigReader, SqliteProfileStore, UserProfile};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::driver::{Driver, NewDriver};
use crate::engine::bulk::BulkOperationCoordinator;
use crate::engine::optimistic::LocalMirror;
use crate::engine::reminder::{CoachingReminderSender, NoOpReminderSender};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::document_store::DocumentStore;
use crate::repository::file_storage::{FileStorage, LocalFileStorage};
use crate::repository::fleet_store::FleetStore;
use crate::repository::fleet_store_impl::SqliteFleetStore;

/// 未设置用户档案时的操作人
const SYSTEM_ACTOR: &str = "system";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 驾驶员API
    pub driver_api: Arc<DriverApi>,

    /// 辅导计划API
    pub coaching_api: Arc<CoachingApi>,

    /// 文档API
    pub document_api: Arc<DocumentApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,

    profile_store: Arc<dyn ProfileStore>,
    profile: RwLock<Option<UserProfile>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// 文件存储使用数据库同级的 documents 目录, 通知服务为空操作实现
    pub async fn new(db_path: String) -> Result<Self, String> {
        let storage_root = Path::new(&db_path)
            .parent()
            .map(|p| p.join("documents"))
            .unwrap_or_else(|| PathBuf::from("documents"));

        Self::with_collaborators(
            db_path,
            Arc::new(LocalFileStorage::new(storage_root)),
            Arc::new(NoOpReminderSender),
        )
        .await
    }

    /// 使用外部协作方创建AppState
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - file_storage: 文件存储
    /// - sender: 辅导提醒通知服务
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建表
    /// 2. 读取运行参数
    /// 3. 创建所有API实例
    /// 4. 加载本地用户档案
    pub async fn with_collaborators(
        db_path: String,
        file_storage: Arc<dyn FileStorage>,
        sender: Arc<dyn CoachingReminderSender>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let request_timeout = Duration::from_millis(
            config_manager
                .get_request_timeout_ms()
                .await
                .map_err(|e| format!("读取配置失败: {}", e))?,
        );
        let coordinator = BulkOperationCoordinator::new(
            config_manager
                .get_bulk_max_concurrency()
                .await
                .map_err(|e| format!("读取配置失败: {}", e))?,
            Duration::from_millis(
                config_manager
                    .get_bulk_item_timeout_ms()
                    .await
                    .map_err(|e| format!("读取配置失败: {}", e))?,
            ),
        );
        let min_message_len = config_manager
            .get_reminder_min_message_len()
            .await
            .map_err(|e| format!("读取配置失败: {}", e))?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let sqlite_store = Arc::new(SqliteFleetStore::from_connection(conn.clone()));
        let fleet_store: Arc<dyn FleetStore> = sqlite_store.clone();
        let doc_store: Arc<dyn DocumentStore> = sqlite_store;
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let profile_store: Arc<dyn ProfileStore> = Arc::new(SqliteProfileStore::new(conn));

        // ==========================================
        // 初始化API层
        // ==========================================
        let driver_api = Arc::new(DriverApi::new(
            fleet_store.clone(),
            coordinator.clone(),
            action_log_repo.clone(),
            Arc::new(LocalMirror::new()),
            request_timeout,
        ));
        let coaching_api = Arc::new(CoachingApi::new(
            fleet_store,
            sender,
            coordinator.clone(),
            action_log_repo.clone(),
            Arc::new(LocalMirror::new()),
            request_timeout,
            min_message_len,
        ));
        let document_api = Arc::new(DocumentApi::new(
            doc_store,
            file_storage,
            coordinator,
            action_log_repo.clone(),
            Arc::new(LocalMirror::new()),
            request_timeout,
        ));

        // 启动时加载用户档案; 读取失败按未登录处理
        let profile = match profile_store.get() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("用户档案加载失败: {}", e);
                None
            }
        };

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            driver_api,
            coaching_api,
            document_api,
            config_manager,
            action_log_repo,
            profile_store,
            profile: RwLock::new(profile),
        })
    }

    // ==========================================
    // 驾驶员建档
    // ==========================================

    /// 以配置的默认风险分新建驾驶员, 操作人取当前用户档案
    pub async fn onboard_driver(
        &self,
        full_name: &str,
        email: Option<String>,
    ) -> ApiResult<Driver> {
        let base_risk_score = self
            .config_manager
            .get_default_driver_risk_score()
            .await
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;

        self.driver_api
            .create_driver(
                NewDriver {
                    full_name: full_name.to_string(),
                    email,
                    base_risk_score,
                },
                &self.actor(),
            )
            .await
    }

    // ==========================================
    // 用户档案
    // ==========================================

    pub fn current_profile(&self) -> Option<UserProfile> {
        self.profile.read().ok().and_then(|p| p.clone())
    }

    /// 当前操作人 (写入操作日志)
    pub fn actor(&self) -> String {
        self.current_profile()
            .map(|p| p.actor().to_string())
            .unwrap_or_else(|| SYSTEM_ACTOR.to_string())
    }

    /// 更新用户档案 (立即落库)
    pub fn set_profile(&self, profile: UserProfile) -> Result<(), String> {
        self.profile_store
            .set(&profile)
            .map_err(|e| format!("保存用户档案失败: {}", e))?;
        let mut guard = self
            .profile
            .write()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        *guard = Some(profile);
        Ok(())
    }

    /// 清除用户档案
    pub fn clear_profile(&self) -> Result<(), String> {
        self.profile_store
            .clear()
            .map_err(|e| format!("清除用户档案失败: {}", e))?;
        let mut guard = self
            .profile
            .write()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        *guard = None;
        Ok(())
    }
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 FLEET_SAFETY_DB_PATH
/// 2. 用户数据目录/fleet-safety/fleet_safety.db
/// 3. ./fleet_safety.db
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("FLEET_SAFETY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fleet_safety.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("fleet-safety-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("fleet-safety");

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("fleet_safety.db");
        }
    }

    path.to_string_lossy().to_string()
}
