// ==========================================
// 车队安全运营系统 - 驾驶员 API
// ==========================================
// 职责: 驾驶员查询/编辑、风险事件录入、车队风险概览
// 乐观更新: 编辑与录入先写本地镜像, 失败时恢复
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{info, warn};

use crate::api::dto::{BulkSummary, RiskOverview};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::driver::{Driver, DriverPatch, NewDriver};
use crate::domain::risk_event::{NewRiskEvent, RiskEvent};
use crate::domain::types::{PlanStatus, RiskBand};
use crate::engine::bulk::BulkOperationCoordinator;
use crate::engine::error::{bounded, EngineError};
use crate::engine::optimistic::{LocalMirror, OptimisticUpdateGuard};
use crate::engine::risk_ledger::RiskEventLedger;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::fleet_store::FleetStore;

// ==========================================
// DriverApi - 驾驶员 API
// ==========================================
pub struct DriverApi {
    store: Arc<dyn FleetStore>,
    ledger: RiskEventLedger,
    coordinator: BulkOperationCoordinator,
    action_log_repo: Arc<ActionLogRepository>,
    mirror: Arc<LocalMirror<Driver>>,
    request_timeout: Duration,
}

impl DriverApi {
    pub fn new(
        store: Arc<dyn FleetStore>,
        coordinator: BulkOperationCoordinator,
        action_log_repo: Arc<ActionLogRepository>,
        mirror: Arc<LocalMirror<Driver>>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            ledger: RiskEventLedger::new(store.clone(), request_timeout),
            store,
            coordinator,
            action_log_repo,
            mirror,
            request_timeout,
        }
    }

    /// 本地驾驶员镜像
    pub fn mirror(&self) -> &LocalMirror<Driver> {
        &self.mirror
    }

    fn record(&self, log: ActionLog) {
        // 尝试记录ActionLog，失败时只记录警告（不影响主要操作）
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!(error = %e, action_type = %log.action_type, "记录操作日志失败");
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 从存储端拉取驾驶员列表并刷新镜像
    pub async fn list_drivers(&self) -> ApiResult<Vec<Driver>> {
        let drivers = bounded(self.request_timeout, "list_drivers", self.store.list_drivers()).await?;
        self.mirror.replace_all(
            drivers
                .iter()
                .map(|d| (d.driver_id.clone(), d.clone())),
        );
        Ok(drivers)
    }

    /// 查询单个驾驶员 (存储端为准, 同步刷新镜像)
    pub async fn get_driver(&self, driver_id: &str) -> ApiResult<Driver> {
        let driver = bounded(
            self.request_timeout,
            "get_driver_by_id",
            self.store.get_driver_by_id(driver_id),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Driver(id={})不存在", driver_id)))?;

        self.mirror.reconcile(driver_id, driver.clone());
        Ok(driver)
    }

    /// 按风险色带筛选 (基于最新拉取结果)
    pub async fn list_drivers_by_band(&self, band: RiskBand) -> ApiResult<Vec<Driver>> {
        let drivers = self.list_drivers().await?;
        Ok(drivers
            .into_iter()
            .filter(|d| d.risk_band() == band)
            .collect())
    }

    /// 驾驶员风险事件 (最新在前)
    pub async fn list_risk_events(&self, driver_id: &str) -> ApiResult<Vec<RiskEvent>> {
        Ok(self.ledger.list_events(driver_id).await?)
    }

    /// 车队风险概览: 各色带人数与进行中的辅导计划数
    pub async fn risk_overview(&self) -> ApiResult<RiskOverview> {
        let drivers = self.list_drivers().await?;
        let plans = bounded(
            self.request_timeout,
            "list_coaching_plans",
            self.store.list_coaching_plans(None),
        )
        .await?;

        let mut overview = RiskOverview::default();
        for driver in &drivers {
            overview.count_band(driver.risk_band());
        }
        overview.active_plans = plans
            .iter()
            .filter(|p| p.status == PlanStatus::Active)
            .count();
        Ok(overview)
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 新建驾驶员
    pub async fn create_driver(&self, driver: NewDriver, actor: &str) -> ApiResult<Driver> {
        validator::validate_new_driver(&driver)?;

        let created = bounded(
            self.request_timeout,
            "insert_driver",
            self.store.insert_driver(driver),
        )
        .await?;
        self.mirror.upsert(&created.driver_id, created.clone());

        self.record(
            ActionLog::new(ActionType::CreateDriver, Some(created.driver_id.clone()), actor)
                .with_payload(json!({
                    "full_name": created.full_name,
                    "base_risk_score": created.risk_score,
                })),
        );
        info!(driver_id = %created.driver_id, "驾驶员已创建");
        Ok(created)
    }

    /// 编辑驾驶员 (乐观更新)
    ///
    /// # 返回
    /// - Ok(Driver): 存储端返回的驾驶员, 已写回镜像
    /// - Err: 镜像已恢复为编辑前状态
    pub async fn update_driver(
        &self,
        driver_id: &str,
        patch: DriverPatch,
        actor: &str,
    ) -> ApiResult<Driver> {
        validator::validate_driver_patch(&patch)?;

        let current = self.current(driver_id).await?;
        let tentative = current.with_patch(&patch, chrono::Utc::now().naive_utc());
        let payload = json!({
            "full_name": patch.full_name,
            "email": patch.email,
            "status": patch.status.map(|s| s.as_str()),
        });

        let guard = OptimisticUpdateGuard::begin(&self.mirror, driver_id, tentative);
        let persisted = bounded(
            self.request_timeout,
            "update_driver",
            self.store.update_driver(driver_id, patch),
        )
        .await;

        match persisted {
            Ok(saved) => {
                guard.commit_with(saved.clone());
                self.record(
                    ActionLog::new(ActionType::UpdateDriver, Some(driver_id.to_string()), actor)
                        .with_payload(payload),
                );
                Ok(saved)
            }
            Err(e) => {
                warn!(driver_id = %driver_id, error = %e, "驾驶员编辑失败, 已回滚");
                guard.revert();
                Err(e.into())
            }
        }
    }

    /// 录入风险事件 (乐观更新)
    ///
    /// 镜像中的分值先按事件分值增加, 存储端确认后以返回值为准
    ///
    /// # 返回
    /// - Ok((RiskEvent, Driver))
    /// - Err(ScoreNotApplied): 事件已写入但分值未更新, 镜像保持录入前分值
    pub async fn add_risk_event(
        &self,
        event: NewRiskEvent,
        actor: &str,
    ) -> ApiResult<(RiskEvent, Driver)> {
        RiskEventLedger::validate(&event)?;

        let driver_id = event.driver_id.clone();
        let points = RiskEventLedger::points_for(&event.event_type);
        let current = self.current(&driver_id).await?;
        let mut tentative = current.clone();
        tentative.risk_score += points;

        let guard = OptimisticUpdateGuard::begin(&self.mirror, &driver_id, tentative);
        match self.ledger.add_event(event).await {
            Ok((recorded, driver)) => {
                guard.commit_with(driver.clone());
                self.record(
                    ActionLog::new(ActionType::AddRiskEvent, Some(driver_id.clone()), actor)
                        .with_payload(json!({
                            "event_id": recorded.event_id,
                            "event_type": recorded.event_type.label(),
                            "points": recorded.points,
                            "risk_score": driver.risk_score,
                        })),
                );
                Ok((recorded, driver))
            }
            Err(e) => {
                guard.revert();
                if let EngineError::ScoreNotApplied { event_id, .. } = &e {
                    self.record(
                        ActionLog::new(ActionType::AddRiskEvent, Some(driver_id.clone()), actor)
                            .with_payload(json!({ "event_id": event_id, "points": points }))
                            .with_detail("score not applied"),
                    );
                }
                Err(e.into())
            }
        }
    }

    /// 批量录入风险事件
    ///
    /// 每条事件独立录入; 同一驾驶员的多条事件分值由存储端原子累加
    pub async fn bulk_add_risk_events(
        &self,
        events: Vec<NewRiskEvent>,
        actor: &str,
    ) -> ApiResult<BulkSummary<RiskEvent>> {
        if events.is_empty() {
            return Err(ApiError::ValidationError("未选择任何风险事件".to_string()));
        }
        for event in &events {
            RiskEventLedger::validate(event)?;
        }

        let ledger = &self.ledger;
        let mirror = &self.mirror;
        let result = self
            .coordinator
            .execute("bulk_add_risk_events", events, move |event| async move {
                let (recorded, driver) = ledger.add_event(event).await?;
                let driver_id = driver.driver_id.clone();
                mirror.reconcile(&driver_id, driver);
                Ok::<_, EngineError>(recorded)
            })
            .await;

        self.record(
            ActionLog::new(ActionType::AddRiskEvent, None, actor)
                .with_payload(json!({
                    "total": result.total,
                    "succeeded": result.succeeded_count(),
                    "failed_keys": result.failed_keys(),
                }))
                .with_detail("bulk"),
        );
        Ok(BulkSummary::from(result))
    }

    /// 镜像中的驾驶员, 缺失时从存储端拉取
    async fn current(&self, driver_id: &str) -> ApiResult<Driver> {
        match self.mirror.get(driver_id) {
            Some(driver) => Ok(driver),
            None => self.get_driver(driver_id).await,
        }
    }
}
