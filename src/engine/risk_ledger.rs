// ==========================================
// 车队安全运营系统 - 风险事件台账
// ==========================================
// 职责: 记录风险事件并累计驾驶员风险分
// 输入: 风险事件录入 (日期/类型/备注)
// 输出: (RiskEvent, 更新后的 Driver)
// ==========================================
// 两次写入:
// 1. 追加风险事件 (分值在此刻按类型派生,之后不可变)
// 2. 存储端原子增量 risk_score += points
// 两次写入之间无事务; 第2步失败时返回 ScoreNotApplied,
// 调用方据此重新拉取驾驶员
// ==========================================

use crate::domain::driver::Driver;
use crate::domain::risk_event::{NewRiskEvent, RiskEvent};
use crate::domain::types::RiskEventType;
use crate::engine::error::{bounded, EngineError, EngineResult};
use crate::repository::fleet_store::FleetStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// ==========================================
// RiskEventLedger
// ==========================================
pub struct RiskEventLedger {
    store: Arc<dyn FleetStore>,
    request_timeout: Duration,
}

impl RiskEventLedger {
    pub fn new(store: Arc<dyn FleetStore>, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    /// 事件分值
    pub fn points_for(event_type: &RiskEventType) -> i64 {
        event_type.points()
    }

    /// 录入前校验 (不发起存储调用)
    pub fn validate(event: &NewRiskEvent) -> EngineResult<()> {
        if event.driver_id.trim().is_empty() {
            return Err(EngineError::Validation("驾驶员ID不能为空".to_string()));
        }
        if let RiskEventType::Other(label) = &event.event_type {
            if label.trim().is_empty() {
                return Err(EngineError::Validation("事件类型不能为空".to_string()));
            }
        }
        Ok(())
    }

    /// 录入风险事件
    ///
    /// # 返回
    /// - Ok((RiskEvent, Driver)): 已写入的事件与存储端返回的驾驶员
    /// - Err(Validation): 录入信息非法
    /// - Err(NotFound): 驾驶员不存在
    /// - Err(TransientIo): 事件写入失败 (未产生任何变更)
    /// - Err(ScoreNotApplied): 事件已写入,分值未生效
    pub async fn add_event(&self, event: NewRiskEvent) -> EngineResult<(RiskEvent, Driver)> {
        Self::validate(&event)?;
        let event = NewRiskEvent {
            event_type: event.event_type.canonical(),
            ..event
        };
        let driver_id = event.driver_id.clone();

        bounded(
            self.request_timeout,
            "get_driver_by_id",
            self.store.get_driver_by_id(&driver_id),
        )
        .await?
        .ok_or_else(|| EngineError::not_found("Driver", &driver_id))?;

        let points = Self::points_for(&event.event_type);
        let recorded = bounded(
            self.request_timeout,
            "add_risk_event",
            self.store.add_risk_event(event, points),
        )
        .await?;

        let driver = match bounded(
            self.request_timeout,
            "increment_driver_score",
            self.store.increment_driver_score(&driver_id, points),
        )
        .await
        {
            Ok(driver) => driver,
            Err(e) => {
                warn!(
                    driver_id = %driver_id,
                    event_id = %recorded.event_id,
                    error = %e,
                    "风险事件已写入, 分值更新失败"
                );
                return Err(EngineError::ScoreNotApplied {
                    event_id: recorded.event_id,
                    reason: e.to_string(),
                });
            }
        };

        info!(
            driver_id = %driver_id,
            event_type = %recorded.event_type,
            points = points,
            risk_score = driver.risk_score,
            band = %driver.risk_band(),
            "风险事件已录入"
        );
        Ok((recorded, driver))
    }

    /// 查询驾驶员风险事件 (最新在前)
    pub async fn list_events(&self, driver_id: &str) -> EngineResult<Vec<RiskEvent>> {
        bounded(
            self.request_timeout,
            "list_risk_events",
            self.store.list_risk_events(driver_id),
        )
        .await
    }
}
