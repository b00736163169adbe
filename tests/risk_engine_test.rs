// ==========================================
// 风险评分集成测试
// ==========================================
// 覆盖: 色带边界、分值累加、并发录入、分值未生效
// ==========================================

mod test_helpers;

use fleet_safety::api::ApiError;
use fleet_safety::domain::action_log::ActionType;
use fleet_safety::domain::types::{RiskBand, RiskEventType};
use fleet_safety::engine::classify_risk_band;
use fleet_safety::repository::FleetStore;
use test_helpers::{risk_event, TestEnv, ACTOR};

#[test]
fn test_band_boundaries() {
    assert_eq!(classify_risk_band(0), RiskBand::Green);
    assert_eq!(classify_risk_band(49), RiskBand::Green);
    assert_eq!(classify_risk_band(50), RiskBand::Yellow);
    assert_eq!(classify_risk_band(79), RiskBand::Yellow);
    assert_eq!(classify_risk_band(80), RiskBand::Red);
    assert_eq!(classify_risk_band(250), RiskBand::Red);
}

#[tokio::test]
async fn test_event_points_accumulate_and_cross_bands() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Ana Lopez", 40).await;
    assert_eq!(driver.risk_band(), RiskBand::Green);

    // 40 + 10 = 50 -> YELLOW
    let (event, updated) = env
        .driver_api
        .add_risk_event(risk_event(&driver.driver_id, RiskEventType::Speeding), ACTOR)
        .await
        .unwrap();
    assert_eq!(event.points, 10);
    assert_eq!(updated.risk_score, 50);
    assert_eq!(updated.risk_band(), RiskBand::Yellow);

    // 50 + 20 + 10 = 80 -> RED
    env.driver_api
        .add_risk_event(risk_event(&driver.driver_id, RiskEventType::Accident), ACTOR)
        .await
        .unwrap();
    let (_, updated) = env
        .driver_api
        .add_risk_event(risk_event(&driver.driver_id, RiskEventType::Citation), ACTOR)
        .await
        .unwrap();
    assert_eq!(updated.risk_score, 80);
    assert_eq!(updated.risk_band(), RiskBand::Red);

    // 镜像与存储端一致
    assert_eq!(env.driver_api.mirror().get(&driver.driver_id), Some(updated.clone()));
    let stored = env.driver_api.get_driver(&driver.driver_id).await.unwrap();
    assert_eq!(stored.risk_score, 80);

    let events = env.driver_api.list_risk_events(&driver.driver_id).await.unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events.iter().map(|e| e.points).sum::<i64>(), 40);
}

#[tokio::test]
async fn test_unknown_event_type_uses_default_points() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Ben Okafor", 0).await;

    let (event, updated) = env
        .driver_api
        .add_risk_event(
            risk_event(&driver.driver_id, RiskEventType::other("Tailgating")),
            ACTOR,
        )
        .await
        .unwrap();
    assert_eq!(event.points, 5);
    assert_eq!(updated.risk_score, 5);
}

#[tokio::test]
async fn test_known_label_wrapped_as_other_is_stored_canonically() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Cara Diaz", 0).await;

    let (event, updated) = env
        .driver_api
        .add_risk_event(
            risk_event(&driver.driver_id, RiskEventType::Other("speeding".into())),
            ACTOR,
        )
        .await
        .unwrap();
    assert_eq!(event.event_type, RiskEventType::Speeding);
    assert_eq!(event.points, 10);
    assert_eq!(updated.risk_score, 10);

    let events = env.driver_api.list_risk_events(&driver.driver_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, event.event_type);
    assert_eq!(events[0].points, 10);
}

#[tokio::test]
async fn test_risk_event_for_unknown_driver_is_not_found() {
    let env = TestEnv::new().unwrap();

    let err = env
        .driver_api
        .add_risk_event(risk_event("missing", RiskEventType::Speeding), ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "got {:?}", err);
    assert_eq!(env.store.calls("add_risk_event"), 0);
}

#[tokio::test]
async fn test_concurrent_bulk_events_do_not_lose_points() {
    let env = TestEnv::with_concurrency(8).unwrap();
    let driver = env.seed_driver("Chen Wei", 0).await;

    let events: Vec<_> = (0..12)
        .map(|_| risk_event(&driver.driver_id, RiskEventType::HardBraking))
        .collect();
    let summary = env
        .driver_api
        .bulk_add_risk_events(events, ACTOR)
        .await
        .unwrap();

    assert_eq!(summary.total, 12);
    assert_eq!(summary.succeeded_count(), 12);
    assert_eq!(summary.failed_count(), 0);

    // 每条成功事件都把存储端返回的驾驶员写回镜像
    let mirrored = env.driver_api.mirror().get(&driver.driver_id).unwrap();
    assert!(mirrored.risk_score > 0 && mirrored.risk_score <= 60);

    let stored = env.driver_api.get_driver(&driver.driver_id).await.unwrap();
    assert_eq!(stored.risk_score, 60);
    assert_eq!(stored.risk_band(), RiskBand::Yellow);
}

#[tokio::test]
async fn test_score_not_applied_when_increment_fails() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Dana Kim", 30).await;
    // 预热镜像
    env.driver_api.get_driver(&driver.driver_id).await.unwrap();

    env.store.fail_on("increment_driver_score");
    let err = env
        .driver_api
        .add_risk_event(risk_event(&driver.driver_id, RiskEventType::HosViolation), ACTOR)
        .await
        .unwrap_err();

    let event_id = match &err {
        ApiError::ScoreNotApplied { event_id, .. } => event_id.clone(),
        other => panic!("expected ScoreNotApplied, got {:?}", other),
    };
    assert!(!err.is_retryable());

    // 事件已写入, 分值未变; 镜像与存储端一致
    let events = env.store.inner().list_risk_events(&driver.driver_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_id, event_id);

    let stored = env.store.inner().get_driver_by_id(&driver.driver_id).await.unwrap().unwrap();
    assert_eq!(stored.risk_score, 30);
    assert_eq!(env.driver_api.mirror().get(&driver.driver_id).unwrap().risk_score, 30);

    let logs = env
        .action_log_repo
        .find_by_action_type(ActionType::AddRiskEvent.as_str(), 10)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].detail.as_deref(), Some("score not applied"));
}

#[tokio::test]
async fn test_event_write_failure_changes_nothing() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Eli Park", 55).await;

    env.store.fail_on("add_risk_event");
    let err = env
        .driver_api
        .add_risk_event(risk_event(&driver.driver_id, RiskEventType::Speeding), ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::TransientIo(_)));
    assert!(err.is_retryable());
    assert_eq!(env.store.calls("increment_driver_score"), 0);

    env.store.heal();
    assert_eq!(env.driver_api.get_driver(&driver.driver_id).await.unwrap().risk_score, 55);
    assert!(env.driver_api.list_risk_events(&driver.driver_id).await.unwrap().is_empty());
}
