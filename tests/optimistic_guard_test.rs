// ==========================================
// 乐观更新回滚集成测试
// ==========================================
// 覆盖: 存储失败/超时后本地镜像恢复为操作前状态
// ==========================================

mod test_helpers;

use fleet_safety::api::ApiError;
use fleet_safety::domain::coaching::CheckInField;
use fleet_safety::domain::driver::DriverPatch;
use fleet_safety::domain::types::{CheckInStatus, DriverStatus, PlanStatus, RiskEventType};
use fleet_safety::repository::FleetStore;
use std::time::Duration;
use test_helpers::{date, risk_event, TestEnv, ACTOR};

#[tokio::test]
async fn test_failed_driver_update_restores_mirror() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Ana Lopez", 20).await;
    let before = env.driver_api.get_driver(&driver.driver_id).await.unwrap();
    let revision = env.driver_api.mirror().revision();

    env.store.fail_on("update_driver");
    let err = env
        .driver_api
        .update_driver(
            &driver.driver_id,
            DriverPatch {
                full_name: Some("Ana L. Lopez".into()),
                status: Some(DriverStatus::Suspended),
                ..Default::default()
            },
            ACTOR,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::TransientIo(_)));
    assert_eq!(env.driver_api.mirror().get(&driver.driver_id), Some(before));
    assert!(env.driver_api.mirror().revision() > revision);
}

#[tokio::test]
async fn test_successful_driver_update_keeps_store_value() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Ben Okafor", 20).await;

    let saved = env
        .driver_api
        .update_driver(
            &driver.driver_id,
            DriverPatch {
                status: Some(DriverStatus::Inactive),
                ..Default::default()
            },
            ACTOR,
        )
        .await
        .unwrap();

    assert_eq!(saved.status, DriverStatus::Inactive);
    assert_eq!(env.driver_api.mirror().get(&driver.driver_id), Some(saved));
}

#[tokio::test]
async fn test_hanging_store_times_out_and_rolls_back() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Chen Wei", 45).await;
    let before = env.driver_api.get_driver(&driver.driver_id).await.unwrap();

    env.store.hang_on("add_risk_event");
    let err = env
        .driver_api
        .add_risk_event(risk_event(&driver.driver_id, RiskEventType::Accident), ACTOR)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::TransientIo(_)), "got {:?}", err);
    assert!(err.is_retryable());
    assert_eq!(env.driver_api.mirror().get(&driver.driver_id), Some(before));
}

#[tokio::test]
async fn test_failed_check_in_edit_restores_plan() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Dana Kim", 60).await;
    let plan = env
        .coaching_api
        .create_plan(&driver.driver_id, "Fatigue", date(2024, 1, 1), 1, ACTOR)
        .await
        .unwrap();

    env.store.fail_on("update_coaching_plan");
    let err = env
        .coaching_api
        .set_check_in_field(&plan.plan_id, 1, CheckInField::Status(CheckInStatus::Complete), ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::TransientIo(_)));

    let mirrored = env.coaching_api.mirror().get(&plan.plan_id).unwrap();
    assert_eq!(mirrored, plan);
    assert_eq!(mirrored.status, PlanStatus::Active);

    // 恢复后重试成功
    env.store.heal();
    let saved = env
        .coaching_api
        .set_check_in_field(&plan.plan_id, 1, CheckInField::Status(CheckInStatus::Complete), ACTOR)
        .await
        .unwrap();
    assert_eq!(saved.status, PlanStatus::Completed);
}

#[tokio::test]
async fn test_validation_failure_leaves_mirror_untouched() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Eli Park", 10).await;
    env.driver_api.get_driver(&driver.driver_id).await.unwrap();
    let revision = env.driver_api.mirror().revision();

    let err = env
        .driver_api
        .update_driver(&driver.driver_id, DriverPatch::default(), ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
    assert_eq!(env.driver_api.mirror().revision(), revision);
    assert_eq!(env.store.calls("update_driver"), 0);
}

#[tokio::test]
async fn test_failed_edit_is_not_carried_by_concurrent_edit() {
    let env = TestEnv::new().unwrap();
    let driver = env.seed_driver("Fay Ruiz", 60).await;
    let plan = env
        .coaching_api
        .create_plan(&driver.driver_id, "Defensive Driving", date(2024, 1, 1), 2, ACTOR)
        .await
        .unwrap();

    // 第一次写入 100ms 后失败; 第二次编辑在其进行中发起
    env.store
        .slow_fail_once("update_coaching_plan", Duration::from_millis(100));
    let api = &env.coaching_api;
    let complete_week_1 =
        api.set_check_in_field(&plan.plan_id, 1, CheckInField::Status(CheckInStatus::Complete), ACTOR);
    let note_week_2 = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        api.set_check_in_field(
            &plan.plan_id,
            2,
            CheckInField::Notes(Some("called driver".into())),
            ACTOR,
        )
        .await
    };
    let (first, second) = tokio::join!(complete_week_1, note_week_2);

    assert!(matches!(first, Err(ApiError::TransientIo(_))));
    let saved = second.unwrap();
    assert_eq!(saved.check_ins[0].status, CheckInStatus::Pending);
    assert_eq!(saved.check_ins[1].notes.as_deref(), Some("called driver"));

    let stored = env
        .store
        .inner()
        .get_coaching_plan(&plan.plan_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.check_ins[0].status, CheckInStatus::Pending);
    assert!(stored.check_ins[0].completed_date.is_none());
    assert_eq!(stored.status, PlanStatus::Active);
    assert_eq!(env.coaching_api.mirror().get(&plan.plan_id), Some(stored));
}
