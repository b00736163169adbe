use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::ensure_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = ActionLogRepository::new(setup_test_db());

    let log = ActionLog::new(ActionType::AddRiskEvent, Some("DRV1".into()), "dispatcher")
        .with_payload(serde_json::json!({"points": 10}));
    let id = repo.insert(&log).unwrap();
    assert_eq!(id, log.action_id);

    let found = repo.find_by_id(&id).unwrap().unwrap();
    assert_eq!(found.action_type, "AddRiskEvent");
    assert_eq!(found.entity_id.as_deref(), Some("DRV1"));
    assert_eq!(found.payload_json, Some(serde_json::json!({"points": 10})));

    assert!(repo.find_by_id("missing").unwrap().is_none());
}

#[test]
fn test_find_by_entity_and_type() {
    let repo = ActionLogRepository::new(setup_test_db());

    repo.insert(&ActionLog::new(ActionType::UpdateCheckIn, Some("P1".into()), "coach"))
        .unwrap();
    repo.insert(&ActionLog::new(ActionType::UpdateCheckIn, Some("P1".into()), "coach"))
        .unwrap();
    repo.insert(&ActionLog::new(ActionType::ArchiveDocuments, None, "admin"))
        .unwrap();

    assert_eq!(repo.find_by_entity_id("P1").unwrap().len(), 2);
    assert_eq!(repo.find_by_action_type("ArchiveDocuments", 10).unwrap().len(), 1);
    assert_eq!(repo.find_recent(2).unwrap().len(), 2);
}
