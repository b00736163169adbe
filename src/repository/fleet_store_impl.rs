// ==========================================
// 车队安全运营系统 - SQLite Store 实现
// ==========================================
// 职责: FleetStore / DocumentStore 的参考实现
// 红线: 不含业务逻辑,只负责数据映射
// 说明: 共享连接 Arc<Mutex<Connection>>,同一实体的写入按调用顺序串行
// ==========================================

mod documents;

use crate::db::open_sqlite_connection;
use crate::domain::coaching::{CheckIn, CoachingPlan, CoachingPlanPatch, NewCoachingPlan};
use crate::domain::driver::{Driver, DriverPatch, NewDriver};
use crate::domain::risk_event::{NewRiskEvent, RiskEvent};
use crate::domain::types::{DriverStatus, PlanStatus, RiskEventType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::fleet_store::FleetStore;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const DRIVER_COLUMNS: &str =
    "driver_id, full_name, email, status, risk_score, created_at, updated_at";
const RISK_EVENT_COLUMNS: &str =
    "event_id, driver_id, event_date, event_type, points, notes, created_at";
const PLAN_COLUMNS: &str = "plan_id, driver_id, driver_name, plan_type, start_date, \
     duration_weeks, status, check_ins_json, created_at, updated_at";

// ==========================================
// SqliteFleetStore
// ==========================================
pub struct SqliteFleetStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFleetStore {
    /// 按数据库路径创建 (并确保 schema 存在)
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(crate) fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn select_driver(conn: &Connection, driver_id: &str) -> RepositoryResult<Option<Driver>> {
        let sql = format!("SELECT {} FROM driver WHERE driver_id = ?1", DRIVER_COLUMNS);
        Ok(conn
            .query_row(&sql, params![driver_id], map_driver_row)
            .optional()?)
    }

    fn select_plan(conn: &Connection, plan_id: &str) -> RepositoryResult<Option<CoachingPlan>> {
        let sql = format!("SELECT {} FROM coaching_plan WHERE plan_id = ?1", PLAN_COLUMNS);
        Ok(conn
            .query_row(&sql, params![plan_id], map_plan_row)
            .optional()?)
    }
}

// ==========================================
// 行映射
// ==========================================

fn json_column_error(idx: usize, err: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn map_driver_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        driver_id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        status: DriverStatus::from_str(&row.get::<_, String>(3)?),
        risk_score: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_risk_event_row(row: &Row<'_>) -> rusqlite::Result<RiskEvent> {
    Ok(RiskEvent {
        event_id: row.get(0)?,
        driver_id: row.get(1)?,
        event_date: row.get(2)?,
        event_type: RiskEventType::from_label(&row.get::<_, String>(3)?),
        points: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_plan_row(row: &Row<'_>) -> rusqlite::Result<CoachingPlan> {
    let check_ins_json: String = row.get(7)?;
    let check_ins: Vec<CheckIn> =
        serde_json::from_str(&check_ins_json).map_err(|e| json_column_error(7, e))?;

    Ok(CoachingPlan {
        plan_id: row.get(0)?,
        driver_id: row.get(1)?,
        driver_name: row.get(2)?,
        plan_type: row.get(3)?,
        start_date: row.get(4)?,
        duration_weeks: row.get(5)?,
        status: PlanStatus::from_str(&row.get::<_, String>(6)?),
        check_ins,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

// ==========================================
// FleetStore 实现
// ==========================================
#[async_trait]
impl FleetStore for SqliteFleetStore {
    async fn get_driver_by_id(&self, driver_id: &str) -> RepositoryResult<Option<Driver>> {
        let conn = self.get_conn()?;
        Self::select_driver(&conn, driver_id)
    }

    async fn list_drivers(&self) -> RepositoryResult<Vec<Driver>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM driver ORDER BY full_name, driver_id", DRIVER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let drivers = stmt
            .query_map([], map_driver_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(drivers)
    }

    async fn insert_driver(&self, driver: NewDriver) -> RepositoryResult<Driver> {
        let now = Utc::now().naive_utc();
        let record = Driver {
            driver_id: Uuid::new_v4().to_string(),
            full_name: driver.full_name,
            email: driver.email,
            status: DriverStatus::Active,
            risk_score: driver.base_risk_score,
            created_at: now,
            updated_at: now,
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO driver (driver_id, full_name, email, status, risk_score, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.driver_id,
                record.full_name,
                record.email,
                record.status.as_str(),
                record.risk_score,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(record)
    }

    async fn update_driver(&self, driver_id: &str, patch: DriverPatch) -> RepositoryResult<Driver> {
        let conn = self.get_conn()?;
        let current = Self::select_driver(&conn, driver_id)?
            .ok_or_else(|| RepositoryError::not_found("Driver", driver_id))?;
        let next = current.with_patch(&patch, Utc::now().naive_utc());

        conn.execute(
            r#"
            UPDATE driver SET full_name = ?1, email = ?2, status = ?3, updated_at = ?4
            WHERE driver_id = ?5
            "#,
            params![
                next.full_name,
                next.email,
                next.status.as_str(),
                next.updated_at,
                driver_id,
            ],
        )?;
        Ok(next)
    }

    async fn update_driver_score(&self, driver_id: &str, score: i64) -> RepositoryResult<Driver> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE driver SET risk_score = ?1, updated_at = ?2 WHERE driver_id = ?3",
            params![score, Utc::now().naive_utc(), driver_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Driver", driver_id));
        }
        Self::select_driver(&conn, driver_id)?
            .ok_or_else(|| RepositoryError::not_found("Driver", driver_id))
    }

    async fn increment_driver_score(
        &self,
        driver_id: &str,
        delta: i64,
    ) -> RepositoryResult<Driver> {
        let conn = self.get_conn()?;
        // 存储端原子增量
        let rows = conn.execute(
            "UPDATE driver SET risk_score = risk_score + ?1, updated_at = ?2 WHERE driver_id = ?3",
            params![delta, Utc::now().naive_utc(), driver_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Driver", driver_id));
        }
        Self::select_driver(&conn, driver_id)?
            .ok_or_else(|| RepositoryError::not_found("Driver", driver_id))
    }

    async fn add_risk_event(&self, event: NewRiskEvent, points: i64) -> RepositoryResult<RiskEvent> {
        let record = RiskEvent {
            event_id: Uuid::new_v4().to_string(),
            driver_id: event.driver_id,
            event_date: event.event_date,
            event_type: event.event_type,
            points,
            notes: event.notes,
            created_at: Utc::now().naive_utc(),
        };

        let conn = self.get_conn()?;
        let result = conn.execute(
            r#"
            INSERT INTO risk_event (event_id, driver_id, event_date, event_type, points, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.event_id,
                record.driver_id,
                record.event_date,
                record.event_type.label(),
                record.points,
                record.notes,
                record.created_at,
            ],
        );

        match result.map_err(RepositoryError::from) {
            Ok(_) => Ok(record),
            Err(RepositoryError::ForeignKeyViolation(_)) => {
                Err(RepositoryError::not_found("Driver", &record.driver_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn list_risk_events(&self, driver_id: &str) -> RepositoryResult<Vec<RiskEvent>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM risk_event WHERE driver_id = ?1 ORDER BY created_at DESC, event_date DESC",
            RISK_EVENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params![driver_id], map_risk_event_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    async fn add_coaching_plan(
        &self,
        driver_id: &str,
        driver_name: &str,
        plan: NewCoachingPlan,
    ) -> RepositoryResult<CoachingPlan> {
        let now = Utc::now().naive_utc();
        let record = CoachingPlan {
            plan_id: Uuid::new_v4().to_string(),
            driver_id: driver_id.to_string(),
            driver_name: driver_name.to_string(),
            plan_type: plan.plan_type,
            start_date: plan.start_date,
            duration_weeks: plan.duration_weeks,
            status: plan.status,
            check_ins: plan.check_ins,
            created_at: now,
            updated_at: now,
        };
        let check_ins_json = serde_json::to_string(&record.check_ins)?;

        let conn = self.get_conn()?;
        let result = conn.execute(
            r#"
            INSERT INTO coaching_plan (
                plan_id, driver_id, driver_name, plan_type, start_date,
                duration_weeks, status, check_ins_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.plan_id,
                record.driver_id,
                record.driver_name,
                record.plan_type,
                record.start_date,
                record.duration_weeks,
                record.status.as_str(),
                check_ins_json,
                record.created_at,
                record.updated_at,
            ],
        );

        match result.map_err(RepositoryError::from) {
            Ok(_) => Ok(record),
            Err(RepositoryError::ForeignKeyViolation(_)) => {
                Err(RepositoryError::not_found("Driver", driver_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn get_coaching_plan(&self, plan_id: &str) -> RepositoryResult<Option<CoachingPlan>> {
        let conn = self.get_conn()?;
        Self::select_plan(&conn, plan_id)
    }

    async fn list_coaching_plans(
        &self,
        driver_id: Option<&str>,
    ) -> RepositoryResult<Vec<CoachingPlan>> {
        let conn = self.get_conn()?;
        let plans = match driver_id {
            Some(driver_id) => {
                let sql = format!(
                    "SELECT {} FROM coaching_plan WHERE driver_id = ?1 ORDER BY start_date DESC, created_at DESC",
                    PLAN_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![driver_id], map_plan_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM coaching_plan ORDER BY start_date DESC, created_at DESC",
                    PLAN_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], map_plan_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(plans)
    }

    async fn update_coaching_plan(
        &self,
        plan_id: &str,
        patch: CoachingPlanPatch,
    ) -> RepositoryResult<CoachingPlan> {
        let check_ins_json = serde_json::to_string(&patch.check_ins)?;
        let conn = self.get_conn()?;

        // 打卡列表与状态同一条 UPDATE 写入
        let rows = conn.execute(
            r#"
            UPDATE coaching_plan SET status = ?1, check_ins_json = ?2, updated_at = ?3
            WHERE plan_id = ?4
            "#,
            params![
                patch.status.as_str(),
                check_ins_json,
                Utc::now().naive_utc(),
                plan_id,
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("CoachingPlan", plan_id));
        }

        Self::select_plan(&conn, plan_id)?
            .ok_or_else(|| RepositoryError::not_found("CoachingPlan", plan_id))
    }

    async fn delete_coaching_plan(&self, plan_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM coaching_plan WHERE plan_id = ?1",
            params![plan_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("CoachingPlan", plan_id));
        }
        Ok(())
    }
}
