// Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tempfile::TempDir;
use work_score_engine::db::repositories::team_repository::TeamRepository;
use work_score_engine::db::repositories::work_repository::WorkRepository;
use work_score_engine::db::DbPool;
use work_score_engine::models::settings::ScoringConfig;
use work_score_engine::models::team::{Team, UserProfile};
use work_score_engine::models::work::{CompletableWork, WorkLog, WorkStatus};
use work_score_engine::services::score_service::ScoreService;
use work_score_engine::services::score_store::{ScoreStore, SqliteScoreStore};
use work_score_engine::utils::time::local_date_start;

pub struct TestEnv {
    pub dir: TempDir,
    pub pool: DbPool,
    pub store: Arc<dyn ScoreStore>,
}

pub fn setup_test_environment() -> TestEnv {
    let dir = tempfile::tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("scores.sqlite")).expect("db pool");
    let store: Arc<dyn ScoreStore> = Arc::new(SqliteScoreStore::new(pool.clone()));
    TestEnv { dir, pool, store }
}

impl TestEnv {
    pub fn add_team(&self, id: &str, name: &str) {
        self.pool
            .with_connection(|conn| {
                TeamRepository::insert_team(
                    conn,
                    &Team {
                        id: id.to_string(),
                        name: name.to_string(),
                        color: Some("#3366ff".to_string()),
                        member_ids: Vec::new(),
                    },
                )
            })
            .expect("insert team");
    }

    pub fn add_user(&self, id: &str, team_id: Option<&str>) {
        self.pool
            .with_connection(|conn| {
                TeamRepository::insert_user(
                    conn,
                    &UserProfile {
                        id: id.to_string(),
                        display_name: display_name(id),
                        team_id: team_id.map(str::to_string),
                        team_name: None,
                    },
                )
            })
            .expect("insert user");
    }

    pub fn add_work(&self, work: &CompletableWork) {
        self.pool
            .with_connection(|conn| WorkRepository::insert_work(conn, work))
            .expect("insert work");
    }

    pub fn mark_completed(&self, work_id: &str, completed_at: DateTime<Utc>) {
        self.pool
            .with_connection(|conn| {
                WorkRepository::mark_completed(conn, work_id, &completed_at, None)
            })
            .expect("mark completed");
    }
}

/// Default-config scorer whose ledger writes are stamped `at`.
pub fn scorer_at(env: &TestEnv, at: DateTime<Utc>) -> ScoreService {
    ScoreService::new(env.store.clone(), ScoringConfig::default()).with_clock(Arc::new(move || at))
}

pub fn display_name(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Noon on a fixed local day; every scoring flow happens on it.
pub fn scoring_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
}

pub fn midday() -> DateTime<Utc> {
    local_date_start(scoring_day()) + Duration::hours(12)
}

/// Difficulty 3, medium priority, no deadline, no subtasks: scores exactly
/// the base score.
pub fn neutral_work(id: &str, owner: &str) -> CompletableWork {
    CompletableWork {
        id: id.to_string(),
        title: format!("Work {id}"),
        owner_id: owner.to_string(),
        collaborator_ids: Vec::new(),
        difficulty: 3,
        priority: "medium".to_string(),
        status: WorkStatus::InProgress,
        deadline: None,
        started_at: None,
        finished_at: None,
        quality: None,
        completed_at: None,
        subtasks: Vec::new(),
        work_logs: Vec::new(),
        created_at: midday() - Duration::days(5),
    }
}

pub fn log(work_id: &str, user_id: &str, minutes: i64) -> WorkLog {
    WorkLog {
        id: uuid::Uuid::new_v4().to_string(),
        work_id: work_id.to_string(),
        user_id: user_id.to_string(),
        minutes,
        logged_at: midday() - Duration::hours(2),
    }
}
