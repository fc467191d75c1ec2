use chrono::{DateTime, Utc};
use tracing::debug;

use crate::db::repositories::adjustment_repository::AdjustmentRepository;
use crate::db::repositories::score_repository::{ScoreRecordRow, ScoreRepository};
use crate::db::repositories::team_repository::TeamRepository;
use crate::db::repositories::work_repository::WorkRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::adjustment::NewAdjustment;
use crate::models::score::{NewScoreRecord, ScoreRecord, ScoreWindow, UserScoreTotal};
use crate::models::team::{Team, UserProfile};
use crate::models::work::{CompletableWork, WorkCompletion};

/// Everything the scoring engine reads from or appends to. Implementations
/// must be safe to share across threads; the engine never holds a lock
/// across calls.
pub trait ScoreStore: Send + Sync {
    /// `AppError::NotFound` when the work item does not exist.
    fn get_work(&self, work_id: &str) -> AppResult<CompletableWork>;

    fn create_score_record(&self, record: NewScoreRecord) -> AppResult<ScoreRecord>;

    /// Appends several records together. The SQLite store writes them in
    /// one transaction, so either all of them land or none do.
    fn append_score_records(&self, records: Vec<NewScoreRecord>) -> AppResult<Vec<ScoreRecord>> {
        records
            .into_iter()
            .map(|record| self.create_score_record(record))
            .collect()
    }

    /// Primary completion record for the work item, if it was ever scored.
    fn find_completion_record(&self, work_id: &str) -> AppResult<Option<ScoreRecord>>;

    fn list_records_for_work(&self, work_id: &str) -> AppResult<Vec<ScoreRecord>>;

    fn sum_scores_by_user(&self, user_id: &str, since: &DateTime<Utc>) -> AppResult<i64>;

    fn group_scores_by_user(&self, window: &ScoreWindow) -> AppResult<Vec<UserScoreTotal>>;

    fn list_teams_with_members(&self) -> AppResult<Vec<Team>>;

    fn find_user_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>>;

    fn list_user_profiles(&self, user_ids: &[String]) -> AppResult<Vec<UserProfile>>;

    fn list_completed_work_for_users(
        &self,
        user_ids: &[String],
        window: &ScoreWindow,
    ) -> AppResult<Vec<WorkCompletion>>;

    fn list_overdue_work(&self, as_of: &DateTime<Utc>) -> AppResult<Vec<WorkCompletion>>;

    /// Returns `false` when an identical adjustment was already recorded.
    fn record_adjustment(&self, adjustment: &NewAdjustment) -> AppResult<bool>;
}

/// [`ScoreStore`] backed by the SQLite ledger.
#[derive(Clone, Debug)]
pub struct SqliteScoreStore {
    db: DbPool,
}

impl SqliteScoreStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }
}

impl ScoreStore for SqliteScoreStore {
    fn get_work(&self, work_id: &str) -> AppResult<CompletableWork> {
        self.db.with_connection(|conn| {
            WorkRepository::find_by_id(conn, work_id)?.ok_or_else(AppError::not_found)
        })
    }

    fn create_score_record(&self, record: NewScoreRecord) -> AppResult<ScoreRecord> {
        let row = ScoreRecordRow::from_new(uuid::Uuid::new_v4().to_string(), &record)?;
        self.db.with_connection(|conn| {
            ScoreRepository::insert(conn, &row)?;
            debug!(
                target: "app::db",
                record_id = %row.id,
                user_id = %row.user_id,
                kind = %row.kind,
                points = row.points,
                "score record appended"
            );
            row.into_record()
        })
    }

    fn append_score_records(&self, records: Vec<NewScoreRecord>) -> AppResult<Vec<ScoreRecord>> {
        let rows = records
            .iter()
            .map(|record| ScoreRecordRow::from_new(uuid::Uuid::new_v4().to_string(), record))
            .collect::<AppResult<Vec<_>>>()?;

        self.db.with_transaction(|tx| {
            for row in &rows {
                ScoreRepository::insert(tx, row)?;
            }
            debug!(target: "app::db", count = rows.len(), "score records appended");
            rows.iter().cloned().map(ScoreRecordRow::into_record).collect()
        })
    }

    fn find_completion_record(&self, work_id: &str) -> AppResult<Option<ScoreRecord>> {
        self.db
            .with_connection(|conn| ScoreRepository::find_completion_for_work(conn, work_id))
    }

    fn list_records_for_work(&self, work_id: &str) -> AppResult<Vec<ScoreRecord>> {
        self.db
            .with_connection(|conn| ScoreRepository::list_for_work(conn, work_id))
    }

    fn sum_scores_by_user(&self, user_id: &str, since: &DateTime<Utc>) -> AppResult<i64> {
        self.db
            .with_connection(|conn| ScoreRepository::sum_for_user_since(conn, user_id, since))
    }

    fn group_scores_by_user(&self, window: &ScoreWindow) -> AppResult<Vec<UserScoreTotal>> {
        self.db
            .with_connection(|conn| ScoreRepository::group_by_user(conn, window))
    }

    fn list_teams_with_members(&self) -> AppResult<Vec<Team>> {
        self.db.with_connection(TeamRepository::list_teams_with_members)
    }

    fn find_user_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        self.db
            .with_connection(|conn| TeamRepository::find_user(conn, user_id))
    }

    fn list_user_profiles(&self, user_ids: &[String]) -> AppResult<Vec<UserProfile>> {
        self.db
            .with_connection(|conn| TeamRepository::list_profiles(conn, user_ids))
    }

    fn list_completed_work_for_users(
        &self,
        user_ids: &[String],
        window: &ScoreWindow,
    ) -> AppResult<Vec<WorkCompletion>> {
        self.db.with_connection(|conn| {
            WorkRepository::list_completed_for_users(conn, user_ids, window)
        })
    }

    fn list_overdue_work(&self, as_of: &DateTime<Utc>) -> AppResult<Vec<WorkCompletion>> {
        self.db
            .with_connection(|conn| WorkRepository::list_overdue(conn, as_of))
    }

    fn record_adjustment(&self, adjustment: &NewAdjustment) -> AppResult<bool> {
        self.db
            .with_connection(|conn| AdjustmentRepository::insert_if_absent(conn, adjustment))
    }
}
