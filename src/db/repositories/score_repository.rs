use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::score::{
    NewScoreRecord, ScoreBreakdown, ScoreKind, ScoreRecord, ScoreWindow, UserScoreTotal,
};
use crate::utils::time::{parse_timestamp, to_storage};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        user_id,
        work_id,
        kind,
        points,
        breakdown,
        cap_exceeded,
        created_at
    FROM score_records
"#;

#[derive(Debug, Clone)]
pub struct ScoreRecordRow {
    pub id: String,
    pub user_id: String,
    pub work_id: Option<String>,
    pub kind: String,
    pub points: i64,
    pub breakdown: String,
    pub cap_exceeded: bool,
    pub created_at: String,
}

impl ScoreRecordRow {
    pub fn from_new(id: String, input: &NewScoreRecord) -> AppResult<Self> {
        Ok(Self {
            id,
            user_id: input.user_id.clone(),
            work_id: input.work_id.clone(),
            kind: input.breakdown.kind().as_str().to_string(),
            points: input.points,
            breakdown: serde_json::to_string(&input.breakdown)?,
            cap_exceeded: input.cap_exceeded,
            created_at: to_storage(&input.created_at),
        })
    }

    pub fn into_record(self) -> AppResult<ScoreRecord> {
        let breakdown: ScoreBreakdown = serde_json::from_str(&self.breakdown)?;
        Ok(ScoreRecord {
            id: self.id,
            user_id: self.user_id,
            work_id: self.work_id,
            points: self.points,
            breakdown,
            cap_exceeded: self.cap_exceeded,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl TryFrom<&Row<'_>> for ScoreRecordRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            work_id: row.get("work_id")?,
            kind: row.get("kind")?,
            points: row.get("points")?,
            breakdown: row.get("breakdown")?,
            cap_exceeded: row.get::<_, i64>("cap_exceeded")? != 0,
            created_at: row.get("created_at")?,
        })
    }
}

/// Ledger access. There is deliberately no update or delete.
pub struct ScoreRepository;

impl ScoreRepository {
    pub fn insert(conn: &Connection, row: &ScoreRecordRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO score_records (
                    id,
                    user_id,
                    work_id,
                    kind,
                    points,
                    breakdown,
                    cap_exceeded,
                    created_at
                ) VALUES (
                    :id,
                    :user_id,
                    :work_id,
                    :kind,
                    :points,
                    :breakdown,
                    :cap_exceeded,
                    :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":user_id": &row.user_id,
                ":work_id": &row.work_id,
                ":kind": &row.kind,
                ":points": row.points,
                ":breakdown": &row.breakdown,
                ":cap_exceeded": row.cap_exceeded as i64,
                ":created_at": &row.created_at,
            },
        )?;
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<ScoreRecord>> {
        let sql = format!("{BASE_SELECT} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! {":id": id}, |row| ScoreRecordRow::try_from(row))
            .optional()?;
        row.map(|row| row.into_record()).transpose()
    }

    /// First primary completion record written for a work item.
    pub fn find_completion_for_work(
        conn: &Connection,
        work_id: &str,
    ) -> AppResult<Option<ScoreRecord>> {
        let sql = format!(
            "{BASE_SELECT} WHERE work_id = :work_id AND kind = :kind ORDER BY created_at, rowid LIMIT 1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(
                named_params! {
                    ":work_id": work_id,
                    ":kind": ScoreKind::Completion.as_str(),
                },
                |row| ScoreRecordRow::try_from(row),
            )
            .optional()?;
        row.map(|row| row.into_record()).transpose()
    }

    pub fn list_for_work(conn: &Connection, work_id: &str) -> AppResult<Vec<ScoreRecord>> {
        let sql = format!("{BASE_SELECT} WHERE work_id = :work_id ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! {":work_id": work_id}, |row| {
                ScoreRecordRow::try_from(row)
            })?
            .map(|row| row.map_err(AppError::from).and_then(|row| row.into_record()))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_for_user(
        conn: &Connection,
        user_id: &str,
        window: &ScoreWindow,
    ) -> AppResult<Vec<ScoreRecord>> {
        let sql = format!(
            "{BASE_SELECT} WHERE user_id = :user_id AND created_at >= :start AND created_at < :end ORDER BY created_at, rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":user_id": user_id,
                    ":start": to_storage(&window.start),
                    ":end": to_storage(&window.end),
                },
                |row| ScoreRecordRow::try_from(row),
            )?
            .map(|row| row.map_err(AppError::from).and_then(|row| row.into_record()))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn sum_for_user_since(
        conn: &Connection,
        user_id: &str,
        since: &DateTime<Utc>,
    ) -> AppResult<i64> {
        let total: i64 = conn.query_row(
            r#"
                SELECT COALESCE(SUM(points), 0)
                FROM score_records
                WHERE user_id = :user_id AND created_at >= :since
            "#,
            named_params! {
                ":user_id": user_id,
                ":since": to_storage(since),
            },
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Per-user sums inside the window, highest first; equal sums keep the
    /// order in which the users first appeared in the ledger.
    pub fn group_by_user(conn: &Connection, window: &ScoreWindow) -> AppResult<Vec<UserScoreTotal>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT
                    user_id,
                    COALESCE(SUM(points), 0) AS total_points,
                    COUNT(DISTINCT work_id) AS work_count,
                    MIN(rowid) AS first_seen
                FROM score_records
                WHERE created_at >= :start AND created_at < :end
                GROUP BY user_id
                ORDER BY total_points DESC, first_seen ASC
            "#,
        )?;
        let totals = stmt
            .query_map(
                named_params! {
                    ":start": to_storage(&window.start),
                    ":end": to_storage(&window.end),
                },
                |row| {
                    Ok(UserScoreTotal {
                        user_id: row.get("user_id")?,
                        points: row.get("total_points")?,
                        work_count: row.get("work_count")?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(totals)
    }
}
