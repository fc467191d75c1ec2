use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::score::ScoreWindow;
use crate::models::work::{
    CompletableWork, SessionStatus, Subtask, WorkCompletion, WorkLog, WorkSession, WorkStatus,
};
use crate::utils::time::{parse_timestamp, parse_timestamp_opt, to_storage, to_storage_opt};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        title,
        owner_id,
        status,
        difficulty,
        priority,
        deadline,
        started_at,
        finished_at,
        quality,
        completed_at,
        created_at,
        updated_at
    FROM works
"#;

#[derive(Debug, Clone)]
pub struct WorkRow {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub status: String,
    pub difficulty: i64,
    pub priority: String,
    pub deadline: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub quality: Option<i64>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl WorkRow {
    pub fn from_record(record: &CompletableWork) -> Self {
        let created_at = to_storage(&record.created_at);
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            owner_id: record.owner_id.clone(),
            status: record.status.as_str().to_string(),
            difficulty: record.difficulty,
            priority: record.priority.clone(),
            deadline: to_storage_opt(record.deadline.as_ref()),
            started_at: to_storage_opt(record.started_at.as_ref()),
            finished_at: to_storage_opt(record.finished_at.as_ref()),
            quality: record.quality,
            completed_at: to_storage_opt(record.completed_at.as_ref()),
            updated_at: created_at.clone(),
            created_at,
        }
    }

    /// Children are attached by the caller.
    pub fn into_record(self) -> AppResult<CompletableWork> {
        Ok(CompletableWork {
            id: self.id,
            title: self.title,
            owner_id: self.owner_id,
            collaborator_ids: Vec::new(),
            difficulty: self.difficulty,
            priority: self.priority,
            status: WorkStatus::parse(&self.status),
            deadline: parse_timestamp_opt(self.deadline.as_deref())?,
            started_at: parse_timestamp_opt(self.started_at.as_deref())?,
            finished_at: parse_timestamp_opt(self.finished_at.as_deref())?,
            quality: self.quality,
            completed_at: parse_timestamp_opt(self.completed_at.as_deref())?,
            subtasks: Vec::new(),
            work_logs: Vec::new(),
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl TryFrom<&Row<'_>> for WorkRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            owner_id: row.get("owner_id")?,
            status: row.get("status")?,
            difficulty: row.get("difficulty")?,
            priority: row.get("priority")?,
            deadline: row.get("deadline")?,
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
            quality: row.get("quality")?,
            completed_at: row.get("completed_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
struct SessionRow {
    id: String,
    subtask_id: String,
    user_id: String,
    accumulated_seconds: i64,
    pause_count: i64,
    status: String,
}

impl TryFrom<&Row<'_>> for SessionRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            subtask_id: row.get("subtask_id")?,
            user_id: row.get("user_id")?,
            accumulated_seconds: row.get("accumulated_seconds")?,
            pause_count: row.get("pause_count")?,
            status: row.get("status")?,
        })
    }
}

impl SessionRow {
    fn into_record(self) -> WorkSession {
        WorkSession {
            id: self.id,
            subtask_id: self.subtask_id,
            user_id: self.user_id,
            accumulated_seconds: self.accumulated_seconds.max(0),
            pause_count: self.pause_count.max(0),
            status: SessionStatus::parse(&self.status),
        }
    }
}

pub struct WorkRepository;

impl WorkRepository {
    /// Inserts the work item together with its collaborators, subtasks,
    /// sessions and logs.
    pub fn insert_work(conn: &Connection, work: &CompletableWork) -> AppResult<()> {
        let row = WorkRow::from_record(work);
        conn.execute(
            r#"
                INSERT INTO works (
                    id,
                    title,
                    owner_id,
                    status,
                    difficulty,
                    priority,
                    deadline,
                    started_at,
                    finished_at,
                    quality,
                    completed_at,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :title,
                    :owner_id,
                    :status,
                    :difficulty,
                    :priority,
                    :deadline,
                    :started_at,
                    :finished_at,
                    :quality,
                    :completed_at,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":owner_id": &row.owner_id,
                ":status": &row.status,
                ":difficulty": &row.difficulty,
                ":priority": &row.priority,
                ":deadline": &row.deadline,
                ":started_at": &row.started_at,
                ":finished_at": &row.finished_at,
                ":quality": &row.quality,
                ":completed_at": &row.completed_at,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        for user_id in &work.collaborator_ids {
            conn.execute(
                "INSERT OR IGNORE INTO work_collaborators (work_id, user_id) VALUES (:work_id, :user_id)",
                named_params! {":work_id": &work.id, ":user_id": user_id},
            )?;
        }

        for subtask in &work.subtasks {
            Self::insert_subtask(conn, &work.id, subtask)?;
        }

        for log in &work.work_logs {
            Self::insert_work_log(conn, &work.id, log)?;
        }

        Ok(())
    }

    pub fn insert_subtask(conn: &Connection, work_id: &str, subtask: &Subtask) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO subtasks (id, work_id, title, position, completed)
                VALUES (:id, :work_id, :title, :position, :completed)
            "#,
            named_params! {
                ":id": &subtask.id,
                ":work_id": work_id,
                ":title": &subtask.title,
                ":position": subtask.position,
                ":completed": subtask.completed as i64,
            },
        )?;

        for session in &subtask.sessions {
            Self::insert_session(conn, &subtask.id, session)?;
        }

        Ok(())
    }

    pub fn insert_session(
        conn: &Connection,
        subtask_id: &str,
        session: &WorkSession,
    ) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO work_sessions (
                    id,
                    subtask_id,
                    user_id,
                    accumulated_seconds,
                    pause_count,
                    status
                ) VALUES (
                    :id,
                    :subtask_id,
                    :user_id,
                    :accumulated_seconds,
                    :pause_count,
                    :status
                )
            "#,
            named_params! {
                ":id": &session.id,
                ":subtask_id": subtask_id,
                ":user_id": &session.user_id,
                ":accumulated_seconds": session.accumulated_seconds,
                ":pause_count": session.pause_count,
                ":status": session.status.as_str(),
            },
        )?;
        Ok(())
    }

    pub fn insert_work_log(conn: &Connection, work_id: &str, log: &WorkLog) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO work_logs (id, work_id, user_id, minutes, logged_at)
                VALUES (:id, :work_id, :user_id, :minutes, :logged_at)
            "#,
            named_params! {
                ":id": &log.id,
                ":work_id": work_id,
                ":user_id": &log.user_id,
                ":minutes": log.minutes,
                ":logged_at": to_storage(&log.logged_at),
            },
        )?;
        Ok(())
    }

    /// Marks the work completed. Quality is only overwritten when given.
    pub fn mark_completed(
        conn: &Connection,
        id: &str,
        completed_at: &DateTime<Utc>,
        quality: Option<i64>,
    ) -> AppResult<()> {
        let stamp = to_storage(completed_at);
        let updated = conn.execute(
            r#"
                UPDATE works
                SET status = 'completed',
                    completed_at = :completed_at,
                    quality = COALESCE(:quality, quality),
                    updated_at = :completed_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": id,
                ":completed_at": &stamp,
                ":quality": quality,
            },
        )?;

        if updated == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_row(conn: &Connection, id: &str) -> AppResult<Option<WorkRow>> {
        let sql = format!("{BASE_SELECT} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! {":id": id}, |row| WorkRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Loads a work item with every child collection the scoring needs.
    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<CompletableWork>> {
        let Some(row) = Self::find_row(conn, id)? else {
            return Ok(None);
        };

        let mut work = row.into_record()?;
        work.collaborator_ids = Self::collaborators_for(conn, &work.id)?;
        work.subtasks = Self::subtasks_for(conn, &work.id)?;
        work.work_logs = Self::work_logs_for(conn, &work.id)?;
        Ok(Some(work))
    }

    pub fn collaborators_for(conn: &Connection, work_id: &str) -> AppResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT user_id
                FROM work_collaborators
                WHERE work_id = :work_id
                ORDER BY rowid
            "#,
        )?;
        let ids = stmt
            .query_map(named_params! {":work_id": work_id}, |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn subtasks_for(conn: &Connection, work_id: &str) -> AppResult<Vec<Subtask>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, work_id, title, position, completed
                FROM subtasks
                WHERE work_id = :work_id
                ORDER BY position, id
            "#,
        )?;
        let mut subtasks = stmt
            .query_map(named_params! {":work_id": work_id}, |row| {
                Ok(Subtask {
                    id: row.get("id")?,
                    work_id: row.get("work_id")?,
                    title: row.get("title")?,
                    position: row.get("position")?,
                    completed: row.get::<_, i64>("completed")? != 0,
                    sessions: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sessions_stmt = conn.prepare(
            r#"
                SELECT id, subtask_id, user_id, accumulated_seconds, pause_count, status
                FROM work_sessions
                WHERE subtask_id = :subtask_id
                ORDER BY rowid
            "#,
        )?;
        for subtask in &mut subtasks {
            subtask.sessions = sessions_stmt
                .query_map(named_params! {":subtask_id": &subtask.id}, |row| {
                    SessionRow::try_from(row)
                })?
                .map(|row| row.map(SessionRow::into_record))
                .collect::<Result<Vec<_>, _>>()?;
        }

        Ok(subtasks)
    }

    fn work_logs_for(conn: &Connection, work_id: &str) -> AppResult<Vec<WorkLog>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, work_id, user_id, minutes, logged_at
                FROM work_logs
                WHERE work_id = :work_id
                ORDER BY logged_at, rowid
            "#,
        )?;
        let rows = stmt
            .query_map(named_params! {":work_id": work_id}, |row| {
                Ok((
                    row.get::<_, String>("id")?,
                    row.get::<_, String>("work_id")?,
                    row.get::<_, String>("user_id")?,
                    row.get::<_, i64>("minutes")?,
                    row.get::<_, String>("logged_at")?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, work_id, user_id, minutes, logged_at)| {
                Ok(WorkLog {
                    id,
                    work_id,
                    user_id,
                    minutes: minutes.max(0),
                    logged_at: parse_timestamp(&logged_at)?,
                })
            })
            .collect()
    }

    /// Completed work inside `window` in which any of `user_ids` took part,
    /// as owner or collaborator.
    pub fn list_completed_for_users(
        conn: &Connection,
        user_ids: &[String],
        window: &ScoreWindow,
    ) -> AppResult<Vec<WorkCompletion>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
            r#"
                SELECT id, owner_id, deadline, completed_at
                FROM works
                WHERE status = 'completed'
                  AND completed_at IS NOT NULL
                  AND completed_at >= :start
                  AND completed_at < :end
                ORDER BY completed_at, id
            "#,
        )?;
        let completions = Self::collect_completions(
            conn,
            &mut stmt,
            named_params! {
                ":start": to_storage(&window.start),
                ":end": to_storage(&window.end),
            },
        )?;

        Ok(completions
            .into_iter()
            .filter(|completion| user_ids.iter().any(|id| completion.involves(id)))
            .collect())
    }

    /// Work not yet completed whose deadline lies before `as_of`.
    pub fn list_overdue(conn: &Connection, as_of: &DateTime<Utc>) -> AppResult<Vec<WorkCompletion>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, owner_id, deadline, completed_at
                FROM works
                WHERE status != 'completed'
                  AND deadline IS NOT NULL
                  AND deadline < :as_of
                ORDER BY deadline, id
            "#,
        )?;
        Self::collect_completions(conn, &mut stmt, named_params! {":as_of": to_storage(as_of)})
    }

    fn collect_completions(
        conn: &Connection,
        stmt: &mut rusqlite::Statement<'_>,
        params: &[(&str, &dyn rusqlite::ToSql)],
    ) -> AppResult<Vec<WorkCompletion>> {
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>("id")?,
                    row.get::<_, String>("owner_id")?,
                    row.get::<_, Option<String>>("deadline")?,
                    row.get::<_, Option<String>>("completed_at")?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(work_id, owner_id, deadline, completed_at)| {
                Ok(WorkCompletion {
                    collaborator_ids: Self::collaborators_for(conn, &work_id)?,
                    work_id,
                    owner_id,
                    deadline: parse_timestamp_opt(deadline.as_deref())?,
                    completed_at: parse_timestamp_opt(completed_at.as_deref())?,
                })
            })
            .collect()
    }
}
