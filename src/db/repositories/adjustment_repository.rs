use chrono::{NaiveDate, Utc};
use rusqlite::{named_params, Connection};

use crate::error::AppResult;
use crate::models::adjustment::NewAdjustment;
use crate::utils::time::to_storage;

pub struct AdjustmentRepository;

impl AdjustmentRepository {
    /// Returns `false` when the same adjustment was already applied that day.
    pub fn insert_if_absent(conn: &Connection, input: &NewAdjustment) -> AppResult<bool> {
        let inserted = conn.execute(
            r#"
                INSERT OR IGNORE INTO daily_adjustments (
                    id,
                    user_id,
                    work_key,
                    adjustment_key,
                    applied_on,
                    points,
                    created_at
                ) VALUES (
                    :id,
                    :user_id,
                    :work_key,
                    :adjustment_key,
                    :applied_on,
                    :points,
                    :created_at
                )
            "#,
            named_params! {
                ":id": uuid::Uuid::new_v4().to_string(),
                ":user_id": &input.user_id,
                ":work_key": input.work_id.as_deref().unwrap_or(""),
                ":adjustment_key": &input.adjustment_key,
                ":applied_on": input.applied_on.to_string(),
                ":points": input.points,
                ":created_at": to_storage(&Utc::now()),
            },
        )?;
        Ok(inserted == 1)
    }

    pub fn count_for_user_on(conn: &Connection, user_id: &str, day: &NaiveDate) -> AppResult<i64> {
        let count: i64 = conn.query_row(
            r#"
                SELECT COUNT(*)
                FROM daily_adjustments
                WHERE user_id = :user_id AND applied_on = :applied_on
            "#,
            named_params! {
                ":user_id": user_id,
                ":applied_on": day.to_string(),
            },
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
