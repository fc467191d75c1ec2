//! Independent fractional bonuses added on top of the multipliers. Every
//! function degrades to `0.0` when its input data is missing.

use chrono::{DateTime, Utc};

use crate::models::work::{Subtask, WorkSession};
use crate::utils::time::days_between;

const SECONDS_PER_HOUR: f64 = 3600.0;
const DAYS_PER_DIFFICULTY_LEVEL: f64 = 2.0;
const FALLBACK_DIFFICULTY: i64 = 3;
const MIN_EFFICIENCY_QUALITY: i64 = 4;

pub const MAX_SUBTASK_BONUS: f64 = 0.2;
pub const MAX_WORK_TIME_BONUS: f64 = 0.15;
pub const MAX_EFFICIENCY_BONUS: f64 = 0.15;
pub const MAX_CONSISTENCY_BONUS: f64 = 0.1;

pub fn subtask_completion_bonus(subtasks: &[Subtask]) -> f64 {
    if subtasks.is_empty() {
        return 0.0;
    }

    let completed = subtasks.iter().filter(|subtask| subtask.completed).count();
    if completed == subtasks.len() {
        return MAX_SUBTASK_BONUS;
    }

    let ratio = completed as f64 / subtasks.len() as f64;
    if ratio >= 0.8 {
        0.1
    } else if ratio >= 0.5 {
        0.05
    } else {
        0.0
    }
}

/// Hours accumulated across the given sessions. Callers pass completed
/// sessions only.
pub fn total_hours<'a, I>(sessions: I) -> f64
where
    I: IntoIterator<Item = &'a WorkSession>,
{
    let seconds: i64 = sessions
        .into_iter()
        .map(|session| session.accumulated_seconds.max(0))
        .sum();
    seconds as f64 / SECONDS_PER_HOUR
}

pub fn work_time_bonus<'a, I>(completed_sessions: I) -> f64
where
    I: IntoIterator<Item = &'a WorkSession>,
{
    let hours = total_hours(completed_sessions);
    if hours >= 8.0 {
        MAX_WORK_TIME_BONUS
    } else if hours >= 4.0 {
        0.1
    } else if hours >= 2.0 {
        0.05
    } else {
        0.0
    }
}

/// Rewards finishing well ahead of `difficulty * 2` days, but only for
/// work rated 4 or better.
pub fn efficiency_bonus(
    started_at: Option<&DateTime<Utc>>,
    finished_at: Option<&DateTime<Utc>>,
    difficulty: i64,
    quality: Option<i64>,
) -> f64 {
    let (Some(started_at), Some(finished_at), Some(quality)) = (started_at, finished_at, quality)
    else {
        return 0.0;
    };
    if quality < MIN_EFFICIENCY_QUALITY {
        return 0.0;
    }

    let difficulty = if difficulty > 0 {
        difficulty
    } else {
        FALLBACK_DIFFICULTY
    };
    let expected_days = difficulty as f64 * DAYS_PER_DIFFICULTY_LEVEL;
    let days_taken = days_between(started_at, finished_at);

    if days_taken < expected_days * 0.5 {
        MAX_EFFICIENCY_BONUS
    } else if days_taken < expected_days * 0.75 {
        0.1
    } else {
        0.0
    }
}

/// Few pauses and long sessions indicate focused work.
pub fn consistency_bonus<'a, I>(completed_sessions: I) -> f64
where
    I: IntoIterator<Item = &'a WorkSession>,
{
    let mut sessions = 0usize;
    let mut pauses = 0i64;
    let mut seconds = 0i64;
    for session in completed_sessions {
        sessions += 1;
        pauses += session.pause_count.max(0);
        seconds += session.accumulated_seconds.max(0);
    }

    if sessions == 0 {
        return 0.0;
    }

    let avg_pauses = pauses as f64 / sessions as f64;
    let avg_hours = seconds as f64 / sessions as f64 / SECONDS_PER_HOUR;

    if avg_pauses <= 1.0 && avg_hours >= 1.0 {
        MAX_CONSISTENCY_BONUS
    } else if avg_pauses <= 2.0 && avg_hours >= 0.5 {
        0.05
    } else {
        0.0
    }
}
