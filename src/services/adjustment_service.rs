use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::adjustment::{DailyBonusKind, NewAdjustment, PENALTY_ADJUSTMENT_KEY};
use crate::models::score::{
    BonusBreakdown, NewScoreRecord, PenaltyBreakdown, ScoreBreakdown, ScoreRecord,
};
use crate::services::score_store::ScoreStore;
use crate::utils::time::{days_between, local_date_start};

pub const LOGIN_BONUS: i64 = 5;
pub const FIRST_TASK_BONUS: i64 = 10;
pub const COLLABORATION_BONUS: i64 = 15;
const FOCUS_POINTS_PER_HOUR: f64 = 5.0;
const MAX_FOCUS_BONUS: i64 = 25;
const EARLY_POINTS_PER_DAY: i64 = 10;
const MAX_EARLY_BONUS: i64 = 50;

/// Points deducted for work `days_overdue` whole days past its deadline.
pub fn penalty_points(days_overdue: i64) -> i64 {
    match days_overdue {
        i64::MIN..=0 => 0,
        1..=3 => -5,
        4..=7 => -10,
        _ => -15,
    }
}

pub fn focus_time_points(hours: f64) -> i64 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    ((hours * FOCUS_POINTS_PER_HOUR).round() as i64).min(MAX_FOCUS_BONUS)
}

pub fn early_completion_points(days_early: i64) -> i64 {
    (days_early.max(0) * EARLY_POINTS_PER_DAY).min(MAX_EARLY_BONUS)
}

/// Once-per-day ledger adjustments: overdue penalties and activity bonuses.
pub struct AdjustmentService {
    store: Arc<dyn ScoreStore>,
}

impl AdjustmentService {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// Penalises the owner of every unfinished work item whose deadline
    /// passed before the start of `today`. Re-running for the same day is
    /// a no-op. Returns the number of penalties written.
    pub fn apply_daily_penalties(&self, today: NaiveDate) -> AppResult<usize> {
        let day_start = local_date_start(today);
        let overdue = self.store.list_overdue_work(&day_start)?;

        let mut applied = 0;
        for work in overdue {
            let Some(deadline) = work.deadline else {
                continue;
            };
            let days_overdue = days_between(&deadline, &day_start).floor() as i64;
            let points = penalty_points(days_overdue);
            if points == 0 {
                continue;
            }

            let fresh = self.store.record_adjustment(&NewAdjustment {
                user_id: work.owner_id.clone(),
                work_id: Some(work.work_id.clone()),
                adjustment_key: PENALTY_ADJUSTMENT_KEY.to_string(),
                applied_on: today,
                points,
            })?;
            if !fresh {
                debug!(target: "app::adjustment", work_id = %work.work_id, %today, "penalty already applied");
                continue;
            }

            self.store.create_score_record(NewScoreRecord {
                user_id: work.owner_id,
                work_id: Some(work.work_id),
                points,
                breakdown: ScoreBreakdown::DailyPenalty(PenaltyBreakdown {
                    days_overdue,
                    points,
                }),
                cap_exceeded: false,
                created_at: day_start,
            })?;
            applied += 1;
        }

        info!(target: "app::adjustment", %today, applied, "daily penalties applied");
        Ok(applied)
    }

    /// Awards `points` of `kind` to the user once per day. `None` when the
    /// bonus was already granted that day or is worth nothing.
    pub fn award_daily_bonus(
        &self,
        user_id: &str,
        kind: DailyBonusKind,
        points: i64,
        description: impl Into<String>,
        day: NaiveDate,
    ) -> AppResult<Option<ScoreRecord>> {
        if points <= 0 {
            return Ok(None);
        }

        let fresh = self.store.record_adjustment(&NewAdjustment {
            user_id: user_id.to_string(),
            work_id: None,
            adjustment_key: kind.adjustment_key(),
            applied_on: day,
            points,
        })?;
        if !fresh {
            debug!(target: "app::adjustment", user_id, bonus = kind.as_str(), %day, "bonus already granted");
            return Ok(None);
        }

        let record = self.store.create_score_record(NewScoreRecord {
            user_id: user_id.to_string(),
            work_id: None,
            points,
            breakdown: ScoreBreakdown::DailyBonus(BonusBreakdown {
                bonus: kind,
                points,
                description: description.into(),
            }),
            cap_exceeded: false,
            created_at: local_date_start(day),
        })?;
        info!(target: "app::adjustment", user_id, bonus = kind.as_str(), points, "daily bonus granted");
        Ok(Some(record))
    }

    pub fn award_login(&self, user_id: &str, day: NaiveDate) -> AppResult<Option<ScoreRecord>> {
        self.award_daily_bonus(user_id, DailyBonusKind::Login, LOGIN_BONUS, "Daily login", day)
    }

    pub fn award_first_task(&self, user_id: &str, day: NaiveDate) -> AppResult<Option<ScoreRecord>> {
        self.award_daily_bonus(
            user_id,
            DailyBonusKind::FirstTask,
            FIRST_TASK_BONUS,
            "First task completed today",
            day,
        )
    }

    pub fn award_focus_time(
        &self,
        user_id: &str,
        hours: f64,
        day: NaiveDate,
    ) -> AppResult<Option<ScoreRecord>> {
        self.award_daily_bonus(
            user_id,
            DailyBonusKind::FocusTime,
            focus_time_points(hours),
            format!("Focused work for {hours:.1} hours"),
            day,
        )
    }

    pub fn award_collaboration(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> AppResult<Option<ScoreRecord>> {
        self.award_daily_bonus(
            user_id,
            DailyBonusKind::Collaboration,
            COLLABORATION_BONUS,
            "Collaborated on team work",
            day,
        )
    }

    pub fn award_early_completion(
        &self,
        user_id: &str,
        days_early: i64,
        day: NaiveDate,
    ) -> AppResult<Option<ScoreRecord>> {
        self.award_daily_bonus(
            user_id,
            DailyBonusKind::EarlyCompletion,
            early_completion_points(days_early),
            format!("Finished {days_early} days early"),
            day,
        )
    }
}
