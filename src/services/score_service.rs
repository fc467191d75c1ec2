use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::score::{CompletionBreakdown, NewScoreRecord, ScoreBreakdown, ScoreRecord};
use crate::models::settings::ScoringConfig;
use crate::models::work::CompletableWork;
use crate::services::bonus_calculators::{
    consistency_bonus, efficiency_bonus, subtask_completion_bonus, work_time_bonus,
};
use crate::services::multipliers::{difficulty_multiplier, priority_multiplier, quality_multiplier};
use crate::services::punctuality;
use crate::services::score_store::ScoreStore;
use crate::services::team_distribution::{ShareAllocation, TeamDistribution, TeamDistributor};
use crate::utils::time::local_day_start;

/// Result of scoring one completed work item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub work_id: String,
    pub owner_id: String,
    pub final_score: f64,
    pub points: i64,
    pub breakdown: CompletionBreakdown,
    pub record: ScoreRecord,
    pub distribution: Option<TeamDistribution>,
    /// `true` when the work had already been scored and nothing was written.
    pub replayed: bool,
}

/// Source of the write time stamped on every ledger record.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct ScoreService {
    store: Arc<dyn ScoreStore>,
    config: ScoringConfig,
    distributor: TeamDistributor,
    clock: Clock,
}

impl ScoreService {
    pub fn new(store: Arc<dyn ScoreStore>, config: ScoringConfig) -> Self {
        let distributor = TeamDistributor::new(Arc::clone(&store), &config);
        Self {
            store,
            config,
            distributor,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock used to stamp records and to pick the
    /// current day for the cap flag.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores the work item as completed at `completed_at`, appends the
    /// owner's record and, for team work, the distribution records.
    ///
    /// `completed_at` only drives punctuality and efficiency. Records carry
    /// the write time, so the cap flag counts the day the points land on.
    /// A work item is scored once; later calls return the stored outcome.
    pub fn calculate_score(
        &self,
        work_id: &str,
        completed_at: DateTime<Utc>,
    ) -> AppResult<ScoreOutcome> {
        let work = self.store.get_work(work_id)?;

        if let Some(existing) = self.store.find_completion_record(work_id)? {
            debug!(target: "app::score", work_id, record_id = %existing.id, "work already scored");
            return self.replay(&work, existing);
        }

        let breakdown = self.compute_breakdown(&work, &completed_at);
        let final_score = breakdown.final_score;
        let points = final_score.round() as i64;

        let awarded_at = (self.clock)();
        let day_start = local_day_start(&awarded_at.with_timezone(&Local));
        let awarded_today = self.store.sum_scores_by_user(&work.owner_id, &day_start)?;
        let cap_exceeded = (awarded_today + points) as f64 > self.config.max_daily_score;
        if cap_exceeded {
            warn!(
                target: "app::score",
                user_id = %work.owner_id,
                awarded_today,
                points,
                max_daily_score = self.config.max_daily_score,
                "daily score ceiling exceeded"
            );
        }

        let record = self.store.create_score_record(NewScoreRecord {
            user_id: work.owner_id.clone(),
            work_id: Some(work.id.clone()),
            points,
            breakdown: ScoreBreakdown::Completion(breakdown.clone()),
            cap_exceeded,
            created_at: awarded_at,
        })?;

        let distribution =
            self.distributor
                .distribute_team_score(&work, final_score, awarded_at)?;

        info!(
            target: "app::score",
            work_id = %work.id,
            user_id = %work.owner_id,
            final_score,
            points,
            team = distribution.is_some(),
            "work scored"
        );

        Ok(ScoreOutcome {
            work_id: work.id,
            owner_id: work.owner_id,
            final_score,
            points,
            breakdown,
            record,
            distribution,
            replayed: false,
        })
    }

    /// Every factor for `work` finished at `completed_at`. Pure apart from
    /// reading the config.
    pub fn compute_breakdown(
        &self,
        work: &CompletableWork,
        completed_at: &DateTime<Utc>,
    ) -> CompletionBreakdown {
        let timing = punctuality::evaluate(completed_at, work.deadline.as_ref());
        let finished_at = work.finished_at.as_ref().unwrap_or(completed_at);

        let mut breakdown = CompletionBreakdown {
            base_score: self.config.base_score,
            difficulty_multiplier: difficulty_multiplier(work.difficulty),
            priority_multiplier: priority_multiplier(&work.priority),
            quality_multiplier: quality_multiplier(work.quality),
            punctuality_bonus: timing.bonus,
            lateness_penalty: timing.penalty,
            subtask_completion_bonus: subtask_completion_bonus(&work.subtasks),
            work_time_bonus: work_time_bonus(work.completed_sessions()),
            efficiency_bonus: efficiency_bonus(
                work.started_at.as_ref(),
                Some(finished_at),
                work.difficulty,
                work.quality,
            ),
            consistency_bonus: consistency_bonus(work.completed_sessions()),
            final_score: 0.0,
        };

        let raw = breakdown.base_score * breakdown.combined_multiplier()
            * breakdown.adjustment_factor();
        breakdown.final_score = raw.max(0.0);
        breakdown
    }

    /// Advisory: whether the user is still below the daily ceiling today.
    pub fn under_daily_cap(&self, user_id: &str) -> AppResult<bool> {
        self.under_daily_cap_at(user_id, Local::now())
    }

    pub fn under_daily_cap_at(&self, user_id: &str, now: DateTime<Local>) -> AppResult<bool> {
        let since = local_day_start(&now);
        let total = self.store.sum_scores_by_user(user_id, &since)?;
        Ok((total as f64) < self.config.max_daily_score)
    }

    fn replay(&self, work: &CompletableWork, record: ScoreRecord) -> AppResult<ScoreOutcome> {
        let breakdown = record.breakdown.as_completion().cloned().ok_or_else(|| {
            AppError::other(format!("completion record {} has a foreign breakdown", record.id))
        })?;

        let shares: Vec<ScoreRecord> = self
            .store
            .list_records_for_work(&work.id)?
            .into_iter()
            .filter(|candidate| candidate.breakdown.as_team_share().is_some())
            .collect();

        let distribution = if shares.is_empty() {
            None
        } else {
            let mut team_score = 0.0;
            let mut allocations = Vec::with_capacity(shares.len());
            for share_record in &shares {
                if let Some(share) = share_record.breakdown.as_team_share() {
                    team_score = share.team_score;
                    allocations.push(ShareAllocation {
                        user_id: share_record.user_id.clone(),
                        role: share.role,
                        share: share.share,
                        minutes: share.minutes_logged,
                        points: share.team_score * share.share,
                    });
                }
            }
            Some(TeamDistribution {
                team_score,
                allocations,
                records: shares,
            })
        };

        Ok(ScoreOutcome {
            work_id: work.id.clone(),
            owner_id: work.owner_id.clone(),
            final_score: breakdown.final_score,
            points: record.points,
            breakdown,
            record,
            distribution,
            replayed: true,
        })
    }
}
