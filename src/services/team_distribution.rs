use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::score::{
    NewScoreRecord, ScoreBreakdown, ScoreRecord, ShareRole, TeamShareBreakdown,
};
use crate::models::settings::ScoringConfig;
use crate::models::work::CompletableWork;
use crate::services::score_store::ScoreStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShareAllocation {
    pub user_id: String,
    pub role: ShareRole,
    /// Fraction of the team score.
    pub share: f64,
    pub minutes: i64,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamDistribution {
    pub team_score: f64,
    pub allocations: Vec<ShareAllocation>,
    #[serde(default)]
    pub records: Vec<ScoreRecord>,
}

impl TeamDistribution {
    pub fn allocated_points(&self) -> f64 {
        self.allocations.iter().map(|allocation| allocation.points).sum()
    }
}

/// Whether the work has enough collaborators besides the owner to share a
/// team bonus.
pub fn qualifies_for_distribution(work: &CompletableWork) -> bool {
    work.non_owner_collaborators().len() > 1
}

/// Splits `base_score * team_factor` between the owner floor and the
/// non-owner contributors. Pure; nothing is persisted.
pub fn plan_distribution(
    work: &CompletableWork,
    base_score: f64,
    team_factor: f64,
    owner_share: f64,
) -> TeamDistribution {
    let team_score = (base_score * team_factor).max(0.0);
    let mut allocations = vec![ShareAllocation {
        user_id: work.owner_id.clone(),
        role: ShareRole::Owner,
        share: owner_share,
        minutes: owner_minutes(work),
        points: team_score * owner_share,
    }];

    let pool_fraction = 1.0 - owner_share;
    let contributors = contributor_minutes(work);
    let total_minutes: i64 = contributors.iter().map(|(_, minutes)| *minutes).sum();
    let count = contributors.len();

    for (user_id, minutes) in contributors {
        let ratio = if total_minutes > 0 {
            minutes as f64 / total_minutes as f64
        } else {
            1.0 / count as f64
        };
        let share = pool_fraction * ratio;
        allocations.push(ShareAllocation {
            user_id,
            role: ShareRole::Contributor,
            share,
            minutes,
            points: team_score * share,
        });
    }

    TeamDistribution {
        team_score,
        allocations,
        records: Vec::new(),
    }
}

/// Minutes per non-owner contributor in first-logged order. Falls back to
/// the declared collaborators with zero minutes when nobody else logged
/// time.
fn contributor_minutes(work: &CompletableWork) -> Vec<(String, i64)> {
    let mut contributors: Vec<(String, i64)> = Vec::new();
    for log in &work.work_logs {
        if log.user_id == work.owner_id {
            continue;
        }
        match contributors.iter_mut().find(|(id, _)| *id == log.user_id) {
            Some((_, minutes)) => *minutes += log.minutes.max(0),
            None => contributors.push((log.user_id.clone(), log.minutes.max(0))),
        }
    }

    if contributors.is_empty() {
        contributors = work
            .non_owner_collaborators()
            .into_iter()
            .map(|id| (id.to_string(), 0))
            .collect();
    }
    contributors
}

fn owner_minutes(work: &CompletableWork) -> i64 {
    work.work_logs
        .iter()
        .filter(|log| log.user_id == work.owner_id)
        .map(|log| log.minutes.max(0))
        .sum()
}

pub struct TeamDistributor {
    store: Arc<dyn ScoreStore>,
    team_factor: f64,
    owner_share: f64,
}

impl TeamDistributor {
    pub fn new(store: Arc<dyn ScoreStore>, config: &ScoringConfig) -> Self {
        Self {
            store,
            team_factor: config.team_factor,
            owner_share: config.owner_team_share,
        }
    }

    /// Persists one team-share record per allocation in a single append,
    /// stamped `awarded_at`. Returns `None` when the work does not qualify.
    pub fn distribute_team_score(
        &self,
        work: &CompletableWork,
        base_score: f64,
        awarded_at: DateTime<Utc>,
    ) -> AppResult<Option<TeamDistribution>> {
        if !qualifies_for_distribution(work) {
            debug!(target: "app::score", work_id = %work.id, "too few collaborators for team share");
            return Ok(None);
        }

        let mut distribution =
            plan_distribution(work, base_score, self.team_factor, self.owner_share);

        let shares = distribution
            .allocations
            .iter()
            .map(|allocation| NewScoreRecord {
                user_id: allocation.user_id.clone(),
                work_id: Some(work.id.clone()),
                points: allocation.points.round() as i64,
                breakdown: ScoreBreakdown::TeamShare(TeamShareBreakdown {
                    role: allocation.role,
                    share: allocation.share,
                    team_score: distribution.team_score,
                    minutes_logged: allocation.minutes,
                }),
                cap_exceeded: false,
                created_at: awarded_at,
            })
            .collect();
        distribution.records = self.store.append_score_records(shares)?;

        info!(
            target: "app::score",
            work_id = %work.id,
            team_score = distribution.team_score,
            recipients = distribution.allocations.len(),
            "team score distributed"
        );
        Ok(Some(distribution))
    }
}
