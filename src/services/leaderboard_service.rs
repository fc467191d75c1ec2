//! Ranked views over the score ledger.
//!
//! Users and teams are ranked by points inside a window, then by
//! punctuality, then by id. Ranks are 1-based and dense over the sorted
//! list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::leaderboard::{
    Leaderboard, LeaderboardPeriod, LeaderboardScope, TeamStanding, UserScoreSummary,
    UserStanding,
};
use crate::models::score::{ScoreWindow, UserScoreTotal};
use crate::models::work::WorkCompletion;
use crate::services::punctuality::on_time_percentage;
use crate::services::score_store::ScoreStore;

const MANY_TASKS: usize = 50;
const SOME_TASKS: usize = 10;
const HIGH_PUNCTUALITY: u32 = 90;

pub struct LeaderboardService {
    store: Arc<dyn ScoreStore>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// Top `limit` entries over `[window_start, now)`.
    pub fn leaderboard(
        &self,
        scope: LeaderboardScope,
        window_start: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Leaderboard> {
        self.leaderboard_in(scope, &ScoreWindow::until_now(window_start), limit)
    }

    /// Rolling preset window ending now.
    pub fn leaderboard_for_period(
        &self,
        scope: LeaderboardScope,
        period: LeaderboardPeriod,
        limit: usize,
    ) -> AppResult<Leaderboard> {
        self.leaderboard(scope, period.window_start(Utc::now()), limit)
    }

    pub fn leaderboard_in(
        &self,
        scope: LeaderboardScope,
        window: &ScoreWindow,
        limit: usize,
    ) -> AppResult<Leaderboard> {
        let board = match scope {
            LeaderboardScope::User => {
                let mut standings = self.user_standings(window)?;
                standings.truncate(limit);
                Leaderboard::User(standings)
            }
            LeaderboardScope::Team => {
                let mut standings = self.team_standings(window)?;
                standings.truncate(limit);
                Leaderboard::Team(standings)
            }
        };
        debug!(
            target: "app::leaderboard",
            scope = ?scope,
            entries = board.len(),
            "leaderboard built"
        );
        Ok(board)
    }

    /// Every user with in-window records, fully ranked.
    pub fn user_standings(&self, window: &ScoreWindow) -> AppResult<Vec<UserStanding>> {
        let totals = self.store.group_scores_by_user(window)?;
        if totals.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<String> = totals.iter().map(|total| total.user_id.clone()).collect();
        let profiles: HashMap<String, _> = self
            .store
            .list_user_profiles(&user_ids)?
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();
        let completions = self
            .store
            .list_completed_work_for_users(&user_ids, window)?;

        let mut standings: Vec<UserStanding> = totals
            .into_iter()
            .map(|UserScoreTotal { user_id, points, work_count }| {
                let profile = profiles.get(&user_id);
                let punctuality = on_time_percentage(
                    completions.iter().filter(|completion| completion.involves(&user_id)),
                );
                UserStanding {
                    rank: 0,
                    display_name: profile.map(|profile| profile.display_name.clone()),
                    team_name: profile.and_then(|profile| profile.team_name.clone()),
                    user_id,
                    points,
                    work_count,
                    punctuality,
                }
            })
            .collect();

        standings.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.punctuality.cmp(&a.punctuality))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        for (idx, standing) in standings.iter_mut().enumerate() {
            standing.rank = idx + 1;
        }
        Ok(standings)
    }

    /// Teams whose members hold in-window records, fully ranked.
    pub fn team_standings(&self, window: &ScoreWindow) -> AppResult<Vec<TeamStanding>> {
        let totals: HashMap<String, i64> = self
            .store
            .group_scores_by_user(window)?
            .into_iter()
            .map(|total| (total.user_id, total.points))
            .collect();
        let teams = self.store.list_teams_with_members()?;

        let members: Vec<String> = teams
            .iter()
            .flat_map(|team| team.member_ids.iter())
            .cloned()
            .collect();
        let completions = self
            .store
            .list_completed_work_for_users(&members, window)?;

        let mut standings = Vec::new();
        for team in teams {
            let scored: Vec<&String> = team
                .member_ids
                .iter()
                .filter(|id| totals.contains_key(*id))
                .collect();
            if scored.is_empty() {
                continue;
            }

            let points: i64 = scored.iter().filter_map(|id| totals.get(*id)).sum();
            let team_work = team_completions(&completions, &team.member_ids);
            standings.push(TeamStanding {
                rank: 0,
                completed_work: team_work.len(),
                punctuality: on_time_percentage(team_work),
                member_count: team.member_ids.len(),
                team_id: team.id,
                name: team.name,
                color: team.color,
                points,
            });
        }

        standings.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.punctuality.cmp(&a.punctuality))
                .then_with(|| a.team_id.cmp(&b.team_id))
        });
        for (idx, standing) in standings.iter_mut().enumerate() {
            standing.rank = idx + 1;
        }
        Ok(standings)
    }

    /// 1-based rank over `[window_start, now)`; `None` without records.
    pub fn user_rank(&self, user_id: &str, window_start: DateTime<Utc>) -> AppResult<Option<usize>> {
        self.user_rank_in(user_id, &ScoreWindow::until_now(window_start))
    }

    pub fn user_rank_in(&self, user_id: &str, window: &ScoreWindow) -> AppResult<Option<usize>> {
        Ok(self
            .user_standings(window)?
            .into_iter()
            .find(|standing| standing.user_id == user_id)
            .map(|standing| standing.rank))
    }

    pub fn user_summary(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<UserScoreSummary> {
        self.user_summary_in(user_id, &ScoreWindow::until_now(window_start))
    }

    pub fn user_summary_in(&self, user_id: &str, window: &ScoreWindow) -> AppResult<UserScoreSummary> {
        let profile = self
            .store
            .find_user_profile(user_id)?
            .ok_or_else(AppError::not_found)?;

        let standings = self.user_standings(window)?;
        let standing = standings.iter().find(|standing| standing.user_id == user_id);
        let completions = self
            .store
            .list_completed_work_for_users(&[user_id.to_string()], window)?;
        let punctuality = on_time_percentage(&completions);

        Ok(UserScoreSummary {
            user_id: profile.id,
            display_name: profile.display_name,
            team_name: profile.team_name,
            total_points: standing.map(|standing| standing.points).unwrap_or(0),
            completed_work: completions.len(),
            punctuality,
            rank: standing.map(|standing| standing.rank),
            achievements: achievements(completions.len(), punctuality),
        })
    }

    /// Points since `since`, or over the whole ledger when absent.
    pub fn user_total(&self, user_id: &str, since: Option<DateTime<Utc>>) -> AppResult<i64> {
        let since = since.unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.store.sum_scores_by_user(user_id, &since)
    }

    pub fn team_total(&self, team_id: &str, since: Option<DateTime<Utc>>) -> AppResult<i64> {
        let team = self
            .store
            .list_teams_with_members()?
            .into_iter()
            .find(|team| team.id == team_id)
            .ok_or_else(AppError::not_found)?;

        let mut total = 0;
        for member in &team.member_ids {
            total += self.user_total(member, since)?;
        }
        Ok(total)
    }
}

fn team_completions<'a>(
    completions: &'a [WorkCompletion],
    member_ids: &[String],
) -> Vec<&'a WorkCompletion> {
    let mut seen = HashSet::new();
    completions
        .iter()
        .filter(|completion| member_ids.iter().any(|id| completion.involves(id)))
        .filter(|completion| seen.insert(completion.work_id.as_str()))
        .collect()
}

pub fn achievements(completed_work: usize, punctuality: u32) -> Vec<String> {
    let mut earned = Vec::new();
    if completed_work >= MANY_TASKS {
        earned.push("50+ tasks completed".to_string());
    } else if completed_work >= SOME_TASKS {
        earned.push("10+ tasks completed".to_string());
    }

    if punctuality == 100 {
        earned.push("100% punctual".to_string());
    } else if punctuality >= HIGH_PUNCTUALITY {
        earned.push("90%+ punctuality".to_string());
    }
    earned
}
