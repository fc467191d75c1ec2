//! Scoring and leaderboard engine for completed work.
//!
//! Completed work items are turned into point awards by
//! [`services::score_service::ScoreService`], collaborators receive team
//! shares through [`services::team_distribution::TeamDistributor`], and
//! [`services::leaderboard_service::LeaderboardService`] aggregates the
//! append-only score ledger into ranked, time-windowed views. All storage
//! goes through the [`services::score_store::ScoreStore`] trait; a SQLite
//! implementation lives in [`services::score_store::SqliteScoreStore`].

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
