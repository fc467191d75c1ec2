use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_SCORE: f64 = 100.0;
pub const DEFAULT_TEAM_FACTOR: f64 = 1.2;
pub const DEFAULT_MAX_DAILY_SCORE: f64 = 2000.0;
pub const DEFAULT_OWNER_TEAM_SHARE: f64 = 0.4;

/// Deployment-level scoring constants, fixed when the engine is built.
///
/// Defaults: base score 100, team factor 1.2, daily ceiling 2000 points,
/// owner floor 40% of the team score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    pub base_score: f64,
    pub team_factor: f64,
    pub max_daily_score: f64,
    pub owner_team_share: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: DEFAULT_BASE_SCORE,
            team_factor: DEFAULT_TEAM_FACTOR,
            max_daily_score: DEFAULT_MAX_DAILY_SCORE,
            owner_team_share: DEFAULT_OWNER_TEAM_SHARE,
        }
    }
}
