use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::adjustment::DailyBonusKind;

/// Every factor that produced a completion award.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionBreakdown {
    pub base_score: f64,
    pub difficulty_multiplier: f64,
    pub priority_multiplier: f64,
    pub quality_multiplier: f64,
    pub punctuality_bonus: f64,
    pub lateness_penalty: f64,
    pub subtask_completion_bonus: f64,
    pub work_time_bonus: f64,
    pub efficiency_bonus: f64,
    pub consistency_bonus: f64,
    pub final_score: f64,
}

impl CompletionBreakdown {
    /// `1 + bonuses - penalty`, the factor applied after the multipliers.
    pub fn adjustment_factor(&self) -> f64 {
        1.0 + self.punctuality_bonus - self.lateness_penalty
            + self.subtask_completion_bonus
            + self.work_time_bonus
            + self.efficiency_bonus
            + self.consistency_bonus
    }

    pub fn combined_multiplier(&self) -> f64 {
        self.difficulty_multiplier * self.priority_multiplier * self.quality_multiplier
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShareRole {
    Owner,
    Contributor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamShareBreakdown {
    pub role: ShareRole,
    /// Fraction of the team score this record represents.
    pub share: f64,
    pub team_score: f64,
    pub minutes_logged: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyBreakdown {
    pub days_overdue: i64,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BonusBreakdown {
    pub bonus: DailyBonusKind,
    pub points: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreBreakdown {
    Completion(CompletionBreakdown),
    TeamShare(TeamShareBreakdown),
    DailyPenalty(PenaltyBreakdown),
    DailyBonus(BonusBreakdown),
}

impl ScoreBreakdown {
    pub fn kind(&self) -> ScoreKind {
        match self {
            ScoreBreakdown::Completion(_) => ScoreKind::Completion,
            ScoreBreakdown::TeamShare(_) => ScoreKind::TeamShare,
            ScoreBreakdown::DailyPenalty(_) => ScoreKind::DailyPenalty,
            ScoreBreakdown::DailyBonus(_) => ScoreKind::DailyBonus,
        }
    }

    pub fn as_completion(&self) -> Option<&CompletionBreakdown> {
        match self {
            ScoreBreakdown::Completion(breakdown) => Some(breakdown),
            _ => None,
        }
    }

    pub fn as_team_share(&self) -> Option<&TeamShareBreakdown> {
        match self {
            ScoreBreakdown::TeamShare(breakdown) => Some(breakdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Completion,
    TeamShare,
    DailyPenalty,
    DailyBonus,
}

impl ScoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreKind::Completion => "completion",
            ScoreKind::TeamShare => "team_share",
            ScoreKind::DailyPenalty => "daily_penalty",
            ScoreKind::DailyBonus => "daily_bonus",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewScoreRecord {
    pub user_id: String,
    pub work_id: Option<String>,
    pub points: i64,
    pub breakdown: ScoreBreakdown,
    #[serde(default)]
    pub cap_exceeded: bool,
    pub created_at: DateTime<Utc>,
}

/// Append-only ledger entry awarding points to one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: String,
    pub user_id: String,
    pub work_id: Option<String>,
    pub points: i64,
    pub breakdown: ScoreBreakdown,
    pub cap_exceeded: bool,
    pub created_at: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn kind(&self) -> ScoreKind {
        self.breakdown.kind()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserScoreTotal {
    pub user_id: String,
    pub points: i64,
    pub work_count: i64,
}

/// Half-open time range `[start, end)` over which the ledger is summed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScoreWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn until_now(start: DateTime<Utc>) -> Self {
        Self::new(start, Utc::now())
    }

    pub fn contains(&self, moment: &DateTime<Utc>) -> bool {
        *moment >= self.start && *moment < self.end
    }
}
