use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    User,
    Team,
}

/// Rolling window presets offered to hosts. Anything unrecognised maps to
/// a month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardPeriod {
    Week,
    #[default]
    Month,
    Quarter,
}

impl LeaderboardPeriod {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("week") => LeaderboardPeriod::Week,
            Some("quarter") => LeaderboardPeriod::Quarter,
            _ => LeaderboardPeriod::Month,
        }
    }

    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            LeaderboardPeriod::Week => now - Duration::days(7),
            LeaderboardPeriod::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(now - Duration::days(30)),
            LeaderboardPeriod::Quarter => now
                .checked_sub_months(Months::new(3))
                .unwrap_or(now - Duration::days(90)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStanding {
    pub rank: usize,
    pub user_id: String,
    pub display_name: Option<String>,
    pub team_name: Option<String>,
    pub points: i64,
    pub work_count: i64,
    /// Share of in-window completed work delivered on time, 0–100.
    pub punctuality: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub rank: usize,
    pub team_id: String,
    pub name: String,
    pub color: Option<String>,
    pub points: i64,
    pub completed_work: usize,
    pub member_count: usize,
    pub punctuality: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "scope", content = "entries", rename_all = "snake_case")]
pub enum Leaderboard {
    User(Vec<UserStanding>),
    Team(Vec<TeamStanding>),
}

impl Leaderboard {
    pub fn scope(&self) -> LeaderboardScope {
        match self {
            Leaderboard::User(_) => LeaderboardScope::User,
            Leaderboard::Team(_) => LeaderboardScope::Team,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Leaderboard::User(entries) => entries.len(),
            Leaderboard::Team(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn users(&self) -> Option<&[UserStanding]> {
        match self {
            Leaderboard::User(entries) => Some(entries),
            Leaderboard::Team(_) => None,
        }
    }

    pub fn teams(&self) -> Option<&[TeamStanding]> {
        match self {
            Leaderboard::Team(entries) => Some(entries),
            Leaderboard::User(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserScoreSummary {
    pub user_id: String,
    pub display_name: String,
    pub team_name: Option<String>,
    pub total_points: i64,
    pub completed_work: usize,
    pub punctuality: u32,
    pub rank: Option<usize>,
    pub achievements: Vec<String>,
}
