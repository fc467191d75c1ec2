use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DailyBonusKind {
    Login,
    FirstTask,
    FocusTime,
    Collaboration,
    EarlyCompletion,
}

impl DailyBonusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DailyBonusKind::Login => "login",
            DailyBonusKind::FirstTask => "first_task",
            DailyBonusKind::FocusTime => "focus_time",
            DailyBonusKind::Collaboration => "collaboration",
            DailyBonusKind::EarlyCompletion => "early_completion",
        }
    }

    pub fn adjustment_key(self) -> String {
        format!("bonus:{}", self.as_str())
    }
}

pub const PENALTY_ADJUSTMENT_KEY: &str = "penalty:overdue";

/// Marker row guaranteeing an adjustment is applied at most once per
/// user, key, work item and day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAdjustment {
    pub user_id: String,
    pub work_id: Option<String>,
    pub adjustment_key: String,
    pub applied_on: NaiveDate,
    pub points: i64,
}
