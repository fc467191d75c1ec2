use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::work::WorkCompletion;
use crate::utils::time::days_between;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Punctuality {
    pub bonus: f64,
    pub penalty: f64,
}

impl Punctuality {
    pub const NEUTRAL: Punctuality = Punctuality {
        bonus: 0.0,
        penalty: 0.0,
    };

    fn bonus(bonus: f64) -> Self {
        Self { bonus, penalty: 0.0 }
    }

    fn penalty(penalty: f64) -> Self {
        Self { bonus: 0.0, penalty }
    }

    pub fn is_on_time(&self) -> bool {
        self.penalty == 0.0
    }
}

/// Bonus/penalty pair for finishing at `completed_at` against `deadline`.
///
/// `diff` is signed and fractional, negative when early. Each bracket is
/// inclusive at its upper bound, so a delay of exactly one day is still
/// inside the grace bracket.
pub fn evaluate(completed_at: &DateTime<Utc>, deadline: Option<&DateTime<Utc>>) -> Punctuality {
    let Some(deadline) = deadline else {
        return Punctuality::NEUTRAL;
    };

    let diff = days_between(deadline, completed_at);
    if diff < -7.0 {
        Punctuality::bonus(0.2)
    } else if diff < 0.0 {
        Punctuality::bonus(0.1)
    } else if diff <= 1.0 {
        Punctuality::NEUTRAL
    } else if diff <= 3.0 {
        Punctuality::penalty(0.1)
    } else if diff <= 7.0 {
        Punctuality::penalty(0.2)
    } else {
        Punctuality::penalty(0.3)
    }
}

/// Work without a deadline or without a completion stamp counts as on time.
pub fn is_on_time(completion: &WorkCompletion) -> bool {
    match (&completion.completed_at, &completion.deadline) {
        (Some(completed_at), deadline) => evaluate(completed_at, deadline.as_ref()).is_on_time(),
        (None, _) => true,
    }
}

/// Rounded percentage of on-time completions; `0` for an empty set.
pub fn on_time_percentage<'a, I>(completions: I) -> u32
where
    I: IntoIterator<Item = &'a WorkCompletion>,
{
    let mut total = 0usize;
    let mut on_time = 0usize;
    for completion in completions {
        total += 1;
        if is_on_time(completion) {
            on_time += 1;
        }
    }

    if total == 0 {
        return 0;
    }
    ((on_time as f64 / total as f64) * 100.0).round() as u32
}
