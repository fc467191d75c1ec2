//! Lookup tables turning work attributes into score multipliers.
//!
//! Unknown inputs map to a neutral `1.0` instead of failing; work items often
//! carry incomplete metadata.

pub const NEUTRAL_MULTIPLIER: f64 = 1.0;

pub fn difficulty_multiplier(difficulty: i64) -> f64 {
    match difficulty {
        1 => 0.5,
        2 => 0.75,
        3 => 1.0,
        4 => 1.5,
        5 => 2.0,
        _ => NEUTRAL_MULTIPLIER,
    }
}

/// Case-insensitive; surrounding whitespace is ignored.
pub fn priority_multiplier(priority: &str) -> f64 {
    match priority.trim().to_ascii_lowercase().as_str() {
        "low" => 0.8,
        "medium" => 1.0,
        "high" => 1.3,
        "critical" => 1.6,
        _ => NEUTRAL_MULTIPLIER,
    }
}

/// Quality is usually rated after completion, so absent or zero is neutral.
pub fn quality_multiplier(quality: Option<i64>) -> f64 {
    match quality {
        Some(1) => 0.6,
        Some(2) => 0.8,
        Some(3) => 1.0,
        Some(4) => 1.2,
        Some(5) => 1.4,
        _ => NEUTRAL_MULTIPLIER,
    }
}
