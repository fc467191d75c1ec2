pub mod adjustment_service;
pub mod bonus_calculators;
pub mod leaderboard_service;
pub mod multipliers;
pub mod punctuality;
pub mod score_service;
pub mod score_store;
pub mod settings_service;
pub mod team_distribution;
