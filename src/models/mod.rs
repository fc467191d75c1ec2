pub mod adjustment;
pub mod leaderboard;
pub mod score;
pub mod settings;
pub mod team;
pub mod work;
