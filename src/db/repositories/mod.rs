pub mod adjustment_repository;
pub mod score_repository;
pub mod team_repository;
pub mod work_repository;
