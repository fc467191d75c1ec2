mod support;

use chrono::{Duration, NaiveDate};
use support::{neutral_work, setup_test_environment};
use work_score_engine::db::repositories::adjustment_repository::AdjustmentRepository;
use work_score_engine::db::repositories::score_repository::ScoreRepository;
use work_score_engine::models::score::{ScoreKind, ScoreWindow};
use work_score_engine::services::adjustment_service::AdjustmentService;
use work_score_engine::services::leaderboard_service::LeaderboardService;
use work_score_engine::utils::time::local_date_start;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 20).expect("valid date")
}

#[test]
fn overdue_work_is_penalised_once_per_day() {
    let env = setup_test_environment();
    env.add_user("alice", None);
    env.add_user("bob", None);
    let day_start = local_date_start(today());

    let mut five_days = neutral_work("late-5", "alice");
    five_days.deadline = Some(day_start - Duration::days(5) - Duration::hours(1));
    env.add_work(&five_days);

    let mut two_days = neutral_work("late-2", "bob");
    two_days.deadline = Some(day_start - Duration::days(2));
    env.add_work(&two_days);

    let mut ten_days = neutral_work("late-10", "bob");
    ten_days.deadline = Some(day_start - Duration::days(10));
    env.add_work(&ten_days);

    // less than a full day overdue
    let mut fresh = neutral_work("just-missed", "alice");
    fresh.deadline = Some(day_start - Duration::hours(6));
    env.add_work(&fresh);

    let mut finished = neutral_work("done-late", "alice");
    finished.deadline = Some(day_start - Duration::days(3));
    env.add_work(&finished);
    env.mark_completed("done-late", day_start - Duration::days(1));

    let service = AdjustmentService::new(env.store.clone());
    assert_eq!(service.apply_daily_penalties(today()).expect("penalties"), 3);
    assert_eq!(service.apply_daily_penalties(today()).expect("rerun"), 0);

    let points_for = |work_id: &str| -> Vec<i64> {
        env.pool
            .with_connection(|conn| ScoreRepository::list_for_work(conn, work_id))
            .expect("records")
            .into_iter()
            .map(|record| {
                assert_eq!(record.kind(), ScoreKind::DailyPenalty);
                record.points
            })
            .collect()
    };
    assert_eq!(points_for("late-5"), vec![-10]);
    assert_eq!(points_for("late-2"), vec![-5]);
    assert_eq!(points_for("late-10"), vec![-15]);
    assert!(points_for("just-missed").is_empty());
    assert!(points_for("done-late").is_empty());

    // a new day penalises again
    let tomorrow = today() + Duration::days(1);
    assert_eq!(service.apply_daily_penalties(tomorrow).expect("next day"), 4);
}

#[test]
fn daily_bonuses_are_granted_once() {
    let env = setup_test_environment();
    env.add_user("alice", None);
    let service = AdjustmentService::new(env.store.clone());

    let login = service.award_login("alice", today()).expect("login");
    assert_eq!(login.map(|record| record.points), Some(5));
    assert!(service.award_login("alice", today()).expect("repeat").is_none());

    let focus = service
        .award_focus_time("alice", 3.0, today())
        .expect("focus")
        .expect("focus record");
    assert_eq!(focus.points, 15);
    assert_eq!(focus.kind(), ScoreKind::DailyBonus);

    let early = service
        .award_early_completion("alice", 7, today())
        .expect("early")
        .expect("early record");
    assert_eq!(early.points, 50);

    assert!(service
        .award_early_completion("alice", 0, today() + Duration::days(1))
        .expect("nothing to award")
        .is_none());

    service.award_first_task("alice", today()).expect("first task");
    service.award_collaboration("alice", today()).expect("collaboration");

    let count = env
        .pool
        .with_connection(|conn| AdjustmentRepository::count_for_user_on(conn, "alice", &today()))
        .expect("count");
    assert_eq!(count, 5);

    let leaderboard = LeaderboardService::new(env.store.clone());
    assert_eq!(
        leaderboard.user_total("alice", None).expect("total"),
        5 + 15 + 50 + 10 + 15
    );

    let window = ScoreWindow::new(
        local_date_start(today()),
        local_date_start(today() + Duration::days(1)),
    );
    let standings = leaderboard.user_standings(&window).expect("standings");
    assert_eq!(standings[0].points, 95);
    assert_eq!(standings[0].work_count, 0);
}
