mod support;

use chrono::{Duration, TimeZone, Utc};
use support::{midday, neutral_work, scorer_at, setup_test_environment, TestEnv};
use work_score_engine::models::adjustment::DailyBonusKind;
use work_score_engine::models::leaderboard::{Leaderboard, LeaderboardPeriod, LeaderboardScope};
use work_score_engine::models::score::{BonusBreakdown, NewScoreRecord, ScoreBreakdown, ScoreWindow};
use work_score_engine::services::leaderboard_service::LeaderboardService;
use work_score_engine::services::score_store::ScoreStore;

fn window() -> ScoreWindow {
    ScoreWindow::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
    )
}

/// alice 300 (three neutral items), bob and carol 150 each (one hard item).
fn seed_three_users(env: &TestEnv) {
    env.add_team("t-red", "Red");
    env.add_team("t-blue", "Blue");
    env.add_user("alice", Some("t-red"));
    env.add_user("bob", Some("t-blue"));
    env.add_user("carol", Some("t-blue"));
    env.add_user("dave", Some("t-red"));

    let mut jobs = Vec::new();
    for idx in 0..3 {
        jobs.push(neutral_work(&format!("a{idx}"), "alice"));
    }
    for owner in ["bob", "carol"] {
        let mut work = neutral_work(&format!("{owner}-hard"), owner);
        work.difficulty = 4;
        jobs.push(work);
    }

    for (offset, work) in jobs.iter().enumerate() {
        env.add_work(work);
        let completed_at = midday() + Duration::minutes(offset as i64);
        scorer_at(env, completed_at)
            .calculate_score(&work.id, completed_at)
            .expect("score work");
        env.mark_completed(&work.id, completed_at);
    }
}

#[test]
fn user_leaderboard_orders_by_points_then_id() {
    let env = setup_test_environment();
    seed_three_users(&env);
    let service = LeaderboardService::new(env.store.clone());

    let board = service
        .leaderboard_in(LeaderboardScope::User, &window(), 10)
        .expect("leaderboard");
    let users = board.users().expect("user scope");

    let summary: Vec<(&str, i64, usize)> = users
        .iter()
        .map(|standing| (standing.user_id.as_str(), standing.points, standing.rank))
        .collect();
    assert_eq!(
        summary,
        vec![("alice", 300, 1), ("bob", 150, 2), ("carol", 150, 3)]
    );
    assert_eq!(users[0].display_name.as_deref(), Some("Alice"));
    assert_eq!(users[0].team_name.as_deref(), Some("Red"));
    assert_eq!(users[0].work_count, 3);
    assert_eq!(users[0].punctuality, 100);
}

#[test]
fn limit_truncates_and_reads_are_repeatable() {
    let env = setup_test_environment();
    seed_three_users(&env);
    let service = LeaderboardService::new(env.store.clone());

    let first = service
        .leaderboard_in(LeaderboardScope::User, &window(), 2)
        .expect("first read");
    let second = service
        .leaderboard_in(LeaderboardScope::User, &window(), 2)
        .expect("second read");
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn team_leaderboard_sums_members() {
    let env = setup_test_environment();
    seed_three_users(&env);
    let service = LeaderboardService::new(env.store.clone());

    let board = service
        .leaderboard_in(LeaderboardScope::Team, &window(), 10)
        .expect("leaderboard");
    let Leaderboard::Team(teams) = board else {
        panic!("expected team scope");
    };

    assert_eq!(teams.len(), 2);
    // equal points; both fully punctual; id breaks the tie
    assert_eq!(teams[0].team_id, "t-blue");
    assert_eq!(teams[0].points, 300);
    assert_eq!(teams[0].completed_work, 2);
    assert_eq!(teams[0].member_count, 2);
    assert_eq!(teams[1].team_id, "t-red");
    assert_eq!(teams[1].points, 300);
    assert_eq!(teams[1].member_count, 2);
    assert_eq!(teams[1].rank, 2);
}

#[test]
fn team_punctuality_includes_members_without_points() {
    let env = setup_test_environment();
    seed_three_users(&env);

    // dave finishes late work in the window but never gets a ledger record
    let mut late = neutral_work("dave-late", "dave");
    late.deadline = Some(midday() - Duration::days(2));
    env.add_work(&late);
    env.mark_completed("dave-late", midday());

    let service = LeaderboardService::new(env.store.clone());
    let teams = service.team_standings(&window()).expect("standings");
    let red = teams
        .iter()
        .find(|team| team.team_id == "t-red")
        .expect("red team");
    assert_eq!(red.points, 300);
    assert_eq!(red.completed_work, 4);
    assert_eq!(red.punctuality, 75);
}

#[test]
fn late_work_lowers_punctuality() {
    let env = setup_test_environment();
    env.add_user("erin", None);
    env.add_user("frank", None);

    let scorer = scorer_at(&env, midday());

    env.add_work(&neutral_work("e1", "erin"));
    scorer.calculate_score("e1", midday()).expect("score e1");
    env.mark_completed("e1", midday());

    // two days late: 100 * 0.8 * 1.2 * (1 - 0.1) = 86.4
    let mut late = neutral_work("f1", "frank");
    late.deadline = Some(midday() - Duration::days(2));
    late.priority = "low".to_string();
    late.quality = Some(4);
    env.add_work(&late);
    let outcome = scorer.calculate_score("f1", midday()).expect("score f1");
    env.mark_completed("f1", midday());
    assert_eq!(outcome.points, 86);

    let service = LeaderboardService::new(env.store.clone());
    let standings = service.user_standings(&window()).expect("standings");
    assert_eq!(standings[0].user_id, "erin");
    assert_eq!(standings[0].punctuality, 100);
    assert_eq!(standings[1].user_id, "frank");
    assert_eq!(standings[1].punctuality, 0);
}

#[test]
fn rank_and_summary_for_a_user() {
    let env = setup_test_environment();
    seed_three_users(&env);
    let service = LeaderboardService::new(env.store.clone());

    assert_eq!(service.user_rank_in("carol", &window()).expect("rank"), Some(3));
    assert_eq!(service.user_rank_in("dave", &window()).expect("rank"), None);

    let summary = service
        .user_summary_in("alice", &window())
        .expect("summary");
    assert_eq!(summary.total_points, 300);
    assert_eq!(summary.completed_work, 3);
    assert_eq!(summary.punctuality, 100);
    assert_eq!(summary.rank, Some(1));
    assert_eq!(summary.team_name.as_deref(), Some("Red"));
    assert_eq!(summary.achievements, vec!["100% punctual".to_string()]);

    let idle = service.user_summary_in("dave", &window()).expect("summary");
    assert_eq!(idle.total_points, 0);
    assert_eq!(idle.rank, None);
    assert_eq!(idle.punctuality, 0);
    assert!(idle.achievements.is_empty());
}

#[test]
fn lifetime_totals() {
    let env = setup_test_environment();
    seed_three_users(&env);
    let service = LeaderboardService::new(env.store.clone());

    assert_eq!(service.user_total("alice", None).expect("total"), 300);
    assert_eq!(
        service
            .user_total("alice", Some(midday() + Duration::minutes(1)))
            .expect("total since"),
        200
    );
    assert_eq!(service.team_total("t-blue", None).expect("team total"), 300);
    assert!(service
        .team_total("t-missing", None)
        .expect_err("unknown team")
        .is_not_found());
}

#[test]
fn empty_ledger_gives_empty_boards() {
    let env = setup_test_environment();
    env.add_user("alice", None);
    let service = LeaderboardService::new(env.store.clone());

    let users = service
        .leaderboard_in(LeaderboardScope::User, &window(), 10)
        .expect("users");
    let teams = service
        .leaderboard_in(LeaderboardScope::Team, &window(), 10)
        .expect("teams");
    assert!(users.is_empty());
    assert!(teams.is_empty());
    assert_eq!(users.scope(), LeaderboardScope::User);
}

#[test]
fn period_presets_window_recent_records() {
    let env = setup_test_environment();
    env.add_user("alice", None);
    for (days_ago, points) in [(2, 40), (20, 25), (60, 10)] {
        env.store
            .create_score_record(NewScoreRecord {
                user_id: "alice".to_string(),
                work_id: None,
                points,
                breakdown: ScoreBreakdown::DailyBonus(BonusBreakdown {
                    bonus: DailyBonusKind::Login,
                    points,
                    description: "seeded".to_string(),
                }),
                cap_exceeded: false,
                created_at: Utc::now() - Duration::days(days_ago),
            })
            .expect("seed record");
    }

    let service = LeaderboardService::new(env.store.clone());
    let points_in = |period| {
        service
            .leaderboard_for_period(LeaderboardScope::User, period, 10)
            .expect("leaderboard")
            .users()
            .map(|users| users[0].points)
            .expect("user scope")
    };
    assert_eq!(points_in(LeaderboardPeriod::Week), 40);
    assert_eq!(points_in(LeaderboardPeriod::Month), 65);
    assert_eq!(points_in(LeaderboardPeriod::Quarter), 75);
}
