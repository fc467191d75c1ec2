mod support;

use chrono::{Duration, Utc};
use support::{log, midday, neutral_work, scorer_at, setup_test_environment};
use work_score_engine::db::repositories::score_repository::ScoreRepository;
use work_score_engine::models::adjustment::DailyBonusKind;
use work_score_engine::models::score::{
    BonusBreakdown, NewScoreRecord, ScoreBreakdown, ScoreKind, ShareRole,
};
use work_score_engine::models::settings::ScoringConfig;
use work_score_engine::services::score_service::ScoreService;
use work_score_engine::services::score_store::ScoreStore;

#[test]
fn neutral_work_earns_exactly_the_base_score() {
    let env = setup_test_environment();
    env.add_user("alice", None);
    env.add_work(&neutral_work("w1", "alice"));

    let service = scorer_at(&env, midday());
    let outcome = service.calculate_score("w1", midday()).expect("score");

    assert_eq!(outcome.final_score, 100.0);
    assert_eq!(outcome.points, 100);
    assert!(!outcome.replayed);
    assert_eq!(outcome.record.kind(), ScoreKind::Completion);
    assert_eq!(outcome.record.created_at, midday());

    let stored = env
        .pool
        .with_connection(|conn| ScoreRepository::list_for_work(conn, "w1"))
        .expect("records");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].points, 100);
    let breakdown = stored[0].breakdown.as_completion().expect("completion breakdown");
    assert_eq!(breakdown.difficulty_multiplier, 1.0);
    assert_eq!(breakdown.final_score, 100.0);
}

#[test]
fn finishing_early_adds_punctuality_bonus() {
    let env = setup_test_environment();
    env.add_user("alice", None);

    let mut one_day_early = neutral_work("w1", "alice");
    one_day_early.deadline = Some(midday() + Duration::days(1));
    env.add_work(&one_day_early);

    let mut week_early = neutral_work("w2", "alice");
    week_early.deadline = Some(midday() + Duration::days(8));
    env.add_work(&week_early);

    let service = ScoreService::new(env.store.clone(), ScoringConfig::default());
    let first = service.calculate_score("w1", midday()).expect("score w1");
    let second = service.calculate_score("w2", midday()).expect("score w2");

    assert_eq!(first.breakdown.punctuality_bonus, 0.1);
    assert_eq!(first.points, 110);
    assert_eq!(second.breakdown.punctuality_bonus, 0.2);
    assert_eq!(second.points, 120);
}

#[test]
fn scoring_is_deterministic_and_non_negative() {
    let env = setup_test_environment();
    env.add_user("alice", None);

    let mut late = neutral_work("w1", "alice");
    late.difficulty = 1;
    late.priority = "low".to_string();
    late.quality = Some(1);
    late.deadline = Some(midday() - Duration::days(30));
    env.add_work(&late);

    let service = ScoreService::new(env.store.clone(), ScoringConfig::default());
    let work = env.store.get_work("w1").expect("work");
    let first = service.compute_breakdown(&work, &midday());
    let second = service.compute_breakdown(&work, &midday());
    assert_eq!(first, second);
    assert!(first.final_score >= 0.0);
    assert_eq!(first.lateness_penalty, 0.3);
}

#[test]
fn rescoring_returns_the_stored_outcome_without_writing() {
    let env = setup_test_environment();
    env.add_user("alice", None);
    env.add_work(&neutral_work("w1", "alice"));

    let service = ScoreService::new(env.store.clone(), ScoringConfig::default());
    let first = service.calculate_score("w1", midday()).expect("first");
    let again = service
        .calculate_score("w1", midday() + Duration::hours(1))
        .expect("again");

    assert!(again.replayed);
    assert_eq!(again.record.id, first.record.id);
    assert_eq!(again.points, first.points);

    let stored = env
        .pool
        .with_connection(|conn| ScoreRepository::list_for_work(conn, "w1"))
        .expect("records");
    assert_eq!(stored.len(), 1);
}

#[test]
fn team_work_distributes_owner_floor_and_contributor_pool() {
    let env = setup_test_environment();
    for user in ["alice", "bob", "carol"] {
        env.add_user(user, None);
    }

    let mut work = neutral_work("w1", "alice");
    work.collaborator_ids = vec!["bob".to_string(), "carol".to_string()];
    work.work_logs = vec![log("w1", "bob", 30), log("w1", "carol", 90), log("w1", "alice", 60)];
    env.add_work(&work);

    let service = ScoreService::new(env.store.clone(), ScoringConfig::default());
    let outcome = service.calculate_score("w1", midday()).expect("score");
    let distribution = outcome.distribution.expect("team distribution");

    assert!((distribution.team_score - 120.0).abs() < 1e-9);
    assert_eq!(distribution.records.len(), 3);

    let points_for = |user: &str| {
        distribution
            .records
            .iter()
            .find(|record| record.user_id == user)
            .map(|record| record.points)
            .expect("share record")
    };
    assert_eq!(points_for("alice"), 48);
    assert_eq!(points_for("bob"), 18);
    assert_eq!(points_for("carol"), 54);

    let owner_share = distribution.records[0]
        .breakdown
        .as_team_share()
        .expect("team share");
    assert_eq!(owner_share.role, ShareRole::Owner);

    let ledger_total: i64 = env
        .pool
        .with_connection(|conn| ScoreRepository::list_for_work(conn, "w1"))
        .expect("records")
        .iter()
        .map(|record| record.points)
        .sum();
    assert_eq!(ledger_total, 100 + 120);
}

#[test]
fn single_collaborator_gets_no_team_share() {
    let env = setup_test_environment();
    env.add_user("alice", None);
    env.add_user("bob", None);

    let mut work = neutral_work("w1", "alice");
    work.collaborator_ids = vec!["bob".to_string(), "alice".to_string()];
    env.add_work(&work);

    let service = ScoreService::new(env.store.clone(), ScoringConfig::default());
    let outcome = service.calculate_score("w1", midday()).expect("score");
    assert!(outcome.distribution.is_none());
}

#[test]
fn completion_beyond_the_daily_ceiling_is_flagged() {
    let env = setup_test_environment();
    env.add_user("alice", None);
    env.add_work(&neutral_work("w1", "alice"));

    env.store
        .create_score_record(NewScoreRecord {
            user_id: "alice".to_string(),
            work_id: None,
            points: 1950,
            breakdown: ScoreBreakdown::DailyBonus(BonusBreakdown {
                bonus: DailyBonusKind::FocusTime,
                points: 1950,
                description: "seeded".to_string(),
            }),
            cap_exceeded: false,
            created_at: midday() - Duration::hours(1),
        })
        .expect("seed record");

    let service = scorer_at(&env, midday());
    let outcome = service.calculate_score("w1", midday()).expect("score");
    assert!(outcome.record.cap_exceeded);
    assert_eq!(outcome.points, 100);
}

#[test]
fn daily_cap_boundary() {
    let env = setup_test_environment();
    env.add_user("at_cap", None);
    env.add_user("below_cap", None);

    let now = chrono::Local::now();
    let today_start = work_score_engine::utils::time::local_day_start(&now);
    for (user, points) in [("at_cap", 2000), ("below_cap", 1999)] {
        env.store
            .create_score_record(NewScoreRecord {
                user_id: user.to_string(),
                work_id: None,
                points,
                breakdown: ScoreBreakdown::DailyBonus(BonusBreakdown {
                    bonus: DailyBonusKind::Login,
                    points,
                    description: "seeded".to_string(),
                }),
                cap_exceeded: false,
                created_at: today_start,
            })
            .expect("seed record");
    }

    let service = ScoreService::new(env.store.clone(), ScoringConfig::default());
    assert!(!service.under_daily_cap_at("at_cap", now).expect("cap check"));
    assert!(service.under_daily_cap_at("below_cap", now).expect("cap check"));
    assert!(service.under_daily_cap_at("nobody", now).expect("cap check"));
}

#[test]
fn backdated_completions_count_against_todays_cap() {
    let env = setup_test_environment();
    env.add_user("alice", None);

    let yesterday = Utc::now() - Duration::days(1);
    let service = ScoreService::new(env.store.clone(), ScoringConfig::default());
    let mut last = None;
    for idx in 0..20 {
        let id = format!("late{idx}");
        env.add_work(&neutral_work(&id, "alice"));
        last = Some(service.calculate_score(&id, yesterday).expect("score"));
    }

    let last = last.expect("scored");
    assert!(last.record.created_at > yesterday + Duration::hours(23));
    assert!(!last.record.cap_exceeded);
    assert!(!service.under_daily_cap("alice").expect("cap check"));

    env.add_work(&neutral_work("over", "alice"));
    let over = service.calculate_score("over", yesterday).expect("score");
    assert!(over.record.cap_exceeded);
}
