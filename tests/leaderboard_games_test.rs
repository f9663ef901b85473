//! Leaderboard scoping and game aggregation against a live PostgreSQL
//! instance. Requires DATABASE_URL; run with `cargo test -- --ignored`.

use std::env;
use std::sync::Once;

use sqlx::PgPool;

use lessons_backend::dto::game_dto::SubmitGameResultRequest;
use lessons_backend::services::game_service::GameService;
use lessons_backend::services::leaderboard_service::LeaderboardService;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
        env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
        if env::var("JWT_SECRET").is_err() {
            env::set_var("JWT_SECRET", "integration-test-secret-0123456789abcdef");
        }
        env::set_var("API_RPM", "10000");
        env::set_var("AUTH_RPM", "10000");
        lessons_backend::config::init_config().expect("init config");
    });
}

async fn setup() -> PgPool {
    init_test_config();
    let pool = lessons_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
    lessons_backend::database::seed::seed_default_lessons(&pool)
        .await
        .expect("seed");
    pool
}

fn tag() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

async fn seed_student(pool: &PgPool, username: &str, level: i32, letter: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO users (username, password_hash, first_name, last_name, role, level, level_letter)
        VALUES ($1, 'x', $1, 'Test', 'student', $2, $3)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(level)
    .bind(letter)
    .fetch_one(pool)
    .await
    .expect("seed student")
}

async fn seed_progress(pool: &PgPool, user_id: i64, lesson_order: i32, score: i32, pct: f64) {
    let lesson_id: i64 = sqlx::query_scalar(r#"SELECT id FROM lessons WHERE "order" = $1"#)
        .bind(lesson_order)
        .fetch_one(pool)
        .await
        .expect("lesson");
    sqlx::query(
        r#"
        INSERT INTO lesson_progress
            (user_id, lesson_id, best_score, best_percentage, attempts_count,
             is_completed, completed_at, last_attempt_at)
        VALUES ($1, $2, $3, $4, 1, $5, CASE WHEN $5 THEN NOW() ELSE NULL END, NOW())
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .bind(score)
    .bind(pct)
    .bind(pct >= 70.0)
    .execute(pool)
    .await
    .expect("seed progress");
}

#[tokio::test]
#[ignore]
async fn leaderboard_scopes_students_and_ranks_by_points() {
    let pool = setup().await;
    let service = LeaderboardService::new(pool.clone());
    let t = tag();

    // Class 9-Ж: two students; class 10-Ж: one outsider.
    let anna = seed_student(&pool, &format!("anna_{t}"), 9, "Ж").await;
    let boris = seed_student(&pool, &format!("boris_{t}"), 9, "Ж").await;
    let vera = seed_student(&pool, &format!("vera_{t}"), 10, "Ж").await;

    seed_progress(&pool, anna, 1, 50, 100.0).await;
    seed_progress(&pool, anna, 2, 40, 80.0).await;
    seed_progress(&pool, boris, 1, 50, 100.0).await;
    seed_progress(&pool, vera, 1, 30, 60.0).await;

    // A student with no filters sees their own class only.
    let entries = service
        .leaderboard(anna, "student", None, None)
        .await
        .expect("leaderboard");
    assert!(entries.iter().any(|e| e.user_id == anna));
    assert!(entries.iter().any(|e| e.user_id == boris));
    assert!(!entries.iter().any(|e| e.user_id == vera));

    let anna_entry = entries.iter().find(|e| e.user_id == anna).unwrap();
    let boris_entry = entries.iter().find(|e| e.user_id == boris).unwrap();
    assert_eq!(anna_entry.total_points, 90);
    assert_eq!(anna_entry.completed_lessons, 2);
    assert!(anna_entry.rank < boris_entry.rank);

    // Ranks are dense and 1-based.
    let mut ranks: Vec<i32> = entries.iter().map(|e| e.rank).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, (1..=entries.len() as i32).collect::<Vec<_>>());

    // Explicit valid filters replace the auto-scope outright.
    let entries = service
        .leaderboard(anna, "student", Some("10"), Some("Ж"))
        .await
        .expect("leaderboard");
    assert!(entries.iter().any(|e| e.user_id == vera));
    assert!(!entries.iter().any(|e| e.user_id == anna));

    // Invalid filters are ignored and the auto-scope stands.
    let entries = service
        .leaderboard(anna, "student", Some("99"), Some("ЖЖ"))
        .await
        .expect("leaderboard");
    assert!(entries.iter().any(|e| e.user_id == anna));
    assert!(!entries.iter().any(|e| e.user_id == vera));
}

#[tokio::test]
#[ignore]
async fn game_stats_aggregate_at_read_time() {
    let pool = setup().await;
    let service = GameService::new(pool.clone());
    let t = tag();
    let player = seed_student(&pool, &format!("player_{t}"), 8, "Б").await;

    let submit = |correct: i32, time_spent: i32| SubmitGameResultRequest {
        game_type: "quiz-show".to_string(),
        level: 1,
        score: correct * 10,
        max_score: 100,
        time_spent,
        correct_count: correct,
        total_count: 10,
    };

    service.submit_result(player, &submit(6, 120)).await.expect("submit");
    service.submit_result(player, &submit(9, 80)).await.expect("submit");
    service.submit_result(player, &submit(9, 60)).await.expect("submit");

    let stats = service.user_stats(player).await.expect("stats");
    let row = stats
        .iter()
        .find(|s| s.game_type == "quiz-show" && s.level == 1)
        .expect("stats row");
    assert_eq!(row.total_attempts, 3);
    assert_eq!(row.best_score, 90);
    assert_eq!(row.best_percentage, 90.0);

    // Best result ties on percentage break by lower time spent.
    let best = service
        .best_result(player, "quiz-show", 1)
        .await
        .expect("best")
        .expect("some result");
    assert_eq!(best.percentage, 90.0);
    assert_eq!(best.time_spent, 60);

    let summary = service.user_summary(player).await.expect("summary");
    assert_eq!(summary.total_games, 3);
    assert_eq!(summary.total_time, 260);
    assert_eq!(summary.games_played.get("quiz-show"), Some(&3));
    // one distinct (game, level) combo at >= 70%
    assert_eq!(summary.levels_completed, 1);

    // Per-user best rows on the leaderboard, never two rows per player.
    let board = service.leaderboard("quiz-show", 1, 50).await.expect("board");
    let mine: Vec<_> = board.iter().filter(|e| e.user_id == player).collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].time_spent, 60);
}
