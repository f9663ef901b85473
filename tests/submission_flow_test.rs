//! End-to-end submission flow against a live PostgreSQL instance.
//!
//! Requires DATABASE_URL; run with `cargo test -- --ignored`.

use std::collections::HashMap;
use std::env;
use std::sync::Once;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tower::ServiceExt;

use lessons_backend::dto::lesson_dto::SubmitTestRequest;
use lessons_backend::services::test_service::TestService;
use lessons_backend::AppState;

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

fn unique_username(prefix: &str) -> String {
    format!(
        "{}_{}",
        prefix,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/lessons",
            get(lessons_backend::routes::lessons::list_lessons),
        )
        .route(
            "/api/lessons/:id",
            get(lessons_backend::routes::lessons::get_lesson),
        )
        .route(
            "/api/lessons/submit-test",
            post(lessons_backend::routes::tests::submit_test),
        )
        .route(
            "/api/achievements/me",
            get(lessons_backend::routes::achievements::get_my_achievements),
        )
        .layer(axum::middleware::from_fn(
            lessons_backend::middleware::auth::require_auth,
        ))
        .with_state(state)
}

fn public_app(state: AppState) -> Router {
    Router::new()
        .route("/api/users/register", post(lessons_backend::routes::auth::register))
        .route("/api/token", post(lessons_backend::routes::auth::login))
        .with_state(state)
}

async fn json_body(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_and_login(state: &AppState, username: &str) -> String {
    let app = public_app(state.clone());
    let register = json!({
        "username": username,
        "password": "Secret#123",
        "password_confirm": "Secret#123",
        "first_name": "Test",
        "last_name": "Student",
        "level": 7,
        "level_letter": "А"
    });
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/register")
                .header("content-type", "application/json")
                .body(Body::from(register.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let login = json!({"username": username, "password": "Secret#123"});
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/token")
                .header("content-type", "application/json")
                .body(Body::from(login.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    body["access"].as_str().expect("access token").to_string()
}

/// (question id -> correct option id) for one lesson, straight from the store.
async fn correct_answers(pool: &PgPool, lesson_id: i64) -> HashMap<String, i64> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT q.id, o.id
        FROM questions q
        JOIN answer_options o ON o.question_id = q.id AND o.is_correct = TRUE
        WHERE q.lesson_id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_all(pool)
    .await
    .expect("correct options");
    rows.into_iter().map(|(q, o)| (q.to_string(), o)).collect()
}

async fn wrong_answers(
    pool: &PgPool,
    lesson_id: i64,
    correct_count: usize,
) -> HashMap<String, i64> {
    let rows: Vec<(i64, i64, bool)> = sqlx::query_as(
        r#"
        SELECT q.id, o.id, o.is_correct
        FROM questions q
        JOIN answer_options o ON o.question_id = q.id
        WHERE q.lesson_id = $1
        ORDER BY q.id, o."order"
        "#,
    )
    .bind(lesson_id)
    .fetch_all(pool)
    .await
    .expect("options");

    let mut by_question: HashMap<i64, Vec<(i64, bool)>> = HashMap::new();
    for (q, o, ok) in rows {
        by_question.entry(q).or_default().push((o, ok));
    }

    let mut answers = HashMap::new();
    for (i, (q, options)) in by_question.into_iter().enumerate() {
        let want_correct = i < correct_count;
        let pick = options
            .iter()
            .find(|(_, ok)| *ok == want_correct)
            .map(|(o, _)| *o)
            .expect("option with wanted correctness");
        answers.insert(q.to_string(), pick);
    }
    answers
}

async fn lesson_id_by_order(pool: &PgPool, order: i32) -> i64 {
    sqlx::query_scalar(r#"SELECT id FROM lessons WHERE "order" = $1"#)
        .bind(order)
        .fetch_one(pool)
        .await
        .expect("lesson by order")
}

async fn user_id_by_username(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(pool)
        .await
        .expect("user by username")
}

#[tokio::test]
#[ignore]
async fn perfect_first_attempt_awards_badges() {
    let pool = setup().await;
    let state = AppState::new(pool.clone());
    let token = register_and_login(&state, &unique_username("flow")).await;

    let lesson1 = lesson_id_by_order(&pool, 1).await;
    let answers = correct_answers(&pool, lesson1).await;
    assert_eq!(answers.len(), 5);

    let submit = json!({"lesson_id": lesson1, "answers": answers});
    let resp = app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lessons/submit-test")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(submit.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["percentage"].as_f64().unwrap(), 100.0);
    assert_eq!(body["score"].as_i64().unwrap(), 50);
    assert_eq!(body["correct_answers"].as_i64().unwrap(), 5);
    assert_eq!(body["is_passed"].as_bool().unwrap(), true);

    let resp = app(state.clone())
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/achievements/me")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let badges = json_body(resp).await;
    let kinds: Vec<&str> = badges
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"first_lesson"));
    assert!(kinds.contains(&"perfect_score"));
    assert!(kinds.contains(&"fast_learner"));

    // Re-qualifying must not duplicate a badge.
    let resubmit = json!({"lesson_id": lesson1, "answers": correct_answers(&pool, lesson1).await});
    let resp = app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lessons/submit-test")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(resubmit.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let badges = json_body(
        app(state.clone())
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/achievements/me")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
    )
    .await;
    let perfect_count = badges
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["type"] == "perfect_score")
        .count();
    assert_eq!(perfect_count, 1);
}

#[tokio::test]
#[ignore]
async fn locked_lesson_rejects_submission_and_read_agrees() {
    let pool = setup().await;
    let state = AppState::new(pool.clone());
    let token = register_and_login(&state, &unique_username("gate")).await;

    let lesson2 = lesson_id_by_order(&pool, 2).await;
    let answers = correct_answers(&pool, lesson2).await;

    let before: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM test_attempts WHERE lesson_id = $1")
            .bind(lesson2)
            .fetch_one(&pool)
            .await
            .unwrap();

    // Write path rejects...
    let submit = json!({"lesson_id": lesson2, "answers": answers});
    let resp = app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lessons/submit-test")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(submit.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // ...and the read path agrees.
    let resp = app(state.clone())
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/lessons/{}", lesson2))
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // No attempt or progress row was created.
    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_attempts WHERE lesson_id = $1")
        .bind(lesson2)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
#[ignore]
async fn progress_folds_best_score_and_latches_completion() {
    let pool = setup().await;
    let state = AppState::new(pool.clone());
    let username = unique_username("fold");
    let token = register_and_login(&state, &username).await;
    let user_id = user_id_by_username(&pool, &username).await;

    let lesson1 = lesson_id_by_order(&pool, 1).await;

    // 1/5 correct: 20%, fail
    let submit = json!({"lesson_id": lesson1, "answers": wrong_answers(&pool, lesson1, 1).await});
    let resp = app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lessons/submit-test")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(submit.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["is_passed"].as_bool().unwrap(), false);

    // 4/5 correct: 80%, pass
    let submit = json!({"lesson_id": lesson1, "answers": wrong_answers(&pool, lesson1, 4).await});
    let resp = app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lessons/submit-test")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(submit.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let (best_score, attempts, completed, completed_at): (i32, i32, bool, Option<chrono::DateTime<chrono::Utc>>) =
        sqlx::query_as(
            "SELECT best_score, attempts_count, is_completed, completed_at
             FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2",
        )
        .bind(user_id)
        .bind(lesson1)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(best_score, 40);
    assert_eq!(attempts, 2);
    assert!(completed);
    assert!(completed_at.is_some());

    // A later failing attempt must not unset completion or lower the best.
    let submit = json!({"lesson_id": lesson1, "answers": wrong_answers(&pool, lesson1, 0).await});
    let resp = app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lessons/submit-test")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(submit.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let (best_score, attempts, completed): (i32, i32, bool) = sqlx::query_as(
        "SELECT best_score, attempts_count, is_completed
         FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2",
    )
    .bind(user_id)
    .bind(lesson1)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(best_score, 40);
    assert_eq!(attempts, 3);
    assert!(completed);
}

#[tokio::test]
#[ignore]
async fn concurrent_submissions_lose_no_updates() {
    let pool = setup().await;
    let state = AppState::new(pool.clone());
    let username = unique_username("race");
    let _token = register_and_login(&state, &username).await;
    let user_id = user_id_by_username(&pool, &username).await;

    let lesson1 = lesson_id_by_order(&pool, 1).await;
    let answers = correct_answers(&pool, lesson1).await;

    const WORKERS: usize = 8;
    let mut handles = Vec::new();
    for _ in 0..WORKERS {
        let service = TestService::new(pool.clone());
        let req = SubmitTestRequest {
            lesson_id: lesson1,
            answers: answers.clone(),
        };
        handles.push(tokio::spawn(async move {
            service.submit_test(user_id, &req).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("submit");
    }

    let (best_score, attempts, completed): (i32, i32, bool) = sqlx::query_as(
        "SELECT best_score, attempts_count, is_completed
         FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2",
    )
    .bind(user_id)
    .bind(lesson1)
    .fetch_one(&pool)
    .await
    .unwrap();
    // Every submission must be counted and the best never regresses.
    assert_eq!(attempts, WORKERS as i32);
    assert_eq!(best_score, 50);
    assert!(completed);

    let attempt_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM test_attempts WHERE user_id = $1 AND lesson_id = $2",
    )
    .bind(user_id)
    .bind(lesson1)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(attempt_rows, WORKERS as i64);
}
