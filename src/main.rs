use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use lessons_backend::{
    config::{get_config, init_config},
    database::{pool::create_pool, seed::seed_default_lessons},
    middleware::{auth, cors, rate_limit},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    seed_default_lessons(&pool).await?;

    let app_state = AppState::new(pool);

    let api_limiter = rate_limit::RateLimiter::per_minute(config.api_rpm);
    let auth_limiter = rate_limit::RateLimiter::per_minute(config.auth_rpm);
    api_limiter.start_sweeper();
    auth_limiter.start_sweeper();

    let base_routes = Router::new().route("/health", get(routes::health::health));

    // Login/registration sit behind the stricter limiter.
    let public_api = Router::new()
        .route("/api/users/register", post(routes::auth::register))
        .route("/api/token", post(routes::auth::login))
        .route("/api/token/refresh", post(routes::auth::refresh_token))
        .layer(axum::middleware::from_fn_with_state(
            auth_limiter.clone(),
            rate_limit::rate_limit_middleware,
        ));

    let protected_api = Router::new()
        .route(
            "/api/users/me",
            get(routes::users::get_me).patch(routes::users::update_me),
        )
        .route(
            "/api/users/change-password",
            post(routes::users::change_password),
        )
        .route("/api/users/students", get(routes::users::get_students))
        .route("/api/users/stats/me", get(routes::users::get_my_stats))
        .route("/api/users/stats/:id", get(routes::users::get_student_stats))
        .route(
            "/api/users/reset-password",
            post(routes::users::reset_student_password),
        )
        .route("/api/lessons", get(routes::lessons::list_lessons))
        .route(
            "/api/lessons/my-progress",
            get(routes::lessons::get_my_progress),
        )
        .route("/api/lessons/:id", get(routes::lessons::get_lesson))
        .route(
            "/api/lessons/:id/questions",
            get(routes::lessons::get_lesson_questions),
        )
        .route("/api/lessons/submit-test", post(routes::tests::submit_test))
        .route("/api/test-attempts", get(routes::tests::get_test_attempts))
        .route(
            "/api/test-attempts/by-lesson",
            get(routes::tests::get_test_attempts_by_lesson),
        )
        .route("/api/progress", get(routes::tests::get_progress))
        .route(
            "/api/progress/by-student",
            get(routes::tests::get_progress_by_student),
        )
        .route(
            "/api/progress/by-lesson",
            get(routes::tests::get_progress_by_lesson),
        )
        .route(
            "/api/achievements/me",
            get(routes::achievements::get_my_achievements),
        )
        .route("/api/leaderboard", get(routes::leaderboard::get_leaderboard))
        .route(
            "/api/games/results",
            post(routes::games::submit_game_result).get(routes::games::get_my_game_results),
        )
        .route("/api/games/stats", get(routes::games::get_my_game_stats))
        .route("/api/games/summary", get(routes::games::get_my_game_summary))
        .route("/api/games/best", get(routes::games::get_best_game_result))
        .route(
            "/api/games/leaderboard",
            get(routes::games::get_game_leaderboard),
        )
        .route(
            "/api/games/class-stats",
            get(routes::games::get_class_game_stats),
        )
        .route(
            "/api/games/recent",
            get(routes::games::get_recent_game_results),
        )
        .route(
            "/api/games/student/:id/stats",
            get(routes::games::get_student_game_stats),
        )
        .route("/api/export/stats", get(routes::export::export_stats))
        .route(
            "/api/analytics/class",
            get(routes::analytics::get_class_analytics),
        )
        .route(
            "/api/analytics/activity",
            get(routes::analytics::get_class_activity_stats),
        )
        .layer(axum::middleware::from_fn(auth::require_auth))
        .layer(axum::middleware::from_fn_with_state(
            api_limiter.clone(),
            rate_limit::rate_limit_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(protected_api)
        .with_state(app_state)
        .layer(cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
