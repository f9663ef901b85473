pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    achievement_service::AchievementService, analytics_service::AnalyticsService,
    auth_service::AuthService, game_service::GameService, leaderboard_service::LeaderboardService,
    lesson_service::LessonService, test_service::TestService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub lesson_service: LessonService,
    pub test_service: TestService,
    pub achievement_service: AchievementService,
    pub leaderboard_service: LeaderboardService,
    pub game_service: GameService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let auth_service = AuthService::new(pool.clone(), config.jwt_secret.clone());
        let user_service = UserService::new(pool.clone());
        let lesson_service = LessonService::new(pool.clone());
        let test_service = TestService::new(pool.clone());
        let achievement_service = AchievementService::new(pool.clone());
        let leaderboard_service = LeaderboardService::new(pool.clone());
        let game_service = GameService::new(pool.clone());
        let analytics_service = AnalyticsService::new(pool.clone());

        Self {
            pool,
            auth_service,
            user_service,
            lesson_service,
            test_service,
            achievement_service,
            leaderboard_service,
            game_service,
            analytics_service,
        }
    }
}
