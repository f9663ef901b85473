pub mod achievement_service;
pub mod analytics_service;
pub mod auth_service;
pub mod export_service;
pub mod game_service;
pub mod leaderboard_service;
pub mod lesson_service;
pub mod test_service;
pub mod user_service;
