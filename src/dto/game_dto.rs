use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitGameResultRequest {
    #[validate(length(min = 1))]
    pub game_type: String,
    #[validate(range(min = 0, max = 10))]
    pub level: i32,
    #[validate(range(min = 0))]
    pub score: i32,
    #[validate(range(min = 1))]
    pub max_score: i32,
    #[validate(range(min = 0))]
    pub time_spent: i32,
    #[validate(range(min = 0))]
    pub correct_count: i32,
    #[validate(range(min = 1))]
    pub total_count: i32,
}

/// Aggregated per (game_type, level) stats for one user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GameStatsRow {
    pub game_type: String,
    pub level: i32,
    pub total_attempts: i64,
    pub best_score: i32,
    pub best_percentage: f64,
    pub avg_score: f64,
    pub avg_percentage: f64,
    pub avg_time: f64,
    pub last_played: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserGameSummary {
    pub total_games: i64,
    pub total_time: i64,
    pub avg_percentage: f64,
    pub games_played: HashMap<String, i64>,
    pub levels_completed: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClassGameStatsRow {
    pub student_id: i64,
    pub student_name: String,
    pub total_games: i64,
    pub avg_percentage: f64,
    pub total_time: i64,
    #[sqlx(default)]
    pub favorite_game: String,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GameLeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub time_spent: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentGameResult {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub game_type: String,
    pub level: i32,
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub time_spent: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentGameStats {
    pub stats: Vec<GameStatsRow>,
    pub summary: UserGameSummary,
}
