use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const GAME_GRAMMAR_DETECTIVE: &str = "grammar-detective";
pub const GAME_SENTENCE_BUILDER: &str = "sentence-builder";
pub const GAME_MEMORY_CARDS: &str = "memory-cards";
pub const GAME_FILL_GAP_RACE: &str = "fill-gap-race";
pub const GAME_QUIZ_SHOW: &str = "quiz-show";

/// Raw per-session mini-game result. Append-only; all stats are derived at
/// read time by grouped aggregation, there is no progress table for games.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameResult {
    pub id: i64,
    pub user_id: i64,
    pub game_type: String,
    pub level: i32,
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub time_spent: i32,
    pub correct_count: i32,
    pub total_count: i32,
    pub created_at: DateTime<Utc>,
}
