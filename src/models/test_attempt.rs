use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One immutable record of a quiz submission. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestAttempt {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub score: i32,
    pub percentage: f64,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub is_passed: bool,
    pub created_at: DateTime<Utc>,
}
