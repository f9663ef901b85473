use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Running best-result summary per (user, lesson). `best_score` and
/// `best_percentage` only ever increase; `is_completed` latches on the first
/// attempt with percentage >= 70 and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LessonProgress {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub best_score: i32,
    pub best_percentage: f64,
    pub attempts_count: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_attempt_at: DateTime<Utc>,
}
