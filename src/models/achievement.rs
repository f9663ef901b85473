use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const KIND_FIRST_LESSON: &str = "first_lesson";
pub const KIND_PERFECT_SCORE: &str = "perfect_score";
pub const KIND_STREAK: &str = "streak";
pub const KIND_ALL_LESSONS: &str = "all_lessons";
pub const KIND_FAST_LEARNER: &str = "fast_learner";
pub const KIND_PERSISTENT: &str = "persistent";

/// Badge granted once per (user, kind). Display fields are denormalized from
/// the static catalog at award time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Achievement {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub earned_at: DateTime<Utc>,
}

pub fn achievement_info(kind: &str) -> (&'static str, &'static str, &'static str) {
    match kind {
        KIND_FIRST_LESSON => ("First Step", "Completed the first lesson", "🎯"),
        KIND_PERFECT_SCORE => ("Perfect!", "100% correct answers on a quiz", "⭐"),
        KIND_STREAK => ("Winning Streak", "3 lessons in a row at 90%+", "🔥"),
        KIND_ALL_LESSONS => ("Master", "Completed every lesson", "👑"),
        KIND_FAST_LEARNER => ("Fast Learner", "Passed a lesson on the first try with 90%+", "⚡"),
        KIND_PERSISTENT => ("Persistence", "10+ attempts on a single lesson", "💪"),
        _ => ("Achievement", "A new achievement", "🏆"),
    }
}
