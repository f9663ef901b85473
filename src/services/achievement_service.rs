use sqlx::PgPool;

use crate::error::Result;
use crate::models::achievement::{
    achievement_info, Achievement, KIND_ALL_LESSONS, KIND_FAST_LEARNER, KIND_FIRST_LESSON,
    KIND_PERFECT_SCORE, KIND_PERSISTENT, KIND_STREAK,
};
use crate::models::lesson::Lesson;

#[derive(Clone)]
pub struct AchievementService {
    pool: PgPool,
}

/// Adjacency check over qualifying lesson ids as they come back from the
/// store (ascending). A run holds when each id is exactly one greater than
/// its successor.
// TODO: rows arrive in ascending id order, so this only matches descending
// runs and in practice never fires; confirm the intended streak semantics
// before changing it.
pub fn is_streak_run(lesson_ids: &[i64]) -> bool {
    lesson_ids
        .windows(2)
        .all(|pair| pair[0] == pair[1] + 1)
}

impl AchievementService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn user_achievements(&self, user_id: i64) -> Result<Vec<Achievement>> {
        let rows = sqlx::query_as::<_, Achievement>(
            "SELECT * FROM achievements WHERE user_id = $1 ORDER BY earned_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Runs every badge rule once for a finished submission. Each rule is
    /// independent and each badge is granted at most once per user.
    pub async fn evaluate(
        &self,
        user_id: i64,
        lesson: &Lesson,
        percentage: f64,
        is_first_attempt: bool,
    ) -> Result<()> {
        if lesson.order == 1 {
            self.award(user_id, KIND_FIRST_LESSON).await?;
        }

        if percentage >= 100.0 {
            self.award(user_id, KIND_PERFECT_SCORE).await?;
        }

        if is_first_attempt && percentage >= 90.0 {
            self.award(user_id, KIND_FAST_LEARNER).await?;
        }

        let qualifying: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT lesson_id FROM lesson_progress
            WHERE user_id = $1 AND is_completed = TRUE AND best_percentage >= 90
            ORDER BY lesson_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        if qualifying.len() >= 3 && is_streak_run(&qualifying) {
            self.award(user_id, KIND_STREAK).await?;
        }

        let total_lessons: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lessons WHERE is_active = TRUE")
                .fetch_one(&self.pool)
                .await?;
        let completed: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lesson_progress WHERE user_id = $1 AND is_completed = TRUE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if total_lessons > 0 && completed >= total_lessons {
            self.award(user_id, KIND_ALL_LESSONS).await?;
        }

        let attempts: Option<i32> = sqlx::query_scalar(
            "SELECT attempts_count FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2",
        )
        .bind(user_id)
        .bind(lesson.id)
        .fetch_optional(&self.pool)
        .await?;
        if attempts.unwrap_or(0) >= 10 {
            self.award(user_id, KIND_PERSISTENT).await?;
        }

        Ok(())
    }

    /// First-time-only unlock; the (user_id, kind) unique index makes the
    /// insert a no-op when the badge is already held.
    async fn award(&self, user_id: i64, kind: &str) -> Result<()> {
        let already_held: Option<i64> =
            sqlx::query_scalar("SELECT id FROM achievements WHERE user_id = $1 AND kind = $2")
                .bind(user_id)
                .bind(kind)
                .fetch_optional(&self.pool)
                .await?;
        if already_held.is_some() {
            return Ok(());
        }

        let (title, description, icon) = achievement_info(kind);
        sqlx::query(
            r#"
            INSERT INTO achievements (user_id, kind, title, description, icon)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, kind) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(description)
        .bind(icon)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id, kind, "achievement unlocked");
        Ok(())
    }
}
