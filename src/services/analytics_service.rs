use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::dto::analytics_dto::{
    ActivityPeriod, ActivityStatRow, ActivityStats, ClassAnalytics, ClassInfo, ClassOverallStats,
    LessonClassStats,
};
use crate::error::Result;
use crate::models::user::class_display_for;

#[derive(Clone)]
pub struct AnalyticsService {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct LessonAggRow {
    lesson_id: i64,
    lesson_title: String,
    lesson_order: i32,
    completed_count: i64,
    total_attempts: i64,
    average_percentage: f64,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Per-lesson completion and score aggregates for one class, plus the
    /// class-wide totals.
    pub async fn class_analytics(
        &self,
        level: i32,
        level_letter: Option<&str>,
    ) -> Result<ClassAnalytics> {
        let total_students: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE role = 'student' AND deleted_at IS NULL
              AND level = $1
              AND ($2::TEXT IS NULL OR level_letter ILIKE $2)
            "#,
        )
        .bind(level)
        .bind(level_letter)
        .fetch_one(&self.pool)
        .await?;

        let lesson_rows = sqlx::query_as::<_, LessonAggRow>(
            r#"
            SELECT l.id AS lesson_id, l.title AS lesson_title, l."order" AS lesson_order,
                   COUNT(p.id) FILTER (WHERE p.is_completed) AS completed_count,
                   COALESCE(SUM(p.attempts_count), 0)::BIGINT AS total_attempts,
                   COALESCE(AVG(p.best_percentage) FILTER (WHERE p.best_percentage > 0), 0)
                       AS average_percentage
            FROM lessons l
            LEFT JOIN lesson_progress p ON p.lesson_id = l.id AND p.user_id IN (
                SELECT id FROM users
                WHERE role = 'student' AND deleted_at IS NULL
                  AND level = $1
                  AND ($2::TEXT IS NULL OR level_letter ILIKE $2)
            )
            WHERE l.is_active = TRUE
            GROUP BY l.id
            ORDER BY l."order"
            "#,
        )
        .bind(level)
        .bind(level_letter)
        .fetch_all(&self.pool)
        .await?;

        let lessons_stats = lesson_rows
            .into_iter()
            .map(|row| LessonClassStats {
                lesson_id: row.lesson_id,
                lesson_title: row.lesson_title,
                lesson_order: row.lesson_order,
                total_students,
                completed_count: row.completed_count,
                completion_rate: if total_students > 0 {
                    row.completed_count as f64 / total_students as f64 * 100.0
                } else {
                    0.0
                },
                average_percentage: row.average_percentage,
                total_attempts: row.total_attempts,
            })
            .collect();

        let (total_points, completed_lessons, average_percentage): (i64, i64, f64) =
            sqlx::query_as(
                r#"
                SELECT COALESCE(SUM(p.best_score), 0)::BIGINT,
                       COUNT(*) FILTER (WHERE p.is_completed),
                       COALESCE(AVG(p.best_percentage) FILTER (WHERE p.best_percentage > 0), 0)
                FROM lesson_progress p
                JOIN users u ON u.id = p.user_id
                WHERE u.role = 'student' AND u.deleted_at IS NULL
                  AND u.level = $1
                  AND ($2::TEXT IS NULL OR u.level_letter ILIKE $2)
                "#,
            )
            .bind(level)
            .bind(level_letter)
            .fetch_one(&self.pool)
            .await?;

        Ok(ClassAnalytics {
            class_info: ClassInfo {
                level,
                level_letter: level_letter.unwrap_or_default().to_string(),
                total_students,
            },
            overall_stats: ClassOverallStats {
                total_points,
                completed_lessons,
                average_percentage,
            },
            lessons_stats,
        })
    }

    /// Submission counts per (class, day) over the trailing period.
    pub async fn activity_stats(&self, days: i64) -> Result<ActivityStats> {
        let end_date = Utc::now();
        let start_date = end_date - Duration::days(days);

        let mut stats = sqlx::query_as::<_, ActivityStatRow>(
            r#"
            SELECT u.level, u.level_letter,
                   COUNT(*) AS count,
                   DATE(a.created_at)::TEXT AS date
            FROM test_attempts a
            JOIN users u ON u.id = a.user_id
            WHERE u.role = 'student'
              AND a.created_at >= $1 AND a.created_at <= $2
            GROUP BY u.level, u.level_letter, DATE(a.created_at)
            ORDER BY date DESC, u.level, u.level_letter
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        for row in &mut stats {
            row.class_display = class_display_for(row.level, &row.level_letter);
        }

        Ok(ActivityStats {
            period: ActivityPeriod {
                start_date,
                end_date,
                days,
            },
            stats,
        })
    }
}
