use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ClassInfo {
    pub level: i32,
    pub level_letter: String,
    pub total_students: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassOverallStats {
    pub total_points: i64,
    pub completed_lessons: i64,
    pub average_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonClassStats {
    pub lesson_id: i64,
    pub lesson_title: String,
    pub lesson_order: i32,
    pub total_students: i64,
    pub completed_count: i64,
    pub completion_rate: f64,
    pub average_percentage: f64,
    pub total_attempts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassAnalytics {
    pub class_info: ClassInfo,
    pub overall_stats: ClassOverallStats,
    pub lessons_stats: Vec<LessonClassStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityPeriod {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityStatRow {
    pub level: Option<i32>,
    pub level_letter: String,
    #[sqlx(default)]
    pub class_display: String,
    pub count: i64,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityStats {
    pub period: ActivityPeriod,
    pub stats: Vec<ActivityStatRow>,
}
