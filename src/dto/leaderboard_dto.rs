use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub class_display: String,
    pub total_points: i64,
    pub completed_lessons: i64,
    pub average_percentage: f64,
    pub rank: i32,
}
