use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub is_completed: bool,
    pub best_percentage: f64,
    pub best_score: i32,
    pub attempts_count: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl ProgressSummary {
    pub fn empty() -> Self {
        Self {
            is_completed: false,
            best_percentage: 0.0,
            best_score: 0,
            attempts_count: 0,
            completed_at: None,
            last_attempt_at: None,
        }
    }

    pub fn from_model(p: &crate::models::progress::LessonProgress) -> Self {
        Self {
            is_completed: p.is_completed,
            best_percentage: p.best_percentage,
            best_score: p.best_score,
            attempts_count: p.attempts_count,
            completed_at: p.completed_at,
            last_attempt_at: Some(p.last_attempt_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOptionView {
    pub id: i64,
    pub text: String,
    pub order: i32,
    /// Only present for teachers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub text: String,
    pub order: i32,
    pub answer_options: Vec<AnswerOptionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub is_active: bool,
    pub questions: Vec<QuestionView>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSummary>,
    pub is_accessible: bool,
}

/// Per-lesson progress row with lesson context, used by the progress
/// listings and the stats detail sections.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProgressRow {
    pub lesson_id: i64,
    pub lesson_title: String,
    pub lesson_order: i32,
    pub best_percentage: f64,
    pub best_score: i32,
    pub attempts_count: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_attempt_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitTestRequest {
    pub lesson_id: i64,
    /// question id (as sent by the client, stringly keyed) -> chosen option id
    pub answers: HashMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitTestResponse {
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

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AttemptView {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub lesson_id: i64,
    pub lesson_title: String,
    pub score: i32,
    pub percentage: f64,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub is_passed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProgressByLessonRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub lesson_id: i64,
    pub lesson_title: String,
    pub best_score: i32,
    pub best_percentage: f64,
    pub attempts_count: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_attempt_at: DateTime<Utc>,
}
