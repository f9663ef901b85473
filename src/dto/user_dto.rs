use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::lesson_dto::ProgressRow;
use crate::models::user::User;

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub level: Option<i32>,
    pub level_letter: String,
    pub class_display: String,
}

impl UserProfile {
    pub fn from_model(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            level: user.level,
            level_letter: user.level_letter.clone(),
            class_display: user.class_display(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub class_display: String,
    pub level: Option<i32>,
    pub level_letter: String,
}

impl StudentSummary {
    pub fn from_model(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            class_display: user.class_display(),
            level: user.level,
            level_letter: user.level_letter.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_points: i64,
    pub completed_lessons: i64,
    pub average_percentage: f64,
    pub total_attempts: i64,
    pub total_lessons: i64,
    pub overall_progress: f64,
    pub lessons_detail: Vec<ProgressRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentStats {
    pub student: StudentSummary,
    pub total_points: i64,
    pub completed_lessons: i64,
    pub average_percentage: f64,
    pub total_attempts: i64,
    pub total_lessons: i64,
    pub lessons_detail: Vec<ProgressRow>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub level: Option<i32>,
    pub level_letter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 1))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordResponse {
    pub message: String,
    pub username: String,
    pub new_password: String,
}
