use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_TEACHER: &str = "teacher";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub level: Option<i32>,
    pub level_letter: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_teacher(&self) -> bool {
        self.role == ROLE_TEACHER
    }

    pub fn full_name(&self) -> String {
        if !self.first_name.is_empty() && !self.last_name.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
        } else {
            self.username.clone()
        }
    }

    /// "7-А" style class label; empty for teachers and unplaced users.
    pub fn class_display(&self) -> String {
        if self.is_teacher() {
            return String::new();
        }
        class_display_for(self.level, &self.level_letter)
    }
}

pub fn class_display_for(level: Option<i32>, level_letter: &str) -> String {
    match level {
        Some(level) if !level_letter.is_empty() => format!("{}-{}", level, level_letter),
        Some(level) => format!("{}", level),
        None => String::new(),
    }
}
