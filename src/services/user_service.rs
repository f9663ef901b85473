use sqlx::PgPool;

use crate::dto::user_dto::{StudentStats, StudentSummary, UpdateProfileRequest, UserStats};
use crate::error::{Error, Result};
use crate::models::user::{User, ROLE_STUDENT};
use crate::services::lesson_service::LessonService;
use crate::utils::crypto::{generate_password, hash_password, verify_password};
use crate::utils::validation::{normalize_level_letter, validate_email, validate_level};

const RESET_PASSWORD_LENGTH: usize = 8;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Students sorted by class then name. Filters are applied only when
    /// valid: level must parse into 1..=11, the letter must normalize to a
    /// single character.
    pub async fn get_students(
        &self,
        level_filter: Option<&str>,
        letter_filter: Option<&str>,
    ) -> Result<Vec<User>> {
        let level: Option<i32> = level_filter
            .and_then(|raw| raw.parse::<i32>().ok())
            .filter(|l| (1..=11).contains(l));
        let letter: Option<String> = letter_filter.and_then(normalize_level_letter);

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE role = 'student' AND deleted_at IS NULL
              AND ($1::INT IS NULL OR level = $1)
              AND ($2::TEXT IS NULL OR level_letter ILIKE $2)
            ORDER BY level, level_letter, last_name, first_name
            "#,
        )
        .bind(level)
        .bind(letter)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Aggregate over the user's progress rows: Σ best_score, completed
    /// count, mean best_percentage over completed rows only.
    pub async fn user_stats(&self, user_id: i64) -> Result<UserStats> {
        let lesson_svc = LessonService::new(self.pool.clone());
        let detail = lesson_svc.user_progress(user_id).await?;

        let mut total_points: i64 = 0;
        let mut total_attempts: i64 = 0;
        let mut completed_lessons: i64 = 0;
        let mut completed_percentage_sum = 0.0;
        for row in &detail {
            total_points += i64::from(row.best_score);
            total_attempts += i64::from(row.attempts_count);
            if row.is_completed {
                completed_lessons += 1;
                completed_percentage_sum += row.best_percentage;
            }
        }

        let average_percentage = if completed_lessons > 0 {
            completed_percentage_sum / completed_lessons as f64
        } else {
            0.0
        };

        let total_lessons: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lessons WHERE is_active = TRUE")
                .fetch_one(&self.pool)
                .await?;
        let overall_progress = if total_lessons > 0 {
            completed_lessons as f64 / total_lessons as f64 * 100.0
        } else {
            0.0
        };

        Ok(UserStats {
            total_points,
            completed_lessons,
            average_percentage,
            total_attempts,
            total_lessons,
            overall_progress,
            lessons_detail: detail,
        })
    }

    pub async fn student_stats(&self, student_id: i64) -> Result<StudentStats> {
        let student = self
            .get_user(student_id)
            .await
            .map_err(|_| Error::NotFound("Student not found".to_string()))?;
        let stats = self.user_stats(student_id).await?;

        Ok(StudentStats {
            student: StudentSummary::from_model(&student),
            total_points: stats.total_points,
            completed_lessons: stats.completed_lessons,
            average_percentage: stats.average_percentage,
            total_attempts: stats.total_attempts,
            total_lessons: stats.total_lessons,
            lessons_detail: stats.lessons_detail,
        })
    }

    /// Teacher-initiated reset. Returns the generated plaintext exactly once.
    pub async fn reset_student_password(&self, username: &str) -> Result<String> {
        let user = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| Error::NotFound("No student with that username".to_string()))?;
        if user.role != ROLE_STUDENT {
            return Err(Error::Validation(
                "Only student passwords can be reset".to_string(),
            ));
        }

        let new_password = generate_password(RESET_PASSWORD_LENGTH);
        let hash = hash_password(&new_password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
        self.update_password_hash(user.id, &hash).await?;

        Ok(new_password)
    }

    pub async fn update_profile(&self, user_id: i64, req: &UpdateProfileRequest) -> Result<()> {
        let email: Option<String> = match &req.email {
            Some(raw) => {
                let email = raw.trim().to_lowercase();
                if email.is_empty() {
                    None
                } else if !validate_email(&email) {
                    return Err(Error::Validation("Invalid email format".to_string()));
                } else {
                    Some(email)
                }
            }
            None => None,
        };

        let level: Option<i32> = match req.level {
            Some(level) => {
                validate_level(level)?;
                Some(level)
            }
            None => None,
        };

        let letter: Option<String> = match &req.level_letter {
            Some(raw) if !raw.trim().is_empty() => Some(
                normalize_level_letter(raw)
                    .ok_or_else(|| Error::Validation("Invalid class letter format".to_string()))?,
            ),
            _ => None,
        };

        if email.is_none() && level.is_none() && letter.is_none() {
            return Err(Error::Validation("Nothing to update".to_string()));
        }

        sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                level = COALESCE($3, level),
                level_letter = COALESCE($4, level_letter),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(level)
        .bind(letter)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self.get_user(user_id).await?;

        let matches = verify_password(old_password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Failed to verify password: {}", e)))?;
        if !matches {
            return Err(Error::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        if new_password.len() < 6 {
            return Err(Error::Validation(
                "New password must be at least 6 characters".to_string(),
            ));
        }

        let hash = hash_password(new_password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
        self.update_password_hash(user_id, &hash).await
    }

    async fn update_password_hash(&self, user_id: i64, hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
