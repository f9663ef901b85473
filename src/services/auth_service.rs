use sqlx::PgPool;

use crate::dto::auth_dto::{LoginRequest, RegisterRequest};
use crate::error::{Error, Result};
use crate::models::user::{User, ROLE_STUDENT};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::{decode_token, issue_token_pair, TokenPair, TOKEN_TYPE_REFRESH};
use crate::utils::validation::{
    sanitize_string, validate_email, validate_level, validate_level_letter, validate_password,
    validate_username,
};

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt_secret: String) -> Self {
        Self { pool, jwt_secret }
    }

    /// Self-service registration always creates a student.
    pub async fn register(&self, req: &RegisterRequest) -> Result<User> {
        let username = req.username.trim().to_string();
        validate_username(&username)?;

        if req.password != req.password_confirm {
            return Err(Error::Validation("Passwords do not match".to_string()));
        }
        validate_password(&req.password)?;

        let email = req.email.trim().to_lowercase();
        if !validate_email(&email) {
            return Err(Error::Validation("Invalid email format".to_string()));
        }

        validate_level(req.level)?;
        validate_level_letter(&req.level_letter)?;

        let first_name = sanitize_string(&req.first_name);
        let last_name = sanitize_string(&req.last_name);

        let password_hash = hash_password(&req.password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (username, password_hash, first_name, last_name, email, role, level, level_letter)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&username)
        .bind(&password_hash)
        .bind(&first_name)
        .bind(&last_name)
        .bind(&email)
        .bind(ROLE_STUDENT)
        .bind(req.level)
        .bind(&req.level_letter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => Error::Conflict("Username already exists".to_string()),
            other => other,
        })?;

        Ok(user)
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<TokenPair> {
        let username = req.username.trim();
        if username.is_empty() || req.password.is_empty() {
            return Err(Error::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid username or password".to_string()))?;

        let matches = verify_password(&req.password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Failed to verify password: {}", e)))?;
        if !matches {
            return Err(Error::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        issue_token_pair(user.id, &user.role, &self.jwt_secret)
    }

    /// Rotates the pair. Access tokens are rejected here; only a token minted
    /// as a refresh token can refresh.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = decode_token(refresh_token, &self.jwt_secret)?;
        if claims.token_type != TOKEN_TYPE_REFRESH {
            return Err(Error::Unauthorized("Invalid token type".to_string()));
        }
        issue_token_pair(claims.sub, &claims.role, &self.jwt_secret)
    }
}
