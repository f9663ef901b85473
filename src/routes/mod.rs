pub mod achievements;
pub mod analytics;
pub mod auth;
pub mod export;
pub mod games;
pub mod health;
pub mod leaderboard;
pub mod lessons;
pub mod users;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;

/// Optional class filters shared by several teacher-facing listings. Raw
/// strings on purpose: invalid values are ignored rather than rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassFilterQuery {
    pub level: Option<String>,
    pub level_letter: Option<String>,
}

pub(crate) fn require_teacher(auth: &AuthUser) -> Result<()> {
    if auth.is_teacher() {
        Ok(())
    } else {
        Err(Error::Forbidden("Teachers only".to_string()))
    }
}

pub(crate) fn require_student(auth: &AuthUser) -> Result<()> {
    if auth.is_student() {
        Ok(())
    } else {
        Err(Error::Forbidden("Students only".to_string()))
    }
}
