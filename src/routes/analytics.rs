use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde::Deserialize;

use crate::error::Error;
use crate::middleware::auth::AuthUser;
use crate::routes::require_teacher;
use crate::utils::validation::validate_level;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassAnalyticsQuery {
    pub level: Option<String>,
    pub level_letter: Option<String>,
}

#[axum::debug_handler]
pub async fn get_class_analytics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ClassAnalyticsQuery>,
) -> crate::error::Result<Response> {
    require_teacher(&auth)?;

    let Some(raw_level) = query.level.as_deref().filter(|s| !s.is_empty()) else {
        return Err(Error::Validation("level parameter is required".to_string()));
    };
    let level: i32 = raw_level
        .parse()
        .map_err(|_| Error::Validation("Invalid level format".to_string()))?;
    validate_level(level)?;

    let letter = match query.level_letter.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => {
            let letter = raw.trim().to_uppercase();
            if letter.chars().count() > 1 {
                return Err(Error::Validation("Invalid class letter format".to_string()));
            }
            Some(letter)
        }
        None => None,
    };

    let analytics = state
        .analytics_service
        .class_analytics(level, letter.as_deref())
        .await?;
    Ok(Json(analytics).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub days: Option<String>,
}

#[axum::debug_handler]
pub async fn get_class_activity_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ActivityQuery>,
) -> crate::error::Result<Response> {
    require_teacher(&auth)?;

    let days = query
        .days
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|d| (1..=365).contains(d))
        .unwrap_or(30);

    let stats = state.analytics_service.activity_stats(days).await?;
    Ok(Json(stats).into_response())
}
