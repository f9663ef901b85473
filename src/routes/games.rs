use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde::Deserialize;
use validator::Validate;

use crate::dto::game_dto::{StudentGameStats, SubmitGameResultRequest};
use crate::error::Error;
use crate::middleware::auth::AuthUser;
use crate::routes::require_teacher;
use crate::utils::validation::normalize_level_letter;
use crate::AppState;

#[axum::debug_handler]
pub async fn submit_game_result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SubmitGameResultRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let result = state.game_service.submit_result(auth.id, &req).await?;
    Ok((StatusCode::CREATED, Json(result)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct GameResultsQuery {
    pub game_type: Option<String>,
    pub level: Option<String>,
}

fn parse_level(raw: &Option<String>) -> Option<i32> {
    raw.as_deref().and_then(|s| s.parse::<i32>().ok())
}

#[axum::debug_handler]
pub async fn get_my_game_results(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<GameResultsQuery>,
) -> crate::error::Result<Response> {
    let results = state
        .game_service
        .user_results(
            auth.id,
            query.game_type.as_deref().filter(|s| !s.is_empty()),
            parse_level(&query.level),
        )
        .await?;
    Ok(Json(results).into_response())
}

#[axum::debug_handler]
pub async fn get_my_game_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> crate::error::Result<Response> {
    let stats = state.game_service.user_stats(auth.id).await?;
    Ok(Json(stats).into_response())
}

#[axum::debug_handler]
pub async fn get_my_game_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> crate::error::Result<Response> {
    let summary = state.game_service.user_summary(auth.id).await?;
    Ok(Json(summary).into_response())
}

#[axum::debug_handler]
pub async fn get_best_game_result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<GameResultsQuery>,
) -> crate::error::Result<Response> {
    let (Some(game_type), Some(level)) = (
        query.game_type.as_deref().filter(|s| !s.is_empty()),
        parse_level(&query.level),
    ) else {
        return Err(Error::Validation(
            "game_type and level are required".to_string(),
        ));
    };

    let best = state
        .game_service
        .best_result(auth.id, game_type, level)
        .await?;
    Ok(Json(best).into_response())
}

#[derive(Debug, Deserialize)]
pub struct GameLeaderboardQuery {
    pub game_type: Option<String>,
    pub level: Option<String>,
    pub limit: Option<String>,
}

#[axum::debug_handler]
pub async fn get_game_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<GameLeaderboardQuery>,
) -> crate::error::Result<Response> {
    let (Some(game_type), Some(level)) = (
        query.game_type.as_deref().filter(|s| !s.is_empty()),
        query.level.as_deref().and_then(|s| s.parse::<i32>().ok()),
    ) else {
        return Err(Error::Validation(
            "game_type and level are required".to_string(),
        ));
    };
    let limit = query
        .limit
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(10);

    let entries = state
        .game_service
        .leaderboard(game_type, level, limit)
        .await?;
    Ok(Json(entries).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ClassGamesQuery {
    pub level: Option<String>,
    pub level_letter: Option<String>,
    pub limit: Option<String>,
}

/// Teachers filter any class; students are pinned to their own.
#[axum::debug_handler]
pub async fn get_class_game_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ClassGamesQuery>,
) -> crate::error::Result<Response> {
    let (level, letter) = if auth.is_teacher() {
        (
            parse_level(&query.level),
            query
                .level_letter
                .as_deref()
                .and_then(normalize_level_letter),
        )
    } else {
        let user = state.user_service.get_user(auth.id).await?;
        let letter = (!user.level_letter.is_empty()).then_some(user.level_letter);
        (user.level, letter)
    };

    let stats = state
        .game_service
        .class_stats(level, letter.as_deref())
        .await?;
    Ok(Json(stats).into_response())
}

#[axum::debug_handler]
pub async fn get_recent_game_results(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ClassGamesQuery>,
) -> crate::error::Result<Response> {
    require_teacher(&auth)?;
    let limit = query
        .limit
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(20);
    let letter = query
        .level_letter
        .as_deref()
        .and_then(normalize_level_letter);
    let results = state
        .game_service
        .recent_results(limit, parse_level(&query.level), letter.as_deref())
        .await?;
    Ok(Json(results).into_response())
}

#[axum::debug_handler]
pub async fn get_student_game_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(student_id): Path<i64>,
) -> crate::error::Result<Response> {
    require_teacher(&auth)?;
    let stats = state.game_service.user_stats(student_id).await?;
    let summary = state.game_service.user_summary(student_id).await?;
    Ok(Json(StudentGameStats { stats, summary }).into_response())
}
