use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    Extension,
};

use crate::middleware::auth::AuthUser;
use crate::routes::require_student;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_lessons(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> crate::error::Result<Response> {
    // Teachers see the plain catalog, students get their progress attached.
    let user_scope = auth.is_student().then_some(auth.id);
    let lessons = state.lesson_service.list_lessons(user_scope).await?;
    Ok(Json(lessons).into_response())
}

#[axum::debug_handler]
pub async fn get_lesson(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(lesson_id): Path<i64>,
) -> crate::error::Result<Response> {
    let lesson = state
        .lesson_service
        .get_lesson(lesson_id, auth.id, auth.is_teacher())
        .await?;
    Ok(Json(lesson).into_response())
}

#[axum::debug_handler]
pub async fn get_lesson_questions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(lesson_id): Path<i64>,
) -> crate::error::Result<Response> {
    let questions = state
        .lesson_service
        .lesson_questions(lesson_id, auth.is_teacher())
        .await?;
    Ok(Json(questions).into_response())
}

#[axum::debug_handler]
pub async fn get_my_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> crate::error::Result<Response> {
    require_student(&auth)?;
    let progress = state.lesson_service.user_progress(auth.id).await?;
    Ok(Json(progress).into_response())
}
