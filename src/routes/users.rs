use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use validator::Validate;

use crate::dto::user_dto::{
    ChangePasswordRequest, ResetPasswordRequest, ResetPasswordResponse, StudentSummary,
    UpdateProfileRequest, UserProfile,
};
use crate::middleware::auth::AuthUser;
use crate::routes::{require_teacher, ClassFilterQuery};
use crate::AppState;

#[axum::debug_handler]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> crate::error::Result<Response> {
    let user = state.user_service.get_user(auth.id).await?;
    Ok(Json(UserProfile::from_model(&user)).into_response())
}

#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    state.user_service.update_profile(auth.id, &req).await?;
    Ok(Json(serde_json::json!({"message": "Profile updated"})).into_response())
}

#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    state
        .user_service
        .change_password(auth.id, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(serde_json::json!({"message": "Password changed"})).into_response())
}

#[axum::debug_handler]
pub async fn get_students(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(filters): Query<ClassFilterQuery>,
) -> crate::error::Result<Response> {
    require_teacher(&auth)?;
    let students = state
        .user_service
        .get_students(filters.level.as_deref(), filters.level_letter.as_deref())
        .await?;
    let body: Vec<StudentSummary> = students.iter().map(StudentSummary::from_model).collect();
    Ok(Json(body).into_response())
}

#[axum::debug_handler]
pub async fn get_my_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> crate::error::Result<Response> {
    let stats = state.user_service.user_stats(auth.id).await?;
    Ok(Json(stats).into_response())
}

#[axum::debug_handler]
pub async fn get_student_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(student_id): Path<i64>,
) -> crate::error::Result<Response> {
    require_teacher(&auth)?;
    let stats = state.user_service.student_stats(student_id).await?;
    Ok(Json(stats).into_response())
}

#[axum::debug_handler]
pub async fn reset_student_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ResetPasswordRequest>,
) -> crate::error::Result<Response> {
    require_teacher(&auth)?;
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(crate::error::Error::Validation(
            "Username is required".to_string(),
        ));
    }
    let new_password = state
        .user_service
        .reset_student_password(&username)
        .await?;
    tracing::info!(%username, "student password reset by teacher");
    Ok(Json(ResetPasswordResponse {
        message: "Password reset".to_string(),
        username,
        new_password,
    })
    .into_response())
}
