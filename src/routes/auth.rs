use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::auth_dto::{
    LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, TokenResponse,
};
use crate::AppState;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let user = state.auth_service.register(&req).await?;
    tracing::info!(username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            username: user.username,
            role: user.role,
        }),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let pair = state.auth_service.login(&req).await?;
    Ok(Json(TokenResponse {
        access: pair.access,
        refresh: pair.refresh,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let pair = state.auth_service.refresh(&req.refresh).await?;
    Ok(Json(TokenResponse {
        access: pair.access,
        refresh: pair.refresh,
    })
    .into_response())
}
