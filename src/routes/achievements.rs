use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Extension,
};

use crate::middleware::auth::AuthUser;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_my_achievements(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> crate::error::Result<Response> {
    let achievements = state.achievement_service.user_achievements(auth.id).await?;
    Ok(Json(achievements).into_response())
}
