use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};

use crate::middleware::auth::AuthUser;
use crate::routes::ClassFilterQuery;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(filters): Query<ClassFilterQuery>,
) -> crate::error::Result<Response> {
    let entries = state
        .leaderboard_service
        .leaderboard(
            auth.id,
            &auth.role,
            filters.level.as_deref(),
            filters.level_letter.as_deref(),
        )
        .await?;
    Ok(Json(entries).into_response())
}
