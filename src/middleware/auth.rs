use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::utils::token::{decode_token, TOKEN_TYPE_ACCESS};

/// Authenticated caller, inserted as a request extension by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: String,
}

impl AuthUser {
    pub fn is_teacher(&self) -> bool {
        self.role == crate::models::user::ROLE_TEACHER
    }

    pub fn is_student(&self) -> bool {
        self.role == crate::models::user::ROLE_STUDENT
    }
}

pub async fn require_auth(mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response();
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"bad_authorization"})),
        )
            .into_response();
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unsupported_scheme"})),
        )
            .into_response();
    };

    let config = crate::config::get_config();
    match decode_token(token, &config.jwt_secret) {
        Ok(claims) if claims.token_type == TOKEN_TYPE_ACCESS => {
            req.extensions_mut().insert(AuthUser {
                id: claims.sub,
                role: claims.role,
            });
            next.run(req).await
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response(),
    }
}
