use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    pub token_type: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn issue_token_pair(user_id: i64, role: &str, secret: &str) -> Result<TokenPair> {
    let access = sign(user_id, role, TOKEN_TYPE_ACCESS, Duration::hours(1), secret)?;
    let refresh = sign(user_id, role, TOKEN_TYPE_REFRESH, Duration::days(7), secret)?;
    Ok(TokenPair { access, refresh })
}

fn sign(
    user_id: i64,
    role: &str,
    token_type: &str,
    ttl: Duration,
    secret: &str,
) -> Result<String> {
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        token_type: token_type.to_string(),
        exp: (Utc::now() + ttl).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp"]);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;
    Ok(data.claims)
}
