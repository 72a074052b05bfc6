use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Writes to a recipe are restricted to its author; admins may always write.
pub fn ensure_author_or_admin(user: &AuthUser, author_id: Uuid) -> Result<(), AppError> {
    if user.user_id != author_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn decode_bearer(parts: &axum::http::request::Parts) -> Result<AuthUser, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?;

    let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

    if !auth_str.starts_with("Bearer ") {
        return Err(AppError::Unauthorized);
    }
    let token = auth_str.trim_start_matches("Bearer ").trim();

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id =
        Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role.clone(),
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        decode_bearer(parts)
    }
}

/// Identity of the caller when present. Read endpoints are public but still
/// personalize flags like `is_favorited`, so an absent or invalid token
/// degrades to anonymous instead of rejecting the request.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(decode_bearer(parts).ok()))
    }
}
