//! Route guard
//!
//! [`AuthUser`] is an Axum extractor: a handler that takes it as a parameter
//! only runs once the bearer token has been verified and the user it names
//! still exists.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use bandsync_shared::errors::AuthError;
use tracing::{debug, warn};
use uuid::Uuid;

pub const NOT_LOGGED_IN: &str = "You are not logged in. Please log in to get access.";
pub const INVALID_TOKEN: &str = "Invalid token. Please log in again.";
pub const USER_GONE: &str = "The user belonging to this token no longer exists.";

/// Authenticated user resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Pull the token out of an `Authorization: Bearer <token>` header
///
/// Any other scheme, a non-UTF-8 value or an empty token counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Verify the request's token and resolve the user it belongs to
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers).map_err(|_| {
        debug!("Rejected request without bearer token");
        ApiError::Unauthorized(NOT_LOGGED_IN.to_string())
    })?;

    let user_id = state
        .jwt()
        .verify(token)
        .map_err(|_| ApiError::Unauthorized(INVALID_TOKEN.to_string()))?;

    let user = state.store().find_by_id(user_id).await?.ok_or_else(|| {
        warn!(%user_id, "Valid token for a user that no longer exists");
        ApiError::Unauthorized(USER_GONE.to_string())
    })?;

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    })
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        authenticate(&app_state, &parts.headers).await
    }
}
