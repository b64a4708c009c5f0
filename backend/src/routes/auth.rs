//! Authentication routes
//!
//! Registration, login, the current-user profile and password management.
//! Handlers stay thin: validation and persistence live in [`UserService`].

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::routes::extract::ApiJson;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use bandsync_shared::models::{User, UserWithMemberships};
use bandsync_shared::types::{
    AuthResponse, ChangePasswordRequest, DataResponse, ForgotPasswordRequest, LoginRequest,
    MessageResponse, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Register a new user
///
/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let resp =
        UserService::register(state.store(), state.jwt(), state.passwords(), req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// Login with email and password
///
/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let resp = UserService::login(state.store(), state.jwt(), state.passwords(), req).await?;
    Ok(Json(resp))
}

/// Current user with band memberships
///
/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<DataResponse<UserWithMemberships>>> {
    let user = UserService::get_current_user(state.store(), &auth_user).await?;
    Ok(Json(DataResponse::new(user)))
}

/// PUT /api/auth/profile
async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<DataResponse<User>>> {
    let user = UserService::update_profile(state.store(), &auth_user, req).await?;
    Ok(Json(DataResponse::new(user)))
}

/// PUT /api/auth/password
async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let resp =
        UserService::change_password(state.store(), state.passwords(), &auth_user, req).await?;
    Ok(Json(resp))
}

/// POST /api/auth/forgot-password
async fn forgot_password(
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    Ok(Json(UserService::forgot_password(&req)?))
}

/// POST /api/auth/reset-password
async fn reset_password(
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    Ok(Json(UserService::reset_password(&req)?))
}
