use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{expired_cookie, AuthInfo};
use crate::error::ApiError;
use crate::middleware::{AccessToken, ApiResponse, ApiResult, JsonBody};
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

/// GET /api/auth/me - the caller's identity, role and linked records
pub async fn me(Extension(auth): Extension<AuthInfo>) -> ApiResult<AuthInfo> {
    Ok(ApiResponse::success(auth))
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

/// POST /api/auth/password - change the caller's password at the provider
pub async fn password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Extension(AccessToken(token)): Extension<AccessToken>,
    JsonBody(req): JsonBody<PasswordRequest>,
) -> ApiResult<serde_json::Value> {
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::field_error(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }

    state.identity.update_user_password(&token, &req.password).await?;
    tracing::info!("Password updated for user {}", auth.user_id);

    Ok(ApiResponse::success(json!({ "message": "Password updated" })))
}

/// POST /api/auth/logout - drop the session cookies
pub async fn logout(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> Response {
    let security = &state.config.security;
    let mut response = ApiResponse::no_content().into_response();
    for name in [&security.access_cookie, &security.refresh_cookie] {
        if let Some(cookie) = expired_cookie(security, name) {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }
    tracing::info!("User {} signed out", auth.user_id);
    response
}
