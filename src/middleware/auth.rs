use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::Response,
};

use crate::auth::identity::{IdentityError, Session};
use crate::auth::{extract_session_tokens, session_cookie, SessionUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Access token the request was authenticated with, for calls made on the
/// user's behalf (password change)
#[derive(Clone, Debug)]
pub struct AccessToken(pub String);

/// Refresh tokens live for a week in the provider's default configuration
const REFRESH_COOKIE_MAX_AGE: i64 = 60 * 60 * 24 * 7;

/// Session authentication: bearer header or session cookie, validated by the
/// identity provider. An expired access token is renewed through the refresh
/// cookie and the new tokens are written back as cookies.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tokens = extract_session_tokens(request.headers(), &state.config.security);

    let verified = match tokens.access_token.as_deref() {
        Some(token) => match state.identity.get_user(token).await {
            Ok(user) => Some((user, token.to_string())),
            Err(IdentityError::InvalidToken(reason)) => {
                tracing::debug!("Access token rejected: {}", reason);
                None
            }
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    if let Some((user, token)) = verified {
        insert_session(&mut request, user, token);
        return Ok(next.run(request).await);
    }

    let Some(refresh_token) = tokens.refresh_token else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    let session = match state.identity.refresh_session(&refresh_token).await {
        Ok(session) => session,
        Err(IdentityError::InvalidToken(reason)) => {
            tracing::debug!("Refresh token rejected: {}", reason);
            return Err(ApiError::unauthorized("Session expired"));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!("Refreshed session for user {}", session.user.id);

    let Session {
        access_token,
        refresh_token,
        expires_in,
        user,
    } = session;
    insert_session(&mut request, user, access_token.clone());

    let mut response = next.run(request).await;
    let security = &state.config.security;
    let cookies = [
        session_cookie(security, &security.access_cookie, &access_token, expires_in),
        session_cookie(security, &security.refresh_cookie, &refresh_token, REFRESH_COOKIE_MAX_AGE),
    ];
    for cookie in cookies.into_iter().flatten() {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

fn insert_session(request: &mut Request, user: SessionUser, token: String) {
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(AccessToken(token));
}
