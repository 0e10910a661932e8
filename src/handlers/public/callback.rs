use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use url::Url;

use crate::auth::{expired_cookie, read_cookie, session_cookie};
use crate::state::AppState;

const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";
const REFRESH_COOKIE_MAX_AGE: i64 = 60 * 60 * 24 * 7;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

/// Only same-site relative paths are followed; anything else goes home
pub fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/",
    }
}

/// Absolute redirect target under the configured site url
fn redirect_target(site_url: &str, path: &str) -> String {
    Url::parse(site_url)
        .and_then(|base| base.join(path))
        .map(String::from)
        .unwrap_or_else(|_| path.to_string())
}

/// GET /auth/callback?code&next - complete a sign-in redirect
pub async fn auth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let security = &state.config.security;
    let error_redirect = redirect_target(&security.site_url, AUTH_ERROR_PATH);

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        tracing::warn!("Auth callback without code");
        return Redirect::to(&error_redirect).into_response();
    };

    let verifier = read_cookie(&headers, &security.code_verifier_cookie);
    let session = match state.identity.exchange_code_for_session(code, verifier.as_deref()).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Auth code exchange failed: {}", e);
            return Redirect::to(&error_redirect).into_response();
        }
    };
    tracing::info!("User {} signed in", session.user.id);

    let next = sanitize_next(query.next.as_deref());
    let mut response = Redirect::to(&redirect_target(&security.site_url, next)).into_response();
    let cookies = [
        session_cookie(security, &security.access_cookie, &session.access_token, session.expires_in),
        session_cookie(security, &security.refresh_cookie, &session.refresh_token, REFRESH_COOKIE_MAX_AGE),
        expired_cookie(security, &security.code_verifier_cookie),
    ];
    for cookie in cookies.into_iter().flatten() {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(sanitize_next(Some("/bookings")), "/bookings");
        assert_eq!(sanitize_next(Some("/bookings?tab=upcoming")), "/bookings?tab=upcoming");
        assert_eq!(sanitize_next(None), "/");
        assert_eq!(sanitize_next(Some("https://evil.example")), "/");
        assert_eq!(sanitize_next(Some("//evil.example")), "/");
        assert_eq!(sanitize_next(Some("/\\evil.example")), "/");
    }

    #[test]
    fn redirect_is_anchored_to_site_url() {
        assert_eq!(
            redirect_target("https://app.example.com", "/bookings"),
            "https://app.example.com/bookings"
        );
        assert_eq!(redirect_target("not a url", "/bookings"), "/bookings");
    }
}
