pub mod directory;
pub mod identity;

use axum::http::{header, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::error::ApiError;

/// Authorization role stored per user in `profiles.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Client => "client",
        }
    }

    /// Staff and admin share read access to operational resources
    pub fn is_staff_or_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "client" => Ok(Role::Client),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A user authenticated by the identity provider; no role yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Everything handlers need to authorize a request:
/// authenticated ⇒ has a role ⇒ may have a client and/or staff record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthInfo {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
}

impl AuthInfo {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff_or_admin(&self) -> bool {
        self.role.is_staff_or_admin()
    }

    /// Fail with 403 unless the caller holds one of `allowed`
    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        tracing::warn!(
            "Denied {} user {}: requires one of {:?}",
            self.role,
            self.user_id,
            allowed
        );
        let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
        Err(ApiError::forbidden(format!(
            "Insufficient role: requires {}",
            names.join(" or ")
        )))
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require(&[Role::Admin])
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        self.require(&[Role::Admin, Role::Staff])
    }

    /// The caller's client id, or 403 when they have no client record
    pub fn own_client_id(&self) -> Result<Uuid, ApiError> {
        self.client_id
            .ok_or_else(|| ApiError::forbidden("No client profile is linked to this account"))
    }
}

/// Access token and optional refresh token found on a request
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Bearer header (mobile) wins over the session cookie (web)
pub fn extract_session_tokens(headers: &HeaderMap, security: &SecurityConfig) -> SessionTokens {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| extract_bearer_token(v).ok());

    let access_token = bearer.or_else(|| read_cookie(headers, &security.access_cookie));
    let refresh_token = read_cookie(headers, &security.refresh_cookie);

    SessionTokens {
        access_token,
        refresh_token,
    }
}

/// Parse "Bearer <token>" and return the token portion
pub fn extract_bearer_token(auth_header: &str) -> Result<String, String> {
    const BEARER_PREFIX: &str = "Bearer ";

    let token = auth_header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| "Authorization header must start with 'Bearer '".to_string())?
        .trim();

    if token.is_empty() {
        return Err("Bearer token is empty".to_string());
    }

    Ok(token.to_string())
}

/// Read one cookie value from every Cookie header on the request
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Set-Cookie value for a session cookie
pub fn session_cookie(security: &SecurityConfig, name: &str, value: &str, max_age_secs: i64) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age_secs
    );
    if security.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Set-Cookie value that removes a cookie
pub fn expired_cookie(security: &SecurityConfig, name: &str) -> Option<HeaderValue> {
    session_cookie(security, name, "", 0)
}
