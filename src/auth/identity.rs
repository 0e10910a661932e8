use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use super::SessionUser;
use crate::config::IdentityConfig;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no session")]
    MissingSession,

    #[error("{0}")]
    InvalidToken(String),

    /// The provider refused the request for a caller-fixable reason
    #[error("{0}")]
    Rejected(String),

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Tokens issued by the provider after a code exchange or refresh
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: SessionUser,
}

/// Hosted identity provider, consumed through its public contract only
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the user behind an access token
    async fn get_user(&self, access_token: &str) -> Result<SessionUser, IdentityError>;

    /// Complete a PKCE sign-in redirect
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, IdentityError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, IdentityError>;

    async fn update_user_password(&self, access_token: &str, password: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: Uuid,
    email: Option<String>,
}

impl From<ProviderUser> for SessionUser {
    fn from(user: ProviderUser) -> Self {
        SessionUser {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: ProviderUser,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: token.user.into(),
        }
    }
}

/// Claims carried by provider-issued access tokens
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: Uuid,
    email: Option<String>,
}

/// HTTP client for a GoTrue-compatible auth server
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    decoding_key: Option<DecodingKey>,
}

impl GoTrueClient {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            decoding_key: config
                .jwt_secret
                .as_deref()
                .map(|secret| DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn verify_locally(key: &DecodingKey, access_token: &str) -> Result<SessionUser, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["authenticated"]);
        let data = decode::<AccessClaims>(access_token, key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        Ok(SessionUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                    IdentityError::InvalidToken(message)
                }
                _ => IdentityError::Provider(format!("{}: {}", status, message)),
            });
        }

        Ok(response.json::<TokenResponse>().await?.into())
    }
}

/// Best-effort human message from a provider error body
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn get_user(&self, access_token: &str) -> Result<SessionUser, IdentityError> {
        if let Some(key) = &self.decoding_key {
            return Self::verify_locally(key, access_token);
        }

        let response = self
            .http
            .get(self.endpoint("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(response.json::<ProviderUser>().await?.into()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(IdentityError::InvalidToken(error_message(response).await))
            }
            s => Err(IdentityError::Provider(format!("{}: {}", s, error_message(response).await))),
        }
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, IdentityError> {
        self.token_grant(
            "pkce",
            json!({ "auth_code": code, "code_verifier": code_verifier }),
        )
        .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn update_user_password(&self, access_token: &str, password: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .put(self.endpoint("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&json!({ "password": password }))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(IdentityError::InvalidToken(error_message(response).await))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(IdentityError::Rejected(error_message(response).await))
            }
            s => Err(IdentityError::Provider(format!("{}: {}", s, error_message(response).await))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn client() -> GoTrueClient {
        GoTrueClient::new(&IdentityConfig {
            url: "http://127.0.0.1:9/".to_string(),
            anon_key: "anon".to_string(),
            jwt_secret: Some(SECRET.to_string()),
        })
    }

    fn token(sub: Uuid, aud: &str, exp_offset: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + exp_offset;
        encode(
            &Header::default(),
            &json!({ "sub": sub, "aud": aud, "exp": exp, "email": "owner@example.com", "role": "authenticated" }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        assert_eq!(client().endpoint("/user"), "http://127.0.0.1:9/auth/v1/user");
    }

    #[tokio::test]
    async fn valid_token_is_verified_without_network() {
        let sub = Uuid::new_v4();
        let user = client().get_user(&token(sub, "authenticated", 3600)).await.unwrap();
        assert_eq!(user.id, sub);
        assert_eq!(user.email.as_deref(), Some("owner@example.com"));
    }

    #[tokio::test]
    async fn expired_or_foreign_tokens_are_rejected() {
        let sub = Uuid::new_v4();
        let expired = client().get_user(&token(sub, "authenticated", -3600)).await;
        assert!(matches!(expired, Err(IdentityError::InvalidToken(_))));

        let wrong_audience = client().get_user(&token(sub, "anon", 3600)).await;
        assert!(matches!(wrong_audience, Err(IdentityError::InvalidToken(_))));

        let garbage = client().get_user("not-a-jwt").await;
        assert!(matches!(garbage, Err(IdentityError::InvalidToken(_))));
    }
}
