mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::Value;

use common::{spawn_server, Accounts, GOOD_REFRESH};

#[tokio::test]
async fn root_banner_is_public() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server.client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["name"], "Daycare API");
    Ok(())
}

#[tokio::test]
async fn health_reports_unreachable_database() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn api_requires_a_session() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server.client.get(server.url("/api/auth/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn unknown_bearer_token_is_rejected() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/api/sites"))
        .bearer_auth("forged-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn me_returns_role_for_bearer_token() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/api/auth/me"))
        .bearer_auth("admin-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["email"], "admin-token@example.com");
    assert!(body["client_id"].is_null());
    Ok(())
}

#[tokio::test]
async fn session_cookie_authenticates() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/api/auth/me"))
        .header(header::COOKIE, "sb-access-token=client-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["role"], "client");
    assert!(body["client_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn expired_access_token_is_refreshed_from_cookie() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/api/auth/me"))
        .header(
            header::COOKIE,
            format!("sb-access-token=stale; sb-refresh-token={}", GOOD_REFRESH),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookies: Vec<&str> = res
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=fresh-access")));
    assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=fresh-refresh")));

    let body: Value = res.json().await?;
    assert_eq!(body["role"], "staff");
    Ok(())
}

#[tokio::test]
async fn revoked_refresh_token_is_rejected() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/api/auth/me"))
        .header(header::COOKIE, "sb-refresh-token=revoked")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn account_without_role_is_forbidden() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/api/auth/me"))
        .bearer_auth("no-role-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn short_password_is_rejected_before_provider_call() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .post(server.url("/api/auth/password"))
        .bearer_auth("client-token")
        .json(&serde_json::json!({ "password": "short" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert!(body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn password_change_uses_callers_token() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .post(server.url("/api/auth/password"))
        .bearer_auth("client-token")
        .json(&serde_json::json!({ "password": "long-enough-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_expires_session_cookies() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .post(server.url("/api/auth/logout"))
        .bearer_auth("staff-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let expired = res
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|c| c.contains("Max-Age=0"))
        .count();
    assert_eq!(expired, 2);
    Ok(())
}
