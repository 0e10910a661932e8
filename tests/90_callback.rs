mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};

use common::{spawn_server, Accounts, GOOD_CODE};

fn location(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn missing_code_redirects_to_error_page() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server.client.get(server.url("/auth/callback")).send().await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res).as_deref(),
        Some("http://localhost:3000/auth/auth-code-error")
    );
    Ok(())
}

#[tokio::test]
async fn failed_exchange_redirects_to_error_page() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/auth/callback?code=expired-code"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(location(&res).unwrap_or_default().ends_with("/auth/auth-code-error"));
    Ok(())
}

#[tokio::test]
async fn successful_exchange_sets_cookies_and_follows_next() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url(&format!("/auth/callback?code={}&next=/bookings", GOOD_CODE)))
        .header(header::COOKIE, "sb-code-verifier=verifier")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res).as_deref(), Some("http://localhost:3000/bookings"));

    let cookies: Vec<&str> = res
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=fresh-access")));
    assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=fresh-refresh")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("sb-code-verifier=;") && c.contains("Max-Age=0")));
    Ok(())
}

#[tokio::test]
async fn external_next_falls_back_to_home() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url(&format!("/auth/callback?code={}&next=//evil.example", GOOD_CODE)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res).as_deref(), Some("http://localhost:3000/"));
    Ok(())
}
