mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{spawn_server, Accounts};

const SOME_ID: &str = "6f1c1c0e-6b8a-4c8e-9d7b-3a2f1e0d9c8b";

/// Role gates run before any store access, so denial needs no database
async fn assert_forbidden(token: &str, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let mut req = server.client.request(method.clone(), server.url(path)).bearer_auth(token);
    if let Some(body) = body {
        req = req.json(&body);
    }
    let res = req.send().await?;
    assert_eq!(
        res.status(),
        StatusCode::FORBIDDEN,
        "{} {} as {}",
        method,
        path,
        token
    );
    Ok(())
}

#[tokio::test]
async fn staff_cannot_write_reference_data() -> Result<()> {
    assert_forbidden("staff-token", reqwest::Method::POST, "/api/sites", Some(json!({ "name": "North" }))).await?;
    assert_forbidden(
        "staff-token",
        reqwest::Method::POST,
        "/api/vehicles",
        Some(json!({ "name": "Van", "registration": "DG01 VAN", "pet_capacity": 8 })),
    )
    .await?;
    assert_forbidden("staff-token", reqwest::Method::DELETE, &format!("/api/fields/{}", SOME_ID), None).await
}

#[tokio::test]
async fn clients_cannot_read_operational_data() -> Result<()> {
    assert_forbidden("client-token", reqwest::Method::GET, "/api/sites", None).await?;
    assert_forbidden("client-token", reqwest::Method::GET, "/api/staff", None).await?;
    assert_forbidden("client-token", reqwest::Method::GET, "/api/bookings", None).await?;
    assert_forbidden("client-token", reqwest::Method::GET, "/api/clients", None).await
}

#[tokio::test]
async fn user_administration_is_admin_only() -> Result<()> {
    assert_forbidden("staff-token", reqwest::Method::GET, "/api/users", None).await?;
    assert_forbidden(
        "client-token",
        reqwest::Method::PATCH,
        &format!("/api/users/{}", SOME_ID),
        Some(json!({ "role": "admin" })),
    )
    .await
}

#[tokio::test]
async fn staff_cannot_create_pets_or_delete_bookings() -> Result<()> {
    assert_forbidden("staff-token", reqwest::Method::POST, "/api/pets", Some(json!({ "name": "Rex" }))).await?;
    assert_forbidden("staff-token", reqwest::Method::DELETE, &format!("/api/bookings/{}", SOME_ID), None).await
}

#[tokio::test]
async fn client_without_record_sees_no_bookings() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/api/my-bookings"))
        .bearer_auth("orphan-client-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn client_without_record_sees_no_pets() -> Result<()> {
    let server = spawn_server(Accounts::standard()).await?;

    let res = server
        .client
        .get(server.url("/api/pets"))
        .bearer_auth("orphan-client-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn client_cannot_view_another_clients_record() -> Result<()> {
    assert_forbidden("client-token", reqwest::Method::GET, &format!("/api/clients/{}", SOME_ID), None).await
}
