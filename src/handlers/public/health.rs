use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Daycare API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Booking and scheduling backend for a dog daycare",
        "endpoints": {
            "health": "/health (public)",
            "callback": "/auth/callback (public - sign-in redirect)",
            "auth": "/api/auth/me, /api/auth/password, /api/auth/logout",
            "profile": "/api/profile",
            "resources": "/api/{sites,fields,services,vehicles,staff,users,clients,pets,bookings}[/:id]",
            "availability": "/api/services/:id/availability, /api/services/:id/slots?date=YYYY-MM-DD",
            "my_bookings": "/api/my-bookings",
        }
    }))
}

/// GET /health - 503 while the database is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiError::service_unavailable("Database unavailable").into_response()
        }
    }
}
