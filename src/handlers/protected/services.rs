use axum::{extract::State, Extension};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::auth::AuthInfo;
use crate::database::models::{CreateAvailability, CreateService, Service, ServiceAvailability, UpdateService};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam, QueryParams};
use crate::services::availability::{slots_for, Slot};
use crate::state::AppState;

/// Clients only ever see active services; inactive ones 404 for them
async fn visible_service(conn: &mut PgConnection, auth: &AuthInfo, id: Uuid) -> Result<Service, ApiError> {
    let service = Repository::<Service>::select_404(conn, id).await?;
    if !service.is_active && !auth.is_staff_or_admin() {
        return Err(ApiError::not_found(format!("Service {} not found", id)));
    }
    Ok(service)
}

/// GET /api/services
pub async fn list(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> ApiResult<Vec<Service>> {
    let mut conn = state.db.admin().await?;
    let services = if auth.is_staff_or_admin() {
        Repository::<Service>::select_all(&mut conn).await?
    } else {
        Service::list_active(&mut conn).await?
    };
    Ok(ApiResponse::success(services))
}

/// POST /api/services - duplicate name is a 409
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<CreateService>,
) -> ApiResult<Service> {
    auth.require_admin()?;
    req.validate()?;

    let mut conn = state.db.admin().await?;
    let service = Service::insert(&mut conn, &req).await?;
    tracing::info!("Created service {} '{}'", service.id, service.name);
    Ok(ApiResponse::created(service))
}

/// GET /api/services/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Service> {
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(visible_service(&mut conn, &auth, id).await?))
}

/// PATCH /api/services/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateService>,
) -> ApiResult<Service> {
    auth.require_admin()?;
    req.validate()?;

    let update = Service::patch(req);
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(update.returning(id, &mut conn).await?))
}

/// DELETE /api/services/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Repository::<Service>::delete_404(&mut conn, id).await?;
    tracing::info!("Deleted service {}", id);
    Ok(ApiResponse::no_content())
}

/// GET /api/services/:id/availability
pub async fn list_availability(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Vec<ServiceAvailability>> {
    let mut conn = state.db.admin().await?;
    let service = visible_service(&mut conn, &auth, id).await?;
    Ok(ApiResponse::success(ServiceAvailability::for_service(&mut conn, service.id).await?))
}

/// POST /api/services/:id/availability
pub async fn create_availability(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<CreateAvailability>,
) -> ApiResult<ServiceAvailability> {
    auth.require_admin()?;
    req.validate()?;

    let mut conn = state.db.admin().await?;
    let rule = ServiceAvailability::insert(&mut conn, id, &req).await?;
    tracing::info!("Added availability rule {} to service {}", rule.id, id);
    Ok(ApiResponse::created(rule))
}

/// DELETE /api/service-availability/:id
pub async fn delete_availability(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Repository::<ServiceAvailability>::delete_404(&mut conn, id).await?;
    Ok(ApiResponse::no_content())
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

/// GET /api/services/:id/slots?date=YYYY-MM-DD
pub async fn slots(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    QueryParams(query): QueryParams<SlotsQuery>,
) -> ApiResult<Vec<Slot>> {
    let mut conn = state.db.admin().await?;
    let service = visible_service(&mut conn, &auth, id).await?;
    Ok(ApiResponse::success(slots_for(&mut conn, &service, query.date).await?))
}
