use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::auth::AuthInfo;
use crate::database::models::{CreateVehicle, UpdateVehicle, Vehicle};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam};
use crate::state::AppState;

/// GET /api/vehicles
pub async fn list(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> ApiResult<Vec<Vehicle>> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Repository::<Vehicle>::select_all(&mut conn).await?))
}

/// POST /api/vehicles - duplicate registration is a 409
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<CreateVehicle>,
) -> ApiResult<Vehicle> {
    auth.require_admin()?;
    req.validate()?;

    let mut conn = state.db.admin().await?;
    let vehicle = Vehicle::insert(&mut conn, &req).await?;
    tracing::info!("Created vehicle {} ({} pets)", vehicle.id, vehicle.pet_capacity);
    Ok(ApiResponse::created(vehicle))
}

/// GET /api/vehicles/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Vehicle> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Repository::<Vehicle>::select_404(&mut conn, id).await?))
}

/// PATCH /api/vehicles/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateVehicle>,
) -> ApiResult<Vehicle> {
    auth.require_admin()?;
    req.validate()?;

    let update = Vehicle::patch(req);
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(update.returning(id, &mut conn).await?))
}

/// DELETE /api/vehicles/:id - staff defaults pointing at it are cleared
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Repository::<Vehicle>::delete_404(&mut conn, id).await?;
    Ok(ApiResponse::no_content())
}
