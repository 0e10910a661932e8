use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::auth::AuthInfo;
use crate::database::models::{CreateSite, Site, UpdateSite};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam};
use crate::state::AppState;

/// GET /api/sites
pub async fn list(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> ApiResult<Vec<Site>> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Repository::<Site>::select_all(&mut conn).await?))
}

/// POST /api/sites
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<CreateSite>,
) -> ApiResult<Site> {
    auth.require_admin()?;
    req.validate()?;

    let mut conn = state.db.admin().await?;
    let site = Site::insert(&mut conn, &req).await?;
    tracing::info!("Created site {} '{}'", site.id, site.name);
    Ok(ApiResponse::created(site))
}

/// GET /api/sites/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Site> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Repository::<Site>::select_404(&mut conn, id).await?))
}

/// PATCH /api/sites/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateSite>,
) -> ApiResult<Site> {
    auth.require_admin()?;
    req.validate()?;

    let update = Site::patch(req);
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(update.returning(id, &mut conn).await?))
}

/// DELETE /api/sites/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Repository::<Site>::delete_404(&mut conn, id).await?;
    tracing::info!("Deleted site {}", id);
    Ok(ApiResponse::no_content())
}
