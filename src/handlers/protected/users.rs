use axum::{extract::State, Extension};
use uuid::Uuid;

use super::commit;
use crate::auth::AuthInfo;
use crate::database::models::{AdminUpdateUser, Profile};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam};
use crate::state::AppState;

/// GET /api/users
pub async fn list(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> ApiResult<Vec<Profile>> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Repository::<Profile>::select_all(&mut conn).await?))
}

/// GET /api/users/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Profile> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Repository::<Profile>::select_404(&mut conn, id).await?))
}

/// PATCH /api/users/:id - a role change also creates the matching
/// staff or client record
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<AdminUpdateUser>,
) -> ApiResult<Profile> {
    auth.require_admin()?;
    if req.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let new_role = req.role;
    let mut tx = state.db.admin_transaction().await?;
    let profile: Profile = Profile::admin_patch(req).returning(id, &mut tx).await?;
    if let Some(role) = new_role {
        Profile::ensure_role_record(&mut tx, id, role).await?;
        tracing::info!("User {} is now {}", id, role);
    }
    commit(tx).await?;

    Ok(ApiResponse::success(profile))
}
