use axum::{extract::State, Extension};
use uuid::Uuid;

use super::commit;
use crate::auth::AuthInfo;
use crate::database::models::{CreateStaff, Profile, Staff, StaffMember, UpdateStaff};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam};
use crate::state::AppState;

/// GET /api/staff
pub async fn list(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> ApiResult<Vec<StaffMember>> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Staff::list_members(&mut conn).await?))
}

/// POST /api/staff - user_id must have a profile, default vehicle must exist
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<CreateStaff>,
) -> ApiResult<StaffMember> {
    auth.require_admin()?;

    let mut conn = state.db.admin().await?;
    let staff = Staff::insert(&mut conn, &req).await?;
    tracing::info!("Added user {} as staff {}", staff.user_id, staff.id);
    Ok(ApiResponse::created(Staff::member_404(&mut conn, staff.id).await?))
}

/// GET /api/staff/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StaffMember> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Staff::member_404(&mut conn, id).await?))
}

/// PATCH /api/staff/:id - profile and staff columns change together
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateStaff>,
) -> ApiResult<StaffMember> {
    auth.require_admin()?;

    let new_role = req.role;
    let (profile_update, staff_update) = req.into_updates();
    if profile_update.is_empty() && staff_update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let mut tx = state.db.admin_transaction().await?;
    let member = Staff::member_404(&mut tx, id).await?;
    profile_update.execute(member.staff.user_id, &mut tx).await?;
    staff_update.execute(id, &mut tx).await?;
    if let Some(role) = new_role {
        Profile::ensure_role_record(&mut tx, member.staff.user_id, role).await?;
    }
    let member = Staff::member_404(&mut tx, id).await?;
    commit(tx).await?;

    tracing::info!("Updated staff member {}", id);
    Ok(ApiResponse::success(member))
}

/// DELETE /api/staff/:id - removes the staff record, not the user
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Repository::<Staff>::delete_404(&mut conn, id).await?;
    Ok(ApiResponse::no_content())
}
