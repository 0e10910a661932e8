use axum::{extract::State, Extension};

use super::commit;
use crate::auth::AuthInfo;
use crate::database::models::{Profile, UpdateProfile};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::state::AppState;

/// GET /api/profile - the caller's own profile
pub async fn get(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> ApiResult<Profile> {
    let mut tx = state.db.session(auth.user_id).await?;
    let profile = Profile::select_own(&mut tx, auth.user_id).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/profile - update first_name, last_name and phone only
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<UpdateProfile>,
) -> ApiResult<Profile> {
    if req.is_empty() {
        return Err(ApiError::bad_request(
            "No updatable fields provided (allowed: first_name, last_name, phone)",
        ));
    }

    let mut tx = state.db.session(auth.user_id).await?;
    let profile: Profile = Profile::patch(req).returning(auth.user_id, &mut tx).await?;
    commit(tx).await?;

    Ok(ApiResponse::success(profile))
}
