use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Role resolution: an authenticated user without a profile role is
/// forbidden from every protected route. Injects [`crate::auth::AuthInfo`].
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<SessionUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Session authentication required before role resolution"))?;

    let info = state.directory.auth_info(&user).await?.ok_or_else(|| {
        tracing::warn!("User {} has no role assigned", user.id);
        ApiError::forbidden("No role assigned to this account")
    })?;

    tracing::debug!("Resolved user {} as {}", info.user_id, info.role);
    request.extensions_mut().insert(info);

    Ok(next.run(request).await)
}
