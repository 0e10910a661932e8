use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::auth::AuthInfo;
use crate::database::models::{Client, ClientDetail, CreateClient, UpdateClient};
use crate::email::{self, EmailTemplate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam};
use crate::state::AppState;

/// Staff and admin see every client; a client only their own record
fn require_client_access(auth: &AuthInfo, id: Uuid) -> Result<(), ApiError> {
    if auth.is_staff_or_admin() || auth.client_id == Some(id) {
        return Ok(());
    }
    tracing::warn!("User {} denied access to client {}", auth.user_id, id);
    Err(ApiError::forbidden("Client record does not belong to you"))
}

/// GET /api/clients
pub async fn list(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> ApiResult<Vec<ClientDetail>> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Client::list_details(&mut conn).await?))
}

/// POST /api/clients - links an existing user as a client and welcomes them
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<CreateClient>,
) -> ApiResult<ClientDetail> {
    auth.require_admin()?;

    let mut conn = state.db.admin().await?;
    let client = Client::insert(&mut conn, &req).await?;
    let detail = Client::detail_404(&mut conn, client.id).await?;
    drop(conn);
    tracing::info!("Created client {} for user {}", client.id, client.user_id);

    if let Some(address) = detail.email.clone() {
        let template = EmailTemplate::Welcome {
            name: detail.display_name(),
            site_url: state.config.security.site_url.clone(),
        };
        email::notify(state.mailer.as_ref(), &state.config.email, vec![address], &template).await;
    }

    Ok(ApiResponse::created(detail))
}

/// GET /api/clients/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<ClientDetail> {
    require_client_access(&auth, id)?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Client::detail_404(&mut conn, id).await?))
}

/// PATCH /api/clients/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateClient>,
) -> ApiResult<ClientDetail> {
    require_client_access(&auth, id)?;

    let update = Client::patch(req);
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    let mut conn = state.db.admin().await?;
    update.execute(id, &mut conn).await?;
    Ok(ApiResponse::success(Client::detail_404(&mut conn, id).await?))
}
