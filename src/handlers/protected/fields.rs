use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::auth::AuthInfo;
use crate::database::models::{CreateField, Field, FieldFilter, UpdateField};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam, QueryParams};
use crate::state::AppState;

/// GET /api/fields?site_id=
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    QueryParams(filter): QueryParams<FieldFilter>,
) -> ApiResult<Vec<Field>> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Field::list(&mut conn, &filter).await?))
}

/// POST /api/fields - an unknown site_id is a 400
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<CreateField>,
) -> ApiResult<Field> {
    auth.require_admin()?;
    req.validate()?;

    let mut conn = state.db.admin().await?;
    let field = Field::insert(&mut conn, &req).await?;
    tracing::info!("Created field {} on site {}", field.id, field.site_id);
    Ok(ApiResponse::created(field))
}

/// GET /api/fields/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Field> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(Repository::<Field>::select_404(&mut conn, id).await?))
}

/// PATCH /api/fields/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateField>,
) -> ApiResult<Field> {
    auth.require_admin()?;
    req.validate()?;

    let update = Field::patch(req);
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(update.returning(id, &mut conn).await?))
}

/// DELETE /api/fields/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Repository::<Field>::delete_404(&mut conn, id).await?;
    Ok(ApiResponse::no_content())
}
