use axum::{extract::State, Extension};
use uuid::Uuid;

use super::commit;
use crate::auth::AuthInfo;
use crate::database::models::{Booking, BookingDetail, BookingFilter, CreateBooking, UpdateBooking};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam, QueryParams};
use crate::services::booking::{create_booking, notify_booking, update_booking};
use crate::state::AppState;

/// GET /api/bookings?date=&status=
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    QueryParams(filter): QueryParams<BookingFilter>,
) -> ApiResult<Vec<BookingDetail>> {
    auth.require_staff()?;
    let mut conn = state.db.admin().await?;
    Ok(ApiResponse::success(BookingDetail::list(&mut conn, &filter).await?))
}

/// POST /api/bookings - 400 when no slot starts at start_time, 409 when it is full
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<CreateBooking>,
) -> ApiResult<BookingDetail> {
    req.validate()?;
    if !auth.is_staff_or_admin() {
        auth.own_client_id()?;
    }

    let mut tx = state.db.admin_transaction().await?;
    let booking = create_booking(&mut tx, &auth, req).await?;
    commit(tx).await?;

    notify_booking(&state, &booking).await;
    Ok(ApiResponse::created(booking))
}

/// GET /api/bookings/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<BookingDetail> {
    let mut conn = state.db.admin().await?;
    let booking = BookingDetail::select_404(&mut conn, id).await?;
    if !auth.is_staff_or_admin() && !booking.is_linked_to(auth.own_client_id()?) {
        return Err(ApiError::forbidden("Booking does not belong to you"));
    }
    Ok(ApiResponse::success(booking))
}

/// PATCH /api/bookings/:id - clients may only send {"status": "cancelled"}
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateBooking>,
) -> ApiResult<BookingDetail> {
    if req.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let mut tx = state.db.admin_transaction().await?;
    let (booking, cancelled) = update_booking(&mut tx, &auth, id, req).await?;
    commit(tx).await?;

    if cancelled {
        notify_booking(&state, &booking).await;
    }
    Ok(ApiResponse::success(booking))
}

/// DELETE /api/bookings/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let mut conn = state.db.admin().await?;
    Repository::<Booking>::delete_404(&mut conn, id).await?;
    tracing::info!("Deleted booking {}", id);
    Ok(ApiResponse::no_content())
}

/// GET /api/my-bookings - bookings linked to the caller's client record
pub async fn mine(State(state): State<AppState>, Extension(auth): Extension<AuthInfo>) -> ApiResult<Vec<BookingDetail>> {
    let Some(client_id) = auth.client_id else {
        return Ok(ApiResponse::success(vec![]));
    };

    let mut tx = state.db.session(auth.user_id).await?;
    let bookings = BookingDetail::for_client(&mut tx, client_id).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(bookings))
}
