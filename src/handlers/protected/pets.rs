use axum::{extract::State, Extension};
use uuid::Uuid;

use super::commit;
use crate::auth::{AuthInfo, Role};
use crate::database::models::{CreatePet, Pet, PetFilter, UpdatePet};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam, QueryParams};
use crate::state::AppState;

/// Owner or admin may change a pet; staff only read
fn require_pet_write(auth: &AuthInfo, pet: &Pet) -> Result<(), ApiError> {
    match auth.role {
        Role::Admin => Ok(()),
        Role::Client if auth.client_id == Some(pet.client_id) => Ok(()),
        Role::Client => Err(ApiError::forbidden("Pet does not belong to you")),
        Role::Staff => Err(ApiError::forbidden("Insufficient role: requires admin or client")),
    }
}

fn require_pet_read(auth: &AuthInfo, pet: &Pet) -> Result<(), ApiError> {
    if auth.is_staff_or_admin() || auth.client_id == Some(pet.client_id) {
        return Ok(());
    }
    Err(ApiError::forbidden("Pet does not belong to you"))
}

/// GET /api/pets - clients get their own pets; staff and admin may filter by client_id
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    QueryParams(filter): QueryParams<PetFilter>,
) -> ApiResult<Vec<Pet>> {
    if auth.is_staff_or_admin() {
        let mut conn = state.db.admin().await?;
        return Ok(ApiResponse::success(Pet::list(&mut conn, &filter).await?));
    }

    let Some(client_id) = auth.client_id else {
        return Ok(ApiResponse::success(vec![]));
    };
    let mut tx = state.db.session(auth.user_id).await?;
    let pets = Pet::list(&mut tx, &PetFilter { client_id: Some(client_id) }).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(pets))
}

/// POST /api/pets
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<CreatePet>,
) -> ApiResult<Pet> {
    auth.require(&[Role::Admin, Role::Client])?;
    let owner = match auth.role {
        Role::Client => auth.own_client_id()?,
        _ => req
            .client_id
            .ok_or_else(|| ApiError::field_error("client_id", "is required"))?,
    };
    req.validate()?;

    let mut conn = state.db.admin().await?;
    let pet = Pet::insert(&mut conn, owner, &req).await?;
    tracing::info!("Registered pet {} for client {}", pet.id, owner);
    Ok(ApiResponse::created(pet))
}

/// GET /api/pets/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Pet> {
    let mut conn = state.db.admin().await?;
    let pet = Repository::<Pet>::select_404(&mut conn, id).await?;
    require_pet_read(&auth, &pet)?;
    Ok(ApiResponse::success(pet))
}

/// PATCH /api/pets/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdatePet>,
) -> ApiResult<Pet> {
    auth.require(&[Role::Admin, Role::Client])?;
    req.validate()?;
    let update = Pet::patch(req);
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let mut conn = state.db.admin().await?;
    let pet = Repository::<Pet>::select_404(&mut conn, id).await?;
    require_pet_write(&auth, &pet)?;
    Ok(ApiResponse::success(update.returning(id, &mut conn).await?))
}

/// DELETE /api/pets/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    auth.require(&[Role::Admin, Role::Client])?;
    let mut conn = state.db.admin().await?;
    let pet = Repository::<Pet>::select_404(&mut conn, id).await?;
    require_pet_write(&auth, &pet)?;
    Repository::<Pet>::delete_404(&mut conn, id).await?;
    Ok(ApiResponse::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pet(client_id: Uuid) -> Pet {
        Pet {
            id: Uuid::new_v4(),
            client_id,
            name: "Rex".to_string(),
            breed: None,
            date_of_birth: None,
            notes: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn auth(role: Role, client_id: Option<Uuid>) -> AuthInfo {
        AuthInfo {
            user_id: Uuid::new_v4(),
            email: None,
            role,
            client_id,
            staff_id: None,
        }
    }

    #[test]
    fn owners_and_admins_write_staff_only_read() {
        let owner = Uuid::new_v4();
        let rex = pet(owner);

        assert!(require_pet_write(&auth(Role::Client, Some(owner)), &rex).is_ok());
        assert!(require_pet_write(&auth(Role::Admin, None), &rex).is_ok());
        assert!(require_pet_write(&auth(Role::Staff, None), &rex).is_err());
        assert!(require_pet_write(&auth(Role::Client, Some(Uuid::new_v4())), &rex).is_err());

        assert!(require_pet_read(&auth(Role::Staff, None), &rex).is_ok());
        assert!(require_pet_read(&auth(Role::Client, Some(Uuid::new_v4())), &rex).is_err());
    }
}
