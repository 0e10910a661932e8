use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::{default_true, require_text, require_text_opt};
use crate::database::manager::DatabaseError;
use crate::database::repository::{Repository, Table};
use crate::database::update::UpdateBuilder;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pet {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub breed: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Table for Pet {
    const TABLE: &'static str = "pets";
    const ORDER_BY: &'static str = "name";
    const NOUN: &'static str = "Pet";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PetFilter {
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePet {
    /// Ignored for clients, who always create pets for themselves
    pub client_id: Option<Uuid>,
    pub name: String,
    pub breed: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreatePet {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name)
    }
}

impl UpdatePet {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text_opt("name", self.name.as_ref())
    }
}

impl Pet {
    pub async fn list(conn: &mut PgConnection, filter: &PetFilter) -> Result<Vec<Pet>, DatabaseError> {
        match filter.client_id {
            Some(client_id) => Repository::<Pet>::select_where(conn, "client_id", client_id).await,
            None => Repository::<Pet>::select_all(conn).await,
        }
    }

    pub async fn select_many(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<Pet>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let pets = sqlx::query_as::<_, Pet>("SELECT * FROM pets WHERE id = ANY($1) ORDER BY name")
            .bind(ids)
            .fetch_all(conn)
            .await?;
        Ok(pets)
    }

    pub async fn insert(conn: &mut PgConnection, client_id: Uuid, req: &CreatePet) -> Result<Pet, DatabaseError> {
        let pet = sqlx::query_as::<_, Pet>(
            "INSERT INTO pets (client_id, name, breed, date_of_birth, notes, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(client_id)
        .bind(req.name.trim())
        .bind(&req.breed)
        .bind(req.date_of_birth)
        .bind(&req.notes)
        .bind(req.is_active)
        .fetch_one(conn)
        .await?;
        Ok(pet)
    }

    pub fn patch(req: UpdatePet) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Self::TABLE);
        update
            .set("name", req.name)
            .set("breed", req.breed)
            .set("date_of_birth", req.date_of_birth)
            .set("notes", req.notes)
            .set("is_active", req.is_active);
        update
    }
}
