use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::{require_non_negative, require_text, require_text_opt};
use crate::database::manager::DatabaseError;
use crate::database::repository::Table;
use crate::database::update::UpdateBuilder;
use crate::error::ApiError;

/// A pickup vehicle; `pet_capacity` bounds how many pets it can carry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub registration: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub pet_capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl Table for Vehicle {
    const TABLE: &'static str = "vehicles";
    const ORDER_BY: &'static str = "name";
    const NOUN: &'static str = "Vehicle";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicle {
    pub name: String,
    pub registration: String,
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub pet_capacity: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVehicle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_capacity: Option<i32>,
}

impl CreateVehicle {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name)?;
        require_text("registration", &self.registration)?;
        require_non_negative("pet_capacity", Some(self.pet_capacity))
    }
}

impl UpdateVehicle {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text_opt("name", self.name.as_ref())?;
        require_text_opt("registration", self.registration.as_ref())?;
        require_non_negative("pet_capacity", self.pet_capacity)
    }
}

impl Vehicle {
    pub async fn insert(conn: &mut PgConnection, req: &CreateVehicle) -> Result<Vehicle, DatabaseError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "INSERT INTO vehicles (name, registration, make, model, pet_capacity) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(req.name.trim())
        .bind(req.registration.trim())
        .bind(&req.make)
        .bind(&req.model)
        .bind(req.pet_capacity)
        .fetch_one(conn)
        .await?;
        Ok(vehicle)
    }

    /// Combined pet capacity of the vehicles assigned as some staff member's
    /// default vehicle; a van shared by several staff counts once
    pub async fn staff_capacity(conn: &mut PgConnection) -> Result<i64, DatabaseError> {
        let (capacity,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(pet_capacity), 0)::bigint FROM vehicles \
             WHERE id IN (SELECT default_vehicle_id FROM staff)",
        )
        .fetch_one(conn)
        .await?;
        Ok(capacity)
    }

    pub fn patch(req: UpdateVehicle) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Self::TABLE);
        update
            .set("name", req.name)
            .set("registration", req.registration)
            .set("make", req.make)
            .set("model", req.model)
            .set("pet_capacity", req.pet_capacity);
        update
    }
}
