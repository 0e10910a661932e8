use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::{default_true, require_non_negative, require_text, require_text_opt};
use crate::database::manager::DatabaseError;
use crate::database::repository::Table;
use crate::database::update::UpdateBuilder;
use crate::error::ApiError;

/// A bookable offering (day care, pickup walk, training session...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Table for Service {
    const TABLE: &'static str = "services";
    const ORDER_BY: &'static str = "name";
    const NOUN: &'static str = "Service";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateService {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    #[serde(default)]
    pub price_cents: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn require_positive_duration(value: Option<i32>) -> Result<(), ApiError> {
    match value {
        Some(v) if v <= 0 => Err(ApiError::field_error("duration_minutes", "must be greater than zero")),
        _ => Ok(()),
    }
}

impl CreateService {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name)?;
        require_positive_duration(Some(self.duration_minutes))?;
        require_non_negative("price_cents", Some(self.price_cents))
    }
}

impl UpdateService {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text_opt("name", self.name.as_ref())?;
        require_positive_duration(self.duration_minutes)?;
        require_non_negative("price_cents", self.price_cents)
    }
}

impl Service {
    pub async fn list_active(conn: &mut PgConnection) -> Result<Vec<Service>, DatabaseError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE is_active ORDER BY name",
        )
        .fetch_all(conn)
        .await?;
        Ok(services)
    }

    pub async fn insert(conn: &mut PgConnection, req: &CreateService) -> Result<Service, DatabaseError> {
        let service = sqlx::query_as::<_, Service>(
            "INSERT INTO services (name, description, duration_minutes, price_cents, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(req.duration_minutes)
        .bind(req.price_cents)
        .bind(req.is_active)
        .fetch_one(conn)
        .await?;
        Ok(service)
    }

    pub fn patch(req: UpdateService) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Self::TABLE);
        update
            .set("name", req.name)
            .set("description", req.description)
            .set("duration_minutes", req.duration_minutes)
            .set("price_cents", req.price_cents)
            .set("is_active", req.is_active);
        update
    }
}
