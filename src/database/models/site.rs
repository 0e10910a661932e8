use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::{default_true, require_text, require_text_opt};
use crate::database::manager::DatabaseError;
use crate::database::repository::Table;
use crate::database::update::UpdateBuilder;
use crate::error::ApiError;

/// A physical daycare location
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Table for Site {
    const TABLE: &'static str = "sites";
    const ORDER_BY: &'static str = "name";
    const NOUN: &'static str = "Site";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSite {
    pub name: String,
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreateSite {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name)
    }
}

impl UpdateSite {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text_opt("name", self.name.as_ref())
    }
}

impl Site {
    pub async fn insert(conn: &mut PgConnection, req: &CreateSite) -> Result<Site, DatabaseError> {
        let site = sqlx::query_as::<_, Site>(
            "INSERT INTO sites (name, address, is_active) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(req.name.trim())
        .bind(&req.address)
        .bind(req.is_active)
        .fetch_one(conn)
        .await?;
        Ok(site)
    }

    pub fn patch(req: UpdateSite) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Self::TABLE);
        update
            .set("name", req.name)
            .set("address", req.address)
            .set("is_active", req.is_active);
        update
    }
}
