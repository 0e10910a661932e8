use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::{require_non_negative, require_text, require_text_opt};
use crate::database::manager::DatabaseError;
use crate::database::repository::{Repository, Table};
use crate::database::update::UpdateBuilder;
use crate::error::ApiError;

/// A play area within a site
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Field {
    pub id: Uuid,
    pub site_id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub field_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Table for Field {
    const TABLE: &'static str = "fields";
    const ORDER_BY: &'static str = "name";
    const NOUN: &'static str = "Field";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldFilter {
    pub site_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateField {
    pub site_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub capacity: i32,
    pub field_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

impl CreateField {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name)?;
        require_non_negative("capacity", Some(self.capacity))
    }
}

impl UpdateField {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text_opt("name", self.name.as_ref())?;
        require_non_negative("capacity", self.capacity)
    }
}

impl Field {
    pub async fn list(conn: &mut PgConnection, filter: &FieldFilter) -> Result<Vec<Field>, DatabaseError> {
        match filter.site_id {
            Some(site_id) => Repository::<Field>::select_where(conn, "site_id", site_id).await,
            None => Repository::<Field>::select_all(conn).await,
        }
    }

    pub async fn insert(conn: &mut PgConnection, req: &CreateField) -> Result<Field, DatabaseError> {
        let field = sqlx::query_as::<_, Field>(
            "INSERT INTO fields (site_id, name, capacity, field_type) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(req.site_id)
        .bind(req.name.trim())
        .bind(req.capacity)
        .bind(&req.field_type)
        .fetch_one(conn)
        .await?;
        Ok(field)
    }

    pub fn patch(req: UpdateField) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Self::TABLE);
        update
            .set("site_id", req.site_id)
            .set("name", req.name)
            .set("capacity", req.capacity)
            .set("field_type", req.field_type);
        update
    }
}
