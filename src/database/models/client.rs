use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::repository::Table;
use crate::database::update::UpdateBuilder;

/// A pet owner; wraps an identity-provider user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Table for Client {
    const TABLE: &'static str = "clients";
    const NOUN: &'static str = "Client";
}

/// Client joined with its profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub client: Client,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl ClientDetail {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone().unwrap_or_else(|| "there".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClient {
    pub user_id: Uuid,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const DETAIL_SELECT: &str = "SELECT c.id, c.user_id, c.address, c.emergency_contact_name, \
     c.emergency_contact_phone, c.notes, c.created_at, \
     p.email, p.first_name, p.last_name, p.phone \
     FROM clients c JOIN profiles p ON p.id = c.user_id";

impl Client {
    pub async fn list_details(conn: &mut PgConnection) -> Result<Vec<ClientDetail>, DatabaseError> {
        let sql = format!("{} ORDER BY p.last_name NULLS LAST, p.first_name NULLS LAST", DETAIL_SELECT);
        Ok(sqlx::query_as::<_, ClientDetail>(&sql).fetch_all(conn).await?)
    }

    pub async fn detail_404(conn: &mut PgConnection, id: Uuid) -> Result<ClientDetail, DatabaseError> {
        let sql = format!("{} WHERE c.id = $1", DETAIL_SELECT);
        sqlx::query_as::<_, ClientDetail>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Client {} not found", id)))
    }

    /// Details for several clients, used for notification recipients
    pub async fn details_for(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<ClientDetail>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("{} WHERE c.id = ANY($1)", DETAIL_SELECT);
        Ok(sqlx::query_as::<_, ClientDetail>(&sql).bind(ids).fetch_all(conn).await?)
    }

    pub async fn insert(conn: &mut PgConnection, req: &CreateClient) -> Result<Client, DatabaseError> {
        let client = sqlx::query_as::<_, Client>(
            "INSERT INTO clients (user_id, address, emergency_contact_name, emergency_contact_phone, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(req.user_id)
        .bind(&req.address)
        .bind(&req.emergency_contact_name)
        .bind(&req.emergency_contact_phone)
        .bind(&req.notes)
        .fetch_one(conn)
        .await?;
        Ok(client)
    }

    pub fn patch(req: UpdateClient) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Self::TABLE);
        update
            .set("address", req.address)
            .set("emergency_contact_name", req.emergency_contact_name)
            .set("emergency_contact_phone", req.emergency_contact_phone)
            .set("notes", req.notes);
        update
    }
}
