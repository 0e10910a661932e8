use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::double_option;
use crate::auth::Role;
use crate::database::manager::DatabaseError;
use crate::database::repository::Table;
use crate::database::update::UpdateBuilder;

/// A staff member; wraps an identity-provider user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    pub id: Uuid,
    pub user_id: Uuid,
    pub default_vehicle_id: Option<Uuid>,
    pub job_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Table for Staff {
    const TABLE: &'static str = "staff";
    const NOUN: &'static str = "Staff member";
}

/// Staff joined with its profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StaffMember {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub staff: Staff,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaff {
    pub user_id: Uuid,
    pub default_vehicle_id: Option<Uuid>,
    pub job_title: Option<String>,
}

/// Admin edit spanning the staff row and the member's profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStaff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub default_vehicle_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

impl UpdateStaff {
    /// Split into the profile assignments and the staff-row assignments
    pub fn into_updates(self) -> (UpdateBuilder<'static>, UpdateBuilder<'static>) {
        let mut profile = UpdateBuilder::new("profiles");
        profile
            .set("first_name", self.first_name)
            .set("last_name", self.last_name)
            .set("phone", self.phone)
            .set("role", self.role.map(|r| r.as_str().to_string()))
            .touch("updated_at", "now()");

        let mut staff = UpdateBuilder::new(Staff::TABLE);
        staff
            .set("default_vehicle_id", self.default_vehicle_id)
            .set("job_title", self.job_title);

        (profile, staff)
    }
}

const MEMBER_SELECT: &str = "SELECT s.id, s.user_id, s.default_vehicle_id, s.job_title, s.created_at, \
     p.email, p.first_name, p.last_name, p.phone, p.role \
     FROM staff s JOIN profiles p ON p.id = s.user_id";

impl Staff {
    pub async fn list_members(conn: &mut PgConnection) -> Result<Vec<StaffMember>, DatabaseError> {
        let sql = format!("{} ORDER BY p.last_name NULLS LAST, p.first_name NULLS LAST", MEMBER_SELECT);
        Ok(sqlx::query_as::<_, StaffMember>(&sql).fetch_all(conn).await?)
    }

    pub async fn member_404(conn: &mut PgConnection, id: Uuid) -> Result<StaffMember, DatabaseError> {
        let sql = format!("{} WHERE s.id = $1", MEMBER_SELECT);
        sqlx::query_as::<_, StaffMember>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Staff member {} not found", id)))
    }

    pub async fn insert(conn: &mut PgConnection, req: &CreateStaff) -> Result<Staff, DatabaseError> {
        let staff = sqlx::query_as::<_, Staff>(
            "INSERT INTO staff (user_id, default_vehicle_id, job_title) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(req.user_id)
        .bind(req.default_vehicle_id)
        .bind(&req.job_title)
        .fetch_one(conn)
        .await?;
        Ok(staff)
    }
}
