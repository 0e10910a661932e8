use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::manager::DatabaseError;
use crate::database::repository::Table;
use crate::database::update::UpdateBuilder;

/// One row per identity-provider user; carries the role used for authorization
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for Profile {
    const TABLE: &'static str = "profiles";
    const ORDER_BY: &'static str = "last_name NULLS LAST, first_name NULLS LAST, email";
    const NOUN: &'static str = "User";
}

/// Fields a user may change on their own profile. Anything else in the
/// request body is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Fields an admin may change on any user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

impl AdminUpdateUser {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

impl Profile {
    pub async fn select_own(conn: &mut PgConnection, id: Uuid) -> Result<Profile, DatabaseError> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Profile not found".to_string()))
    }

    pub fn patch(req: UpdateProfile) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Self::TABLE);
        update
            .set("first_name", req.first_name)
            .set("last_name", req.last_name)
            .set("phone", req.phone)
            .touch("updated_at", "now()");
        update
    }

    pub fn admin_patch(req: AdminUpdateUser) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Self::TABLE);
        update
            .set("role", req.role.map(|r| r.as_str().to_string()))
            .set("first_name", req.first_name)
            .set("last_name", req.last_name)
            .set("phone", req.phone)
            .touch("updated_at", "now()");
        update
    }

    /// Give a user the companion row their role implies (staff or client).
    /// Existing rows are left in place; a user moved to the client role
    /// gives up any default vehicle so it stops counting as staff capacity.
    pub async fn ensure_role_record(conn: &mut PgConnection, user_id: Uuid, role: Role) -> Result<(), DatabaseError> {
        for sql in role_record_statements(role) {
            sqlx::query(sql).bind(user_id).execute(&mut *conn).await?;
        }
        Ok(())
    }
}

fn role_record_statements(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin | Role::Staff => &["INSERT INTO staff (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING"],
        Role::Client => &[
            "INSERT INTO clients (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
            "UPDATE staff SET default_vehicle_id = NULL WHERE user_id = $1",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_keys_leave_update_empty() {
        let req: UpdateProfile = serde_json::from_str(r#"{"role": "admin", "email": "x@y.z"}"#).unwrap();
        assert!(req.is_empty());

        let req: UpdateProfile = serde_json::from_str(r#"{"phone": "0123"}"#).unwrap();
        assert!(!req.is_empty());
    }

    #[test]
    fn admin_update_parses_role() {
        let req: AdminUpdateUser = serde_json::from_str(r#"{"role": "staff"}"#).unwrap();
        assert_eq!(req.role, Some(Role::Staff));
        assert!(serde_json::from_str::<AdminUpdateUser>(r#"{"role": "owner"}"#).is_err());
    }

    #[test]
    fn demotion_to_client_releases_default_vehicle() {
        let statements = role_record_statements(Role::Client);
        assert!(statements[0].starts_with("INSERT INTO clients"));
        assert!(statements
            .iter()
            .any(|sql| sql.contains("default_vehicle_id = NULL")));

        for role in [Role::Admin, Role::Staff] {
            let statements = role_record_statements(role);
            assert_eq!(statements.len(), 1);
            assert!(statements[0].starts_with("INSERT INTO staff"));
        }
    }
}
