use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::{AuthInfo, Role, SessionUser};
use crate::database::{Database, DatabaseError};

/// Resolves the role and linked records of an authenticated user
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` when the user has no profile or an unrecognised role
    async fn auth_info(&self, user: &SessionUser) -> Result<Option<AuthInfo>, DatabaseError>;
}

/// Directory backed by the `profiles`, `clients` and `staff` tables
pub struct PgDirectory {
    db: Database,
}

impl PgDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role: String,
    client_id: Option<Uuid>,
    staff_id: Option<Uuid>,
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn auth_info(&self, user: &SessionUser) -> Result<Option<AuthInfo>, DatabaseError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT p.role, c.id AS client_id, s.id AS staff_id \
             FROM profiles p \
             LEFT JOIN clients c ON c.user_id = p.id \
             LEFT JOIN staff s ON s.user_id = p.id \
             WHERE p.id = $1",
        )
        .bind(user.id)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else {
            tracing::debug!("No profile for authenticated user {}", user.id);
            return Ok(None);
        };

        match row.role.parse::<Role>() {
            Ok(role) => Ok(Some(AuthInfo {
                user_id: user.id,
                email: user.email.clone(),
                role,
                client_id: row.client_id,
                staff_id: row.staff_id,
            })),
            Err(e) => {
                tracing::warn!("Profile {} has unusable role: {}", user.id, e);
                Ok(None)
            }
        }
    }
}
