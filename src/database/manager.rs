use serde_json::json;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;

/// Errors from the persistence layer, classified by what the caller can do about them
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    ForeignKeyViolation(String),

    #[error("{0}")]
    UniqueViolation(String),

    #[error("{0}")]
    CheckViolation(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let code = db_err.code();
            if let Some(classified) =
                classify_pg_error(code.as_deref(), db_err.message(), db_err.constraint())
            {
                return classified;
            }
        }

        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::Unavailable(err.to_string())
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Map a Postgres SQLSTATE to the error classes the API exposes.
/// Returns None for codes that stay unclassified (500).
pub(crate) fn classify_pg_error(
    code: Option<&str>,
    message: &str,
    constraint: Option<&str>,
) -> Option<DatabaseError> {
    let subject = constraint.unwrap_or(message);
    match code? {
        "23503" => Some(DatabaseError::ForeignKeyViolation(format!(
            "Foreign key violation: referenced record does not exist ({})",
            subject
        ))),
        "23505" => Some(DatabaseError::UniqueViolation(format!(
            "Duplicate value violates unique constraint ({})",
            subject
        ))),
        "23514" | "23502" => Some(DatabaseError::CheckViolation(format!(
            "Value rejected by constraint ({})",
            subject
        ))),
        "22P02" | "22007" | "22008" => Some(DatabaseError::InvalidInput(message.to_string())),
        _ => None,
    }
}

/// Connection pool plus the two ways handlers reach it: the admin connection
/// (service credential, no row-level policies) and the session scope
/// (request claims installed, policies enforced).
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let pool = Self::pool_options(config).connect(url).await?;
        info!("Connected database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Build the pool without connecting; connections open on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let pool = Self::pool_options(config).connect_lazy(url)?;
        Ok(Self { pool })
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Connection with the service credential; callers must authorize first
    pub async fn admin(&self) -> Result<PoolConnection<Postgres>, DatabaseError> {
        Ok(self.pool.acquire().await?)
    }

    /// Transaction on the service credential, for multi-statement admin writes
    pub async fn admin_transaction(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        Ok(self.pool.begin().await?)
    }

    /// Transaction scoped to the caller: row-level policies see `user_id`
    /// as the subject. Must be committed for writes to persist.
    pub async fn session(&self, user_id: Uuid) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let claims = json!({ "sub": user_id, "role": "authenticated" });
        sqlx::query("SELECT set_config('request.jwt.claims', $1, true)")
            .bind(claims.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("SET LOCAL ROLE authenticated")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_key_violation_is_classified_with_constraint_name() {
        let err = classify_pg_error(
            Some("23503"),
            "insert or update on table \"fields\" violates foreign key constraint",
            Some("fields_site_id_fkey"),
        )
        .unwrap();
        match err {
            DatabaseError::ForeignKeyViolation(msg) => {
                assert!(msg.contains("Foreign key violation"));
                assert!(msg.contains("fields_site_id_fkey"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn duplicate_service_name_is_unique_violation() {
        let err = classify_pg_error(
            Some("23505"),
            "duplicate key value violates unique constraint \"services_name_key\"",
            Some("services_name_key"),
        );
        assert!(matches!(err, Some(DatabaseError::UniqueViolation(msg)) if msg.contains("services_name_key")));
    }

    #[test]
    fn check_and_input_codes_are_client_errors() {
        assert!(matches!(
            classify_pg_error(Some("23514"), "violates check", Some("services_duration_minutes_check")),
            Some(DatabaseError::CheckViolation(_))
        ));
        assert!(matches!(
            classify_pg_error(Some("22P02"), "invalid input syntax for type uuid", None),
            Some(DatabaseError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_codes_stay_unclassified() {
        assert!(classify_pg_error(Some("40001"), "serialization failure", None).is_none());
        assert!(classify_pg_error(None, "no code", None).is_none());
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        assert!(matches!(
            DatabaseError::from(sqlx::Error::RowNotFound),
            DatabaseError::NotFound(_)
        ));
        assert!(matches!(
            DatabaseError::from(sqlx::Error::PoolTimedOut),
            DatabaseError::Unavailable(_)
        ));
    }

    #[test]
    fn connect_lazy_requires_url() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
            run_migrations: false,
        };
        assert!(matches!(
            Database::connect_lazy(&config),
            Err(DatabaseError::ConfigMissing("DATABASE_URL"))
        ));
    }
}
