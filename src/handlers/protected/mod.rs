// handlers/protected/mod.rs - /api/* endpoints
//
// Every route here runs behind session authentication (401) and role
// resolution (403), so handlers receive an `AuthInfo` extension and only
// apply per-resource policy.

pub mod auth;
pub mod bookings;
pub mod clients;
pub mod fields;
pub mod pets;
pub mod profile;
pub mod services;
pub mod sites;
pub mod staff;
pub mod users;
pub mod vehicles;

use crate::database::DatabaseError;
use crate::error::ApiError;
use sqlx::{Postgres, Transaction};

/// Commit a handler's transaction, mapping the driver error
pub(crate) async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), ApiError> {
    tx.commit().await.map_err(DatabaseError::from)?;
    Ok(())
}
