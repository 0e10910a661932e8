use sqlx::{self, postgres::PgRow, FromRow, PgConnection};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// A row type backed by one table with a uuid `id` primary key
pub trait Table: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    /// ORDER BY clause used for list queries
    const ORDER_BY: &'static str = "created_at";
    /// Singular name used in not-found messages
    const NOUN: &'static str;
}

/// Generic reads and deletes shared by every table
pub struct Repository<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Table> Repository<T> {
    pub async fn select_all(conn: &mut PgConnection) -> Result<Vec<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} ORDER BY {}", T::TABLE, T::ORDER_BY);
        Ok(sqlx::query_as::<_, T>(&sql).fetch_all(conn).await?)
    }

    /// Rows whose `column` equals `value`; `column` must be a constant
    pub async fn select_where(
        conn: &mut PgConnection,
        column: &'static str,
        value: Uuid,
    ) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1 ORDER BY {}",
            T::TABLE,
            column,
            T::ORDER_BY
        );
        Ok(sqlx::query_as::<_, T>(&sql).bind(value).fetch_all(conn).await?)
    }

    pub async fn select_one(conn: &mut PgConnection, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", T::TABLE);
        Ok(sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(conn).await?)
    }

    pub async fn select_404(conn: &mut PgConnection, id: Uuid) -> Result<T, DatabaseError> {
        Self::select_one(conn, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::NOUN, id)))
    }

    pub async fn delete_404(conn: &mut PgConnection, id: Uuid) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(conn).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {} not found", T::NOUN, id)));
        }
        Ok(())
    }
}
