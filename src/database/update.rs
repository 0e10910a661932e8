use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, PgConnection, Postgres, QueryBuilder, Type};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Builds `UPDATE <table> SET col = $n, ... WHERE id = $m RETURNING *` from
/// the optional fields of a patch request. Table and column names are
/// compile-time constants; only values are bound.
pub struct UpdateBuilder<'a> {
    query: QueryBuilder<'a, Postgres>,
    assignments: usize,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(table: &'static str) -> Self {
        let mut query = QueryBuilder::new("UPDATE ");
        query.push(table).push(" SET ");
        Self {
            query,
            assignments: 0,
        }
    }

    /// Assign `column` when the patch carries a value for it
    pub fn set<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            if self.assignments > 0 {
                self.query.push(", ");
            }
            self.query.push(column).push(" = ").push_bind(value);
            self.assignments += 1;
        }
        self
    }

    /// Assign a raw SQL expression, e.g. `updated_at = now()`.
    /// Does not count towards emptiness.
    pub fn touch(&mut self, column: &'static str, expression: &'static str) -> &mut Self {
        if self.assignments > 0 {
            self.query.push(", ").push(column).push(" = ").push(expression);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments == 0
    }

    pub fn assignments(&self) -> usize {
        self.assignments
    }

    /// Run the update for one row and return it, or NotFound
    pub async fn returning<T>(mut self, id: Uuid, conn: &mut PgConnection) -> Result<T, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        if self.is_empty() {
            return Err(DatabaseError::InvalidInput("No fields to update".to_string()));
        }
        self.query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
        self.query
            .build_query_as::<T>()
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Record not found".to_string()))
    }

    /// Run the update for one row without reading it back
    pub async fn execute(mut self, id: Uuid, conn: &mut PgConnection) -> Result<(), DatabaseError> {
        if self.is_empty() {
            return Ok(());
        }
        self.query.push(" WHERE id = ").push_bind(id);
        let result = self.query.build().execute(conn).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Record not found".to_string()));
        }
        Ok(())
    }

    #[cfg(test)]
    fn sql(&self) -> &str {
        self.query.sql()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_has_no_assignments() {
        let mut update = UpdateBuilder::new("sites");
        update.set::<String>("name", None).set::<bool>("is_active", None);
        update.touch("updated_at", "now()");
        assert!(update.is_empty());
        assert_eq!(update.sql(), "UPDATE sites SET ");
    }

    #[test]
    fn present_fields_become_bound_assignments() {
        let mut update = UpdateBuilder::new("profiles");
        update
            .set("first_name", Some("Ada".to_string()))
            .set::<String>("last_name", None)
            .set("phone", Some("555".to_string()))
            .touch("updated_at", "now()");
        assert_eq!(update.assignments(), 2);
        assert_eq!(
            update.sql(),
            "UPDATE profiles SET first_name = $1, phone = $2, updated_at = now()"
        );
    }
}
