use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::require_non_negative;
use crate::database::manager::DatabaseError;
use crate::database::repository::{Repository, Table};
use crate::error::ApiError;

/// An opening window for a service: either weekly (`day_of_week`, 0 = Sunday)
/// or an override for one `specific_date`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceAvailability {
    pub id: Uuid,
    pub service_id: Uuid,
    pub field_ids: Vec<Uuid>,
    pub day_of_week: Option<i16>,
    pub specific_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_pets: i32,
    pub use_staff_vehicle_capacity: bool,
    pub created_at: DateTime<Utc>,
}

impl Table for ServiceAvailability {
    const TABLE: &'static str = "service_availability";
    const ORDER_BY: &'static str = "day_of_week, specific_date, start_time";
    const NOUN: &'static str = "Availability rule";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailability {
    #[serde(default)]
    pub field_ids: Vec<Uuid>,
    pub day_of_week: Option<i16>,
    pub specific_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub max_pets: i32,
    #[serde(default)]
    pub use_staff_vehicle_capacity: bool,
}

impl CreateAvailability {
    pub fn validate(&self) -> Result<(), ApiError> {
        match (self.day_of_week, self.specific_date) {
            (None, None) => {
                return Err(ApiError::field_error(
                    "day_of_week",
                    "either day_of_week or specific_date is required",
                ))
            }
            (Some(day), _) if !(0..=6).contains(&day) => {
                return Err(ApiError::field_error("day_of_week", "must be between 0 (Sunday) and 6"))
            }
            _ => {}
        }
        if self.start_time >= self.end_time {
            return Err(ApiError::field_error("end_time", "must be after start_time"));
        }
        if self.field_ids.is_empty() {
            return Err(ApiError::field_error("field_ids", "at least one field is required"));
        }
        require_non_negative("max_pets", Some(self.max_pets))
    }
}

impl ServiceAvailability {
    pub fn is_date_specific(&self) -> bool {
        self.specific_date.is_some()
    }

    /// Whether this rule opens on `date` when considered on its own
    pub fn opens_on(&self, date: NaiveDate) -> bool {
        match self.specific_date {
            Some(specific) => specific == date,
            None => self.day_of_week == Some(date.weekday().num_days_from_sunday() as i16),
        }
    }

    pub async fn for_service(conn: &mut PgConnection, service_id: Uuid) -> Result<Vec<Self>, DatabaseError> {
        Repository::<Self>::select_where(conn, "service_id", service_id).await
    }

    pub async fn insert(
        conn: &mut PgConnection,
        service_id: Uuid,
        req: &CreateAvailability,
    ) -> Result<Self, DatabaseError> {
        let rule = sqlx::query_as::<_, Self>(
            "INSERT INTO service_availability \
             (service_id, field_ids, day_of_week, specific_date, start_time, end_time, max_pets, use_staff_vehicle_capacity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(service_id)
        .bind(&req.field_ids)
        .bind(req.day_of_week)
        .bind(req.specific_date)
        .bind(req.start_time)
        .bind(req.end_time)
        .bind(req.max_pets)
        .bind(req.use_staff_vehicle_capacity)
        .fetch_one(conn)
        .await?;
        Ok(rule)
    }
}
