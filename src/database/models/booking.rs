use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::double_option;
use crate::database::manager::DatabaseError;
use crate::database::repository::Table;
use crate::database::update::UpdateBuilder;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub service_id: Uuid,
    pub field_ids: Vec<Uuid>,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub staff_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for Booking {
    const TABLE: &'static str = "bookings";
    const ORDER_BY: &'static str = "booking_date, start_time";
    const NOUN: &'static str = "Booking";
}

impl Booking {
    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled.as_str()
    }
}

/// Booking with its service name and linked clients and pets
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub booking: Booking,
    pub service_name: String,
    pub client_ids: Vec<Uuid>,
    pub pet_ids: Vec<Uuid>,
}

/// Time range, fields and pet count of a live booking; input to slot computation
#[derive(Debug, Clone, FromRow)]
pub struct BookedSlot {
    pub field_ids: Vec<Uuid>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub pet_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub pet_ids: Vec<Uuid>,
    /// Only honoured for staff and admin; clients always book for themselves
    #[serde(default)]
    pub client_ids: Vec<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBooking {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CreateBooking {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.pet_ids.is_empty() {
            return Err(ApiError::field_error("pet_ids", "at least one pet is required"));
        }
        let mut seen = std::collections::HashSet::new();
        if !self.pet_ids.iter().all(|id| seen.insert(*id)) {
            return Err(ApiError::field_error("pet_ids", "contains duplicates"));
        }
        Ok(())
    }
}

impl UpdateBooking {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.staff_id.is_none() && self.vehicle_id.is_none() && self.notes.is_none()
    }

    /// A client may only cancel: status=cancelled and nothing else
    pub fn is_cancellation_only(&self) -> bool {
        self.status == Some(BookingStatus::Cancelled)
            && self.staff_id.is_none()
            && self.vehicle_id.is_none()
            && self.notes.is_none()
    }

    pub fn into_update(self) -> UpdateBuilder<'static> {
        let mut update = UpdateBuilder::new(Booking::TABLE);
        update
            .set("status", self.status.map(|s| s.as_str().to_string()))
            .set("staff_id", self.staff_id)
            .set("vehicle_id", self.vehicle_id)
            .set("notes", self.notes)
            .touch("updated_at", "now()");
        update
    }
}

const DETAIL_SELECT: &str = "SELECT b.id, b.service_id, b.field_ids, b.booking_date, b.start_time, b.end_time, \
     b.status, b.staff_id, b.vehicle_id, b.notes, b.created_at, b.updated_at, \
     s.name AS service_name, \
     ARRAY(SELECT bc.client_id FROM booking_clients bc WHERE bc.booking_id = b.id) AS client_ids, \
     ARRAY(SELECT bp.pet_id FROM booking_pets bp WHERE bp.booking_id = b.id) AS pet_ids \
     FROM bookings b JOIN services s ON s.id = b.service_id";

const DETAIL_ORDER: &str = " ORDER BY b.booking_date, b.start_time";

impl BookingDetail {
    pub async fn list(conn: &mut PgConnection, filter: &BookingFilter) -> Result<Vec<Self>, DatabaseError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(DETAIL_SELECT);
        let mut separator = " WHERE ";
        if let Some(date) = filter.date {
            query.push(separator).push("b.booking_date = ").push_bind(date);
            separator = " AND ";
        }
        if let Some(status) = filter.status {
            query.push(separator).push("b.status = ").push_bind(status.as_str());
        }
        query.push(DETAIL_ORDER);
        Ok(query.build_query_as::<Self>().fetch_all(conn).await?)
    }

    pub async fn for_client(conn: &mut PgConnection, client_id: Uuid) -> Result<Vec<Self>, DatabaseError> {
        let sql = format!(
            "{} WHERE EXISTS (SELECT 1 FROM booking_clients bc WHERE bc.booking_id = b.id AND bc.client_id = $1){}",
            DETAIL_SELECT, DETAIL_ORDER
        );
        Ok(sqlx::query_as::<_, Self>(&sql).bind(client_id).fetch_all(conn).await?)
    }

    pub async fn select_404(conn: &mut PgConnection, id: Uuid) -> Result<Self, DatabaseError> {
        let sql = format!("{} WHERE b.id = $1", DETAIL_SELECT);
        sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Booking {} not found", id)))
    }

    pub fn is_linked_to(&self, client_id: Uuid) -> bool {
        self.client_ids.contains(&client_id)
    }
}

impl Booking {
    /// Live bookings on `date` across all services; fields and vehicles are shared
    pub async fn booked_slots(conn: &mut PgConnection, date: NaiveDate) -> Result<Vec<BookedSlot>, DatabaseError> {
        let slots = sqlx::query_as::<_, BookedSlot>(
            "SELECT b.field_ids, b.start_time, b.end_time, \
             (SELECT COUNT(*) FROM booking_pets bp WHERE bp.booking_id = b.id) AS pet_count \
             FROM bookings b WHERE b.booking_date = $1 AND b.status <> 'cancelled'",
        )
        .bind(date)
        .fetch_all(conn)
        .await?;
        Ok(slots)
    }

    /// Serialise booking writes for one date until the transaction ends
    pub async fn lock_date(conn: &mut PgConnection, date: NaiveDate) -> Result<(), DatabaseError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('bookings:' || $1::text))")
            .bind(date)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn insert(
        conn: &mut PgConnection,
        req: &CreateBooking,
        field_ids: &[Uuid],
        end_time: NaiveTime,
    ) -> Result<Booking, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (service_id, field_ids, booking_date, start_time, end_time, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(req.service_id)
        .bind(field_ids)
        .bind(req.booking_date)
        .bind(req.start_time)
        .bind(end_time)
        .bind(&req.notes)
        .fetch_one(conn)
        .await?;
        Ok(booking)
    }

    pub async fn link(
        conn: &mut PgConnection,
        booking_id: Uuid,
        client_ids: &[Uuid],
        pet_ids: &[Uuid],
    ) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO booking_clients (booking_id, client_id) SELECT $1, UNNEST($2::uuid[])")
            .bind(booking_id)
            .bind(client_ids)
            .execute(&mut *conn)
            .await?;
        sqlx::query("INSERT INTO booking_pets (booking_id, pet_id) SELECT $1, UNNEST($2::uuid[])")
            .bind(booking_id)
            .bind(pet_ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [BookingStatus::Confirmed, BookingStatus::Cancelled, BookingStatus::Completed] {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("pending".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn booking_requires_distinct_pets() {
        let mut req = CreateBooking {
            service_id: Uuid::new_v4(),
            booking_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            pet_ids: vec![],
            client_ids: vec![],
            notes: None,
        };
        assert!(req.validate().is_err());

        let pet = Uuid::new_v4();
        req.pet_ids = vec![pet, pet];
        assert!(req.validate().is_err());

        req.pet_ids = vec![pet];
        assert!(req.validate().is_ok());
    }

    #[test]
    fn client_patch_must_be_pure_cancellation() {
        let cancel: UpdateBooking = serde_json::from_str(r#"{"status": "cancelled"}"#).unwrap();
        assert!(cancel.is_cancellation_only());

        let reassign: UpdateBooking =
            serde_json::from_str(r#"{"status": "cancelled", "vehicle_id": null}"#).unwrap();
        assert!(!reassign.is_cancellation_only());

        let complete: UpdateBooking = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert!(!complete.is_cancellation_only());
        assert!(UpdateBooking::default().is_empty());
    }
}
