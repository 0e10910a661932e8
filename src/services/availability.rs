use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::models::{BookedSlot, Booking, Service, ServiceAvailability, Vehicle};
use crate::database::DatabaseError;

/// One bookable window of a service on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub availability_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub field_ids: Vec<Uuid>,
    pub capacity: i64,
    pub booked: i64,
    pub remaining: i64,
    pub available: bool,
}

/// Rules in force on `date`. Date-specific rules replace the weekly
/// schedule for that date entirely.
pub fn applicable_rules(rules: &[ServiceAvailability], date: NaiveDate) -> Vec<&ServiceAvailability> {
    let specific: Vec<&ServiceAvailability> = rules
        .iter()
        .filter(|rule| rule.specific_date == Some(date))
        .collect();
    if !specific.is_empty() {
        return specific;
    }
    rules
        .iter()
        .filter(|rule| !rule.is_date_specific() && rule.opens_on(date))
        .collect()
}

fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && b_start < a_end
}

fn shares_field(a: &[Uuid], b: &[Uuid]) -> bool {
    a.iter().any(|id| b.contains(id))
}

/// Cut the rules in force on `date` into `duration_minutes` slots and
/// subtract pets already booked on overlapping times and fields.
pub fn compute_slots(
    duration_minutes: i32,
    rules: &[ServiceAvailability],
    date: NaiveDate,
    booked: &[BookedSlot],
    staff_vehicle_capacity: i64,
) -> Vec<Slot> {
    if duration_minutes <= 0 {
        return Vec::new();
    }
    let step = Duration::minutes(i64::from(duration_minutes));

    let mut slots = Vec::new();
    for rule in applicable_rules(rules, date) {
        let capacity = if rule.use_staff_vehicle_capacity {
            staff_vehicle_capacity
        } else {
            i64::from(rule.max_pets)
        };

        let mut start = rule.start_time;
        loop {
            let (end, wrapped) = start.overflowing_add_signed(step);
            if wrapped != 0 || end > rule.end_time {
                break;
            }

            let taken: i64 = booked
                .iter()
                .filter(|b| overlaps(start, end, b.start_time, b.end_time))
                .filter(|b| shares_field(&rule.field_ids, &b.field_ids))
                .map(|b| b.pet_count)
                .sum();
            let remaining = (capacity - taken).max(0);

            slots.push(Slot {
                availability_id: rule.id,
                start_time: start,
                end_time: end,
                field_ids: rule.field_ids.clone(),
                capacity,
                booked: taken,
                remaining,
                available: remaining > 0,
            });
            start = end;
        }
    }

    slots.sort_by_key(|slot| slot.start_time);
    slots
}

/// Slot starting at `start_time` with the most room left
pub fn find_slot(slots: &[Slot], start_time: NaiveTime) -> Option<&Slot> {
    slots
        .iter()
        .filter(|slot| slot.start_time == start_time)
        .max_by_key(|slot| slot.remaining)
}

/// Load everything slot computation needs for `service` on `date`
pub async fn slots_for(
    conn: &mut PgConnection,
    service: &Service,
    date: NaiveDate,
) -> Result<Vec<Slot>, DatabaseError> {
    let rules = ServiceAvailability::for_service(&mut *conn, service.id).await?;
    if applicable_rules(&rules, date).is_empty() {
        tracing::debug!("Service {} has no availability on {}", service.id, date);
        return Ok(Vec::new());
    }

    let booked = Booking::booked_slots(&mut *conn, date).await?;
    let vehicle_capacity = if rules.iter().any(|r| r.use_staff_vehicle_capacity) {
        Vehicle::staff_capacity(&mut *conn).await?
    } else {
        0
    };

    Ok(compute_slots(service.duration_minutes, &rules, date, &booked, vehicle_capacity))
}
