pub mod availability;
pub mod booking;
pub mod client;
pub mod field;
pub mod pet;
pub mod profile;
pub mod service;
pub mod site;
pub mod staff;
pub mod vehicle;

pub use availability::{CreateAvailability, ServiceAvailability};
pub use booking::{
    BookedSlot, Booking, BookingDetail, BookingFilter, BookingStatus, CreateBooking, UpdateBooking,
};
pub use client::{Client, ClientDetail, CreateClient, UpdateClient};
pub use field::{CreateField, Field, FieldFilter, UpdateField};
pub use pet::{CreatePet, Pet, PetFilter, UpdatePet};
pub use profile::{AdminUpdateUser, Profile, UpdateProfile};
pub use service::{CreateService, Service, UpdateService};
pub use site::{CreateSite, Site, UpdateSite};
pub use staff::{CreateStaff, Staff, StaffMember, UpdateStaff};
pub use vehicle::{CreateVehicle, UpdateVehicle, Vehicle};

use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) so PATCH bodies can clear nullable columns.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn default_true() -> bool {
    true
}

/// Reject empty or whitespace-only required text
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::field_error(field, "must not be empty"));
    }
    Ok(())
}

/// Same as [`require_text`] for optional patch values
pub(crate) fn require_text_opt(field: &str, value: Option<&String>) -> Result<(), ApiError> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}

pub(crate) fn require_non_negative(field: &str, value: Option<i32>) -> Result<(), ApiError> {
    match value {
        Some(v) if v < 0 => Err(ApiError::field_error(field, "must not be negative")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        vehicle_id: Option<Option<Uuid>>,
    }

    #[test]
    fn double_option_separates_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.vehicle_id, None);

        let null: Patch = serde_json::from_str(r#"{"vehicle_id": null}"#).unwrap();
        assert_eq!(null.vehicle_id, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"vehicle_id": "{id}"}}"#)).unwrap();
        assert_eq!(set.vehicle_id, Some(Some(id)));
    }

    #[test]
    fn text_validation() {
        assert!(require_text("name", "Meadow").is_ok());
        assert_eq!(require_text("name", "   ").unwrap_err().status_code(), 400);
        assert!(require_text_opt("name", None).is_ok());
        assert!(require_non_negative("capacity", Some(-1)).is_err());
        assert!(require_non_negative("capacity", Some(0)).is_ok());
    }
}
