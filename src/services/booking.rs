use chrono::{NaiveDate, NaiveTime};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::auth::{AuthInfo, Role};
use crate::config::EmailConfig;
use crate::database::models::{
    Booking, BookingDetail, BookingStatus, Client, ClientDetail, CreateBooking, Pet, Service, UpdateBooking,
    Vehicle,
};
use crate::database::{DatabaseError, Repository};
use crate::email::{self, EmailTemplate, Mailer};
use crate::error::ApiError;
use crate::services::availability::{find_slot, slots_for, Slot};
use crate::state::AppState;

/// Decide which clients a new booking is linked to. Clients always book for
/// themselves; staff name clients explicitly or fall back to the pets' owners.
fn booking_clients(auth: &AuthInfo, req: &CreateBooking, pets: &[Pet]) -> Result<Vec<Uuid>, ApiError> {
    if auth.role == Role::Client {
        return Ok(vec![auth.own_client_id()?]);
    }
    if !req.client_ids.is_empty() {
        return Ok(req.client_ids.clone());
    }
    let mut owners: Vec<Uuid> = pets.iter().map(|pet| pet.client_id).collect();
    owners.sort();
    owners.dedup();
    Ok(owners)
}

/// The offered slot starting at `start_time`, or 400 on `start_time`
fn require_slot<'a>(
    slots: &'a [Slot],
    service_name: &str,
    date: NaiveDate,
    start_time: NaiveTime,
) -> Result<&'a Slot, ApiError> {
    find_slot(slots, start_time).ok_or_else(|| {
        ApiError::field_error(
            "start_time",
            format!("no {} slot starts at {} on {}", service_name, start_time, date),
        )
    })
}

/// 409 unless `slot` has room for `requested` more pets
fn check_room(slot: &Slot, requested: i64) -> Result<(), ApiError> {
    if requested <= slot.remaining {
        return Ok(());
    }
    tracing::info!(
        "Slot {} full: {} requested, {} remaining",
        slot.start_time,
        requested,
        slot.remaining
    );
    Err(ApiError::conflict(format!(
        "Slot is full: {} place(s) left, {} requested",
        slot.remaining, requested
    )))
}

/// 409 unless `vehicle` seats every pet on the booking
fn check_vehicle_seats(vehicle: &Vehicle, pets: i64) -> Result<(), ApiError> {
    if i64::from(vehicle.pet_capacity) >= pets {
        return Ok(());
    }
    Err(ApiError::conflict(format!(
        "Vehicle '{}' seats {} pet(s); booking has {}",
        vehicle.name, vehicle.pet_capacity, pets
    )))
}

/// Clients may only cancel bookings they are linked to
fn check_patch_allowed(auth: &AuthInfo, existing: &BookingDetail, req: &UpdateBooking) -> Result<(), ApiError> {
    if auth.is_staff_or_admin() {
        return Ok(());
    }
    let client_id = auth.own_client_id()?;
    if !existing.is_linked_to(client_id) {
        return Err(ApiError::forbidden("Booking does not belong to you"));
    }
    if !req.is_cancellation_only() {
        return Err(ApiError::forbidden("Clients may only cancel bookings"));
    }
    Ok(())
}

/// A patch that moves a cancelled booking back to a live status takes
/// its pets back out of the slot
fn reinstates(existing: &Booking, req: &UpdateBooking) -> bool {
    existing.is_cancelled() && matches!(req.status, Some(status) if status != BookingStatus::Cancelled)
}

/// Insert an already validated booking. `conn` must be inside a
/// transaction: the date lock is held until it commits.
pub async fn create_booking(
    conn: &mut PgConnection,
    auth: &AuthInfo,
    req: CreateBooking,
) -> Result<BookingDetail, ApiError> {
    let service = Repository::<Service>::select_404(&mut *conn, req.service_id).await?;
    if !service.is_active {
        return Err(ApiError::bad_request(format!("Service '{}' is not bookable", service.name)));
    }

    Booking::lock_date(&mut *conn, req.booking_date).await?;

    let pets = Pet::select_many(&mut *conn, &req.pet_ids).await?;
    if pets.len() != req.pet_ids.len() {
        return Err(ApiError::field_error("pet_ids", "unknown pet"));
    }

    let client_ids = booking_clients(auth, &req, &pets)?;
    if let Some(pet) = pets.iter().find(|pet| !client_ids.contains(&pet.client_id)) {
        if auth.role == Role::Client {
            tracing::warn!("Client {:?} tried to book pet {} they do not own", auth.client_id, pet.id);
            return Err(ApiError::forbidden("You can only book your own pets"));
        }
        return Err(ApiError::field_error(
            "pet_ids",
            format!("pet {} does not belong to the booking's clients", pet.id),
        ));
    }

    let slots = slots_for(&mut *conn, &service, req.booking_date).await?;
    let slot = require_slot(&slots, &service.name, req.booking_date, req.start_time)?;
    let requested = pets.len() as i64;
    check_room(slot, requested)?;

    let booking = Booking::insert(&mut *conn, &req, &slot.field_ids, slot.end_time).await?;
    Booking::link(&mut *conn, booking.id, &client_ids, &req.pet_ids).await?;
    tracing::info!(
        "Created booking {} for {} pet(s) on {} at {}",
        booking.id,
        requested,
        booking.booking_date,
        booking.start_time
    );

    Ok(BookingDetail::select_404(&mut *conn, booking.id).await?)
}

/// Apply a booking patch inside a transaction. Clients may only cancel
/// bookings they are linked to; a vehicle must seat every pet on the
/// booking; reinstating a cancelled booking needs room in its slot. The
/// flag is set when this patch is what cancelled the booking.
pub async fn update_booking(
    conn: &mut PgConnection,
    auth: &AuthInfo,
    id: Uuid,
    req: UpdateBooking,
) -> Result<(BookingDetail, bool), ApiError> {
    let existing = BookingDetail::select_404(&mut *conn, id).await?;
    check_patch_allowed(auth, &existing, &req)?;
    if req.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let pets = existing.pet_ids.len() as i64;
    if let Some(Some(vehicle_id)) = req.vehicle_id {
        let vehicle = Repository::<Vehicle>::select_one(&mut *conn, vehicle_id)
            .await?
            .ok_or_else(|| ApiError::field_error("vehicle_id", "unknown vehicle"))?;
        check_vehicle_seats(&vehicle, pets)?;
    }

    let booking = &existing.booking;
    if reinstates(booking, &req) {
        Booking::lock_date(&mut *conn, booking.booking_date).await?;
        let service = Repository::<Service>::select_404(&mut *conn, booking.service_id).await?;
        // Still cancelled, so its own pets are not in `booked`
        let slots = slots_for(&mut *conn, &service, booking.booking_date).await?;
        let slot = find_slot(&slots, booking.start_time).ok_or_else(|| {
            ApiError::conflict(format!(
                "{} no longer offers a slot at {} on {}",
                service.name, booking.start_time, booking.booking_date
            ))
        })?;
        check_room(slot, pets)?;
        tracing::info!("Reinstating booking {} ({} pet(s))", id, pets);
    }

    let cancelling = req.status == Some(BookingStatus::Cancelled) && !booking.is_cancelled();
    req.into_update().execute(id, &mut *conn).await?;
    if cancelling {
        tracing::info!("Booking {} cancelled by {} user {}", id, auth.role, auth.user_id);
    }
    Ok((BookingDetail::select_404(&mut *conn, id).await?, cancelling))
}

/// One email per linked client with an address: a cancellation notice for
/// cancelled bookings, a confirmation otherwise
pub fn booking_emails(
    booking: &BookingDetail,
    clients: &[ClientDetail],
    pet_names: &[String],
) -> Vec<(String, EmailTemplate)> {
    let cancelled = booking.booking.is_cancelled();
    clients
        .iter()
        .filter_map(|client| {
            let address = client.email.clone()?;
            let template = if cancelled {
                EmailTemplate::BookingCancelled {
                    client_name: client.display_name(),
                    service_name: booking.service_name.clone(),
                    date: booking.booking.booking_date,
                    start_time: booking.booking.start_time,
                }
            } else {
                EmailTemplate::BookingConfirmation {
                    client_name: client.display_name(),
                    service_name: booking.service_name.clone(),
                    date: booking.booking.booking_date,
                    start_time: booking.booking.start_time,
                    end_time: booking.booking.end_time,
                    pet_names: pet_names.to_vec(),
                }
            };
            Some((address, template))
        })
        .collect()
}

/// Send the emails for `booking`; failures are logged by `email::notify`
pub async fn send_booking_emails(
    mailer: &dyn Mailer,
    config: &EmailConfig,
    booking: &BookingDetail,
    clients: &[ClientDetail],
    pet_names: &[String],
) {
    for (address, template) in booking_emails(booking, clients, pet_names) {
        email::notify(mailer, config, vec![address], &template).await;
    }
}

/// Email every client linked to `booking`. Never fails the caller.
pub async fn notify_booking(state: &AppState, booking: &BookingDetail) {
    let loaded = async {
        let mut conn = state.db.admin().await?;
        let clients = Client::details_for(&mut conn, &booking.client_ids).await?;
        let pets = Pet::select_many(&mut conn, &booking.pet_ids).await?;
        Ok::<_, DatabaseError>((clients, pets))
    }
    .await;

    let (clients, pets) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Could not load recipients for booking {}: {}", booking.booking.id, e);
            return;
        }
    };
    let pet_names: Vec<String> = pets.into_iter().map(|pet| pet.name).collect();

    send_booking_emails(state.mailer.as_ref(), &state.config.email, booking, &clients, &pet_names).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::{EmailError, OutgoingEmail};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    fn auth(role: Role, client_id: Option<Uuid>) -> AuthInfo {
        AuthInfo {
            user_id: Uuid::new_v4(),
            email: None,
            role,
            client_id,
            staff_id: None,
        }
    }

    fn pet(client_id: Uuid) -> Pet {
        Pet {
            id: Uuid::new_v4(),
            client_id,
            name: "Biscuit".to_string(),
            breed: None,
            date_of_birth: None,
            notes: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn request(client_ids: Vec<Uuid>) -> CreateBooking {
        CreateBooking {
            service_id: Uuid::new_v4(),
            booking_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            pet_ids: vec![Uuid::new_v4()],
            client_ids,
            notes: None,
        }
    }

    #[test]
    fn clients_always_book_for_themselves() {
        let own = Uuid::new_v4();
        let someone_else = Uuid::new_v4();
        let ids = booking_clients(&auth(Role::Client, Some(own)), &request(vec![someone_else]), &[]).unwrap();
        assert_eq!(ids, vec![own]);
    }

    #[test]
    fn client_without_record_cannot_book() {
        let err = booking_clients(&auth(Role::Client, None), &request(vec![]), &[]).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn staff_default_to_pet_owners() {
        let owner = Uuid::new_v4();
        let pets = vec![pet(owner), pet(owner)];
        let ids = booking_clients(&auth(Role::Staff, None), &request(vec![]), &pets).unwrap();
        assert_eq!(ids, vec![owner]);

        let named = Uuid::new_v4();
        let ids = booking_clients(&auth(Role::Admin, None), &request(vec![named]), &pets).unwrap();
        assert_eq!(ids, vec![named]);
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(start: NaiveTime, capacity: i64, booked: i64) -> Slot {
        let remaining = (capacity - booked).max(0);
        Slot {
            availability_id: Uuid::new_v4(),
            start_time: start,
            end_time: start + chrono::Duration::hours(1),
            field_ids: vec![Uuid::new_v4()],
            capacity,
            booked,
            remaining,
            available: remaining > 0,
        }
    }

    fn detail(status: BookingStatus, client_ids: Vec<Uuid>, pets: usize) -> BookingDetail {
        BookingDetail {
            booking: Booking {
                id: Uuid::new_v4(),
                service_id: Uuid::new_v4(),
                field_ids: vec![Uuid::new_v4()],
                booking_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
                start_time: t(9, 0),
                end_time: t(10, 0),
                status: status.as_str().to_string(),
                staff_id: None,
                vehicle_id: None,
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            service_name: "Day Care".to_string(),
            client_ids,
            pet_ids: (0..pets).map(|_| Uuid::new_v4()).collect(),
        }
    }

    fn client_detail(id: Uuid, email: Option<&str>) -> ClientDetail {
        ClientDetail {
            client: Client {
                id,
                user_id: Uuid::new_v4(),
                address: None,
                emergency_contact_name: None,
                emergency_contact_phone: None,
                notes: None,
                created_at: Utc::now(),
            },
            email: email.map(str::to_string),
            first_name: Some("Robin".to_string()),
            last_name: None,
            phone: None,
        }
    }

    fn van(seats: i32) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            name: "Van".to_string(),
            registration: "DG01 VAN".to_string(),
            make: None,
            model: None,
            pet_capacity: seats,
            created_at: Utc::now(),
        }
    }

    fn status_patch(status: BookingStatus) -> UpdateBooking {
        UpdateBooking {
            status: Some(status),
            ..Default::default()
        }
    }

    #[test]
    fn start_time_must_match_an_offered_slot() {
        let slots = vec![slot(t(9, 0), 4, 0), slot(t(10, 0), 4, 0)];
        let date = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();

        assert_eq!(require_slot(&slots, "Day Care", date, t(10, 0)).unwrap().start_time, t(10, 0));

        let err = require_slot(&slots, "Day Care", date, t(9, 30)).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_json()["field_errors"]["start_time"].is_string());
    }

    #[test]
    fn full_slot_is_a_conflict() {
        assert!(check_room(&slot(t(9, 0), 3, 1), 2).is_ok());

        let err = check_room(&slot(t(9, 0), 3, 2), 2).unwrap_err();
        assert_eq!(err.status_code(), 409);

        let overbooked = slot(t(9, 0), 1, 3);
        assert_eq!(overbooked.remaining, 0);
        assert_eq!(check_room(&overbooked, 1).unwrap_err().status_code(), 409);
    }

    #[test]
    fn vehicle_must_seat_every_pet() {
        assert!(check_vehicle_seats(&van(3), 3).is_ok());
        assert_eq!(check_vehicle_seats(&van(2), 3).unwrap_err().status_code(), 409);
    }

    #[test]
    fn clients_may_only_cancel_their_own_bookings() {
        let own = Uuid::new_v4();
        let client = auth(Role::Client, Some(own));
        let mine = detail(BookingStatus::Confirmed, vec![own], 1);
        let theirs = detail(BookingStatus::Confirmed, vec![Uuid::new_v4()], 1);

        assert!(check_patch_allowed(&client, &mine, &status_patch(BookingStatus::Cancelled)).is_ok());

        let err = check_patch_allowed(&client, &theirs, &status_patch(BookingStatus::Cancelled)).unwrap_err();
        assert_eq!(err.status_code(), 403);

        let reassign = UpdateBooking {
            vehicle_id: Some(Some(Uuid::new_v4())),
            ..Default::default()
        };
        assert_eq!(check_patch_allowed(&client, &mine, &reassign).unwrap_err().status_code(), 403);
        assert_eq!(
            check_patch_allowed(&client, &mine, &status_patch(BookingStatus::Completed))
                .unwrap_err()
                .status_code(),
            403
        );

        let staff = auth(Role::Staff, None);
        assert!(check_patch_allowed(&staff, &theirs, &reassign).is_ok());
    }

    #[test]
    fn leaving_cancelled_needs_a_capacity_check() {
        let cancelled = detail(BookingStatus::Cancelled, vec![], 1).booking;
        let confirmed = detail(BookingStatus::Confirmed, vec![], 1).booking;

        assert!(reinstates(&cancelled, &status_patch(BookingStatus::Confirmed)));
        assert!(reinstates(&cancelled, &status_patch(BookingStatus::Completed)));
        assert!(!reinstates(&cancelled, &status_patch(BookingStatus::Cancelled)));
        assert!(!reinstates(&cancelled, &UpdateBooking { notes: Some("late".to_string()), ..Default::default() }));
        assert!(!reinstates(&confirmed, &status_patch(BookingStatus::Completed)));
    }

    #[derive(Default)]
    struct Outbox(Mutex<Vec<OutgoingEmail>>);

    #[async_trait]
    impl Mailer for Outbox {
        async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
            self.0.lock().unwrap().push(email);
            Ok(())
        }
    }

    fn email_config() -> EmailConfig {
        EmailConfig {
            api_url: "https://api.resend.com".to_string(),
            api_key: None,
            from: "Daycare <bookings@example.com>".to_string(),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn cancelled_booking_sends_cancellation_notice() {
        let linked = Uuid::new_v4();
        let booking = detail(BookingStatus::Cancelled, vec![linked], 1);
        let clients = vec![client_detail(linked, Some("robin@example.com"))];
        let outbox = Outbox::default();

        send_booking_emails(&outbox, &email_config(), &booking, &clients, &["Biscuit".to_string()]).await;

        let sent = outbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["robin@example.com".to_string()]);
        assert_eq!(sent[0].subject, "Booking cancelled: Day Care on Monday 4 May 2026");
        assert!(sent[0].html.contains("has been cancelled"));
    }

    #[tokio::test]
    async fn confirmed_booking_sends_confirmation_to_clients_with_address() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let booking = detail(BookingStatus::Confirmed, vec![first, second], 2);
        let clients = vec![
            client_detail(first, Some("robin@example.com")),
            client_detail(second, None),
        ];
        let outbox = Outbox::default();

        send_booking_emails(
            &outbox,
            &email_config(),
            &booking,
            &clients,
            &["Biscuit".to_string(), "Rex".to_string()],
        )
        .await;

        let sent = outbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.starts_with("Booking confirmed: Day Care"));
        assert!(sent[0].html.contains("<li>Biscuit</li><li>Rex</li>"));
    }
}
