// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reservation lifecycle: create, look up, accept, cancel, complete, trash.
//!
//! Every mutation reads the whole `reservations` collection, changes it and
//! writes it back before reporting success. There is no locking between
//! callers; two concurrent writers race and the last write wins.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use validator::Validate;

use crate::db::{collections, Db};
use crate::error::{AppError, Result};
use crate::models::reservation::is_valid_phone;
use crate::models::{AuditContext, AuditKind, Driver, NewReservation, Reservation, ReservationStatus};
use crate::services::disclosure::{first_in_window, resolve_disclosure, WindowDecision};
use crate::services::{AuditLog, Clock, DriverDirectory};
use crate::time_utils::{hhmm, to_local};

/// What a rider gets back when checking on their reservation.
#[derive(Debug, Clone)]
pub enum Disclosure {
    /// No active reservation for this phone
    NoReservation,
    /// Active reservations exist but none is within the hour before pickup
    NotYetWindow,
    /// In the window, no usable driver yet
    NoDriverAssigned { reservation: Reservation },
    /// In the window with a driver who may be shown
    Disclosed {
        reservation: Reservation,
        driver: Driver,
    },
}

#[derive(Clone)]
pub struct ReservationService {
    db: Db,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    audit: AuditLog,
    drivers: DriverDirectory,
}

impl ReservationService {
    pub fn new(
        db: Db,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        audit: AuditLog,
        drivers: DriverDirectory,
    ) -> Self {
        Self {
            db,
            clock,
            offset,
            audit,
            drivers,
        }
    }

    /// Current local wall-clock time, the frame pickup times are written in.
    pub fn local_now(&self) -> NaiveDateTime {
        to_local(self.clock.now(), self.offset)
    }

    /// Validate and persist a new reservation.
    ///
    /// The phone is checked before anything else; an invalid phone never
    /// reaches the store.
    pub fn create(&self, input: NewReservation) -> Result<Reservation> {
        if !is_valid_phone(&input.phone) {
            return Err(AppError::validation(
                "Phone must be in international format, e.g. +34612345678",
            ));
        }

        let input = NewReservation {
            name: input.name.trim().to_string(),
            pickup_location: input.pickup_location.trim().to_string(),
            destination: input.destination.trim().to_string(),
            ..input
        };
        input.validate()?;

        let pickup_date = NaiveDate::parse_from_str(input.pickup_date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::validation("Pickup date must be YYYY-MM-DD"))?;
        let pickup_time = hhmm::parse(&input.pickup_time)
            .ok_or_else(|| AppError::validation("Pickup time must be HH:MM"))?;

        let now = self.clock.now();
        let reservation = Reservation {
            id: uuid::Uuid::new_v4().to_string(),
            sku: generate_sku(now),
            name: input.name,
            phone: input.phone,
            pickup_date,
            pickup_time,
            pickup_location: input.pickup_location,
            destination: input.destination,
            adults: input.adults,
            children: input.children,
            pmr: input.pmr,
            observations: input.observations,
            client_location_tracking: input.client_location_tracking,
            created_at: now,
            status: ReservationStatus::Active,
        };

        self.db
            .update::<Reservation, _, _>(collections::RESERVATIONS, |all| {
                all.push(reservation.clone());
                Ok(())
            })?;

        self.audit.record(
            AuditKind::ReservationCreated,
            &reservation.phone,
            AuditContext::reservation(&reservation.sku).with_phone(&reservation.phone),
        );

        tracing::info!(sku = %reservation.sku, "Reservation created");
        Ok(reservation)
    }

    pub fn get(&self, id: &str) -> Result<Reservation> {
        self.db
            .read::<Reservation>(collections::RESERVATIONS)
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Active or accepted reservations for `phone`, newest first.
    pub fn find_active_by_phone(&self, phone: &str) -> Vec<Reservation> {
        let mut matches: Vec<Reservation> = self
            .db
            .read::<Reservation>(collections::RESERVATIONS)
            .into_iter()
            .filter(|r| r.phone == phone && r.status.is_active())
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }

    /// Resolve what the rider with `phone` may see right now.
    pub fn check(&self, phone: &str) -> Disclosure {
        let active = self.find_active_by_phone(phone);
        if active.is_empty() {
            return Disclosure::NoReservation;
        }

        let now = self.local_now();
        let Some(reservation) = first_in_window(active.iter(), now) else {
            return Disclosure::NotYetWindow;
        };

        match resolve_disclosure(reservation, now) {
            WindowDecision::Disclosed { driver_username } => {
                match self.drivers.find_active(&driver_username) {
                    Some(driver) => Disclosure::Disclosed {
                        reservation: reservation.clone(),
                        driver,
                    },
                    None => {
                        tracing::warn!(
                            sku = %reservation.sku,
                            username = %driver_username,
                            "Accepting driver missing or banned"
                        );
                        Disclosure::NoDriverAssigned {
                            reservation: reservation.clone(),
                        }
                    }
                }
            }
            WindowDecision::NoDriverAssigned => Disclosure::NoDriverAssigned {
                reservation: reservation.clone(),
            },
            WindowDecision::NotYetWindow => Disclosure::NotYetWindow,
        }
    }

    /// Whether `phone` is still shown `username` for reservation `id`.
    pub fn still_disclosed(&self, phone: &str, id: &str, username: &str) -> bool {
        matches!(
            self.check(phone),
            Disclosure::Disclosed { reservation, driver }
                if reservation.id == id && driver.username == username
        )
    }

    /// Cancel a reservation.
    ///
    /// Cancelling twice succeeds both times; cancelling a completed ride is a
    /// conflict. Each successful call is audited.
    pub fn cancel(&self, id: &str, actor: &str) -> Result<Reservation> {
        let reservation = self
            .db
            .update::<Reservation, _, _>(collections::RESERVATIONS, |all| {
                let r = find_mut(all, id)?;
                match r.status {
                    ReservationStatus::Completed => Err(AppError::Conflict(
                        "Completed reservations cannot be cancelled".to_string(),
                    )),
                    ReservationStatus::Cancelled => Ok(r.clone()),
                    _ => {
                        r.status = ReservationStatus::Cancelled;
                        Ok(r.clone())
                    }
                }
            })?;

        self.audit.record(
            AuditKind::ReservationCancelled,
            actor,
            AuditContext::reservation(&reservation.sku).with_phone(&reservation.phone),
        );

        tracing::info!(sku = %reservation.sku, actor, "Reservation cancelled");
        Ok(reservation)
    }

    /// Cancel on behalf of a rider, who must know the phone it was booked with.
    pub fn cancel_as_rider(&self, id: &str, phone: &str) -> Result<Reservation> {
        let reservation = self.get(id)?;
        if reservation.phone != phone {
            return Err(not_found(id));
        }
        self.cancel(id, phone)
    }

    /// Cancel every active reservation for `phone`.
    pub fn cancel_all_active_for_phone(&self, phone: &str) -> Result<Vec<Reservation>> {
        let cancelled = self
            .db
            .update::<Reservation, _, _>(collections::RESERVATIONS, |all| {
                let mut cancelled = Vec::new();
                for r in all
                    .iter_mut()
                    .filter(|r| r.phone == phone && r.status.is_active())
                {
                    r.status = ReservationStatus::Cancelled;
                    cancelled.push(r.clone());
                }
                Ok(cancelled)
            })?;

        for r in &cancelled {
            self.audit.record(
                AuditKind::ReservationCancelled,
                phone,
                AuditContext::reservation(&r.sku).with_phone(phone),
            );
        }

        tracing::info!(count = cancelled.len(), "Cancelled active reservations for phone");
        Ok(cancelled)
    }

    /// Record `username` as the driver for a reservation.
    ///
    /// A reservation already accepted by someone else is taken over: the last
    /// acceptor wins.
    pub fn accept(&self, id: &str, username: &str) -> Result<Reservation> {
        if self.drivers.find_active(username).is_none() {
            return Err(AppError::Forbidden);
        }

        let accepted_at = self.clock.now();
        let reservation = self
            .db
            .update::<Reservation, _, _>(collections::RESERVATIONS, |all| {
                let r = find_mut(all, id)?;
                match &r.status {
                    ReservationStatus::Active => {}
                    ReservationStatus::Accepted { accepted_by, .. } => {
                        if accepted_by != username {
                            tracing::warn!(
                                sku = %r.sku,
                                previous = %accepted_by,
                                username,
                                "Reservation re-accepted by another driver"
                            );
                        }
                    }
                    ReservationStatus::Cancelled | ReservationStatus::Completed => {
                        return Err(AppError::Conflict(format!(
                            "Reservation is {}",
                            r.status.label()
                        )));
                    }
                }
                r.status = ReservationStatus::Accepted {
                    accepted_by: username.to_string(),
                    accepted_at,
                };
                Ok(r.clone())
            })?;

        self.audit.record(
            AuditKind::ReservationAccepted,
            username,
            AuditContext::reservation(&reservation.sku).with_driver(username),
        );

        tracing::info!(sku = %reservation.sku, username, "Reservation accepted");
        Ok(reservation)
    }

    /// Mark a ride as done. Completing twice is a no-op.
    pub fn complete(&self, id: &str, actor: &str) -> Result<Reservation> {
        self.complete_inner(id, actor, None)
    }

    /// Complete a ride the driver accepted themselves.
    pub fn complete_by_driver(&self, id: &str, username: &str) -> Result<Reservation> {
        self.complete_inner(id, username, Some(username))
    }

    fn complete_inner(&self, id: &str, actor: &str, owner: Option<&str>) -> Result<Reservation> {
        let reservation = self
            .db
            .update::<Reservation, _, _>(collections::RESERVATIONS, |all| {
                let r = find_mut(all, id)?;
                if let Some(owner) = owner {
                    if r.status.accepted_by() != Some(owner)
                        && r.status != ReservationStatus::Completed
                    {
                        return Err(AppError::Forbidden);
                    }
                }
                match r.status {
                    ReservationStatus::Cancelled => Err(AppError::Conflict(
                        "Cancelled reservations cannot be completed".to_string(),
                    )),
                    ReservationStatus::Completed => Ok(r.clone()),
                    _ => {
                        r.status = ReservationStatus::Completed;
                        Ok(r.clone())
                    }
                }
            })?;

        let mut context = AuditContext::reservation(&reservation.sku);
        if let Some(owner) = owner {
            context = context.with_driver(owner);
        }
        self.audit.record(AuditKind::ReservationCompleted, actor, context);

        tracing::info!(sku = %reservation.sku, actor, "Reservation completed");
        Ok(reservation)
    }

    /// Move a reservation into the trash collection.
    pub fn move_to_trash(&self, id: &str) -> Result<Reservation> {
        let reservation = self.get(id)?;

        // Copy first, then remove: a failure in between leaves a duplicate
        // rather than losing the record.
        self.db
            .update::<Reservation, _, _>(collections::DELETED_RESERVATIONS, |trash| {
                trash.retain(|r| r.id != id);
                trash.push(reservation.clone());
                Ok(())
            })?;
        self.db
            .update::<Reservation, _, _>(collections::RESERVATIONS, |all| {
                all.retain(|r| r.id != id);
                Ok(())
            })?;

        self.audit.record(
            AuditKind::ReservationTrashed,
            "admin",
            AuditContext::reservation(&reservation.sku),
        );

        tracing::info!(sku = %reservation.sku, "Reservation moved to trash");
        Ok(reservation)
    }

    /// Bring a trashed reservation back, status unchanged.
    pub fn restore(&self, id: &str) -> Result<Reservation> {
        let reservation = self
            .list_trash()
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;

        self.db
            .update::<Reservation, _, _>(collections::RESERVATIONS, |all| {
                if !all.iter().any(|r| r.id == id) {
                    all.push(reservation.clone());
                }
                Ok(())
            })?;
        self.db
            .update::<Reservation, _, _>(collections::DELETED_RESERVATIONS, |trash| {
                trash.retain(|r| r.id != id);
                Ok(())
            })?;

        self.audit.record(
            AuditKind::ReservationRestored,
            "admin",
            AuditContext::reservation(&reservation.sku),
        );

        tracing::info!(sku = %reservation.sku, "Reservation restored");
        Ok(reservation)
    }

    pub fn list_trash(&self) -> Vec<Reservation> {
        self.db.read(collections::DELETED_RESERVATIONS)
    }

    /// Admin listing, by pickup time. Optionally limited to one pickup day
    /// and to a case-insensitive search string.
    pub fn list(&self, date: Option<NaiveDate>, search: Option<&str>) -> Vec<Reservation> {
        let needle = search.map(str::trim).filter(|s| !s.is_empty());
        let mut list: Vec<Reservation> = self
            .db
            .read::<Reservation>(collections::RESERVATIONS)
            .into_iter()
            .filter(|r| date.is_none_or(|d| r.pickup_date == d))
            .filter(|r| needle.is_none_or(|n| r.matches_search(n)))
            .collect();
        list.sort_by_key(Reservation::pickup_at);
        list
    }

    /// Reservations waiting for a driver whose pickup has not passed yet,
    /// soonest first.
    pub fn open_requests(&self) -> Vec<Reservation> {
        let now = self.local_now();
        let mut open: Vec<Reservation> = self
            .db
            .read::<Reservation>(collections::RESERVATIONS)
            .into_iter()
            .filter(|r| r.status == ReservationStatus::Active && r.pickup_at() > now)
            .collect();
        open.sort_by_key(Reservation::pickup_at);
        open
    }

    /// Reservations currently held by `username`, soonest first.
    pub fn accepted_by(&self, username: &str) -> Vec<Reservation> {
        let mut mine: Vec<Reservation> = self
            .db
            .read::<Reservation>(collections::RESERVATIONS)
            .into_iter()
            .filter(|r| r.status.accepted_by() == Some(username))
            .collect();
        mine.sort_by_key(Reservation::pickup_at);
        mine
    }
}

fn find_mut<'a>(all: &'a mut [Reservation], id: &str) -> Result<&'a mut Reservation> {
    all.iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Reservation {} not found", id))
}

/// Ticket code: creation millis in base 36, a dash, six random characters.
/// Uppercase throughout. Collisions are not checked.
pub fn generate_sku(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().max(0) as u64;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::drivers::tests::new_driver;
    use crate::services::{LogQuery, ManualClock};
    use chrono::TimeZone;

    struct Fixture {
        reservations: ReservationService,
        drivers: DriverDirectory,
        audit: AuditLog,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let db = Db::in_memory();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap(),
        ));
        let offset = FixedOffset::east_opt(0).unwrap();
        let audit = AuditLog::new(db.clone(), clock.clone(), offset);
        let drivers = DriverDirectory::new(db.clone(), clock.clone(), audit.clone());
        let reservations = ReservationService::new(
            db,
            clock.clone(),
            offset,
            audit.clone(),
            drivers.clone(),
        );
        Fixture {
            reservations,
            drivers,
            audit,
            clock,
        }
    }

    fn new_reservation(phone: &str, time: &str) -> NewReservation {
        NewReservation {
            name: "Ana Pérez".to_string(),
            phone: phone.to_string(),
            pickup_date: "2025-01-16".to_string(),
            pickup_time: time.to_string(),
            pickup_location: "Calle Mayor 1".to_string(),
            destination: "Aeropuerto".to_string(),
            adults: 2,
            children: 0,
            pmr: 0,
            observations: String::new(),
            client_location_tracking: false,
        }
    }

    #[test]
    fn test_sku_format() {
        let sku = generate_sku(Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap());
        let (stamp, suffix) = sku.split_once('-').unwrap();

        assert!(!stamp.is_empty());
        assert_eq!(suffix.len(), 6);
        assert!(sku
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_create_rejects_bad_phone_without_writing() {
        let f = fixture();

        let err = f
            .reservations
            .create(new_reservation("612345678", "14:30"))
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(f.reservations.list(None, None).is_empty());
        assert!(f.audit.query(&LogQuery::default()).is_empty());
    }

    #[test]
    fn test_create_rejects_unparseable_time_and_blank_name() {
        let f = fixture();

        let err = f
            .reservations
            .create(new_reservation("+34612345678", "25:99"))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut input = new_reservation("+34612345678", "14:30");
        input.name = "   ".to_string();
        assert!(matches!(
            f.reservations.create(input),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_find_active_by_phone_newest_first() {
        let f = fixture();
        let first = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();
        f.clock
            .set(Utc.with_ymd_and_hms(2025, 1, 16, 9, 5, 0).unwrap());
        let second = f
            .reservations
            .create(new_reservation("+34612345678", "16:00"))
            .unwrap();
        f.reservations
            .create(new_reservation("+34699999999", "15:00"))
            .unwrap();

        let found = f.reservations.find_active_by_phone("+34612345678");
        let ids: Vec<_> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert_ne!(first.sku, second.sku);
    }

    #[test]
    fn test_cancel_is_idempotent_and_audited_each_time() {
        let f = fixture();
        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();

        f.reservations.cancel(&r.id, "+34612345678").unwrap();
        let again = f.reservations.cancel(&r.id, "+34612345678").unwrap();

        assert_eq!(again.status, ReservationStatus::Cancelled);
        assert!(f.reservations.find_active_by_phone("+34612345678").is_empty());

        let cancellations = f
            .audit
            .query(&LogQuery::default())
            .into_iter()
            .filter(|v| v.entry.kind == AuditKind::ReservationCancelled)
            .count();
        assert_eq!(cancellations, 2);
    }

    #[test]
    fn test_cancel_unknown_and_completed() {
        let f = fixture();
        assert!(matches!(
            f.reservations.cancel("nope", "admin"),
            Err(AppError::NotFound(_))
        ));

        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();
        f.reservations.complete(&r.id, "admin").unwrap();
        assert!(matches!(
            f.reservations.cancel(&r.id, "admin"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_rider_cancel_requires_matching_phone() {
        let f = fixture();
        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();

        assert!(matches!(
            f.reservations.cancel_as_rider(&r.id, "+34699999999"),
            Err(AppError::NotFound(_))
        ));
        assert!(f
            .reservations
            .cancel_as_rider(&r.id, "+34612345678")
            .is_ok());
    }

    #[test]
    fn test_cancel_all_for_phone_leaves_others() {
        let f = fixture();
        f.reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();
        f.reservations
            .create(new_reservation("+34612345678", "16:00"))
            .unwrap();
        let other = f
            .reservations
            .create(new_reservation("+34699999999", "15:00"))
            .unwrap();

        let cancelled = f
            .reservations
            .cancel_all_active_for_phone("+34612345678")
            .unwrap();

        assert_eq!(cancelled.len(), 2);
        assert!(f.reservations.find_active_by_phone("+34612345678").is_empty());
        assert_eq!(
            f.reservations.get(&other.id).unwrap().status,
            ReservationStatus::Active
        );
    }

    #[test]
    fn test_accept_last_acceptor_wins() {
        let f = fixture();
        f.drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();
        f.drivers
            .register(new_driver("mariarodriguez", "maria@example.com"))
            .unwrap();
        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();

        f.reservations.accept(&r.id, "juangarcia").unwrap();
        let taken = f.reservations.accept(&r.id, "mariarodriguez").unwrap();

        assert_eq!(taken.status.accepted_by(), Some("mariarodriguez"));
        assert!(f.reservations.accepted_by("juangarcia").is_empty());
        assert_eq!(f.reservations.accepted_by("mariarodriguez").len(), 1);
    }

    #[test]
    fn test_accept_requires_active_driver_and_open_reservation() {
        let f = fixture();
        f.drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();
        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();

        assert!(matches!(
            f.reservations.accept(&r.id, "ghost"),
            Err(AppError::Forbidden)
        ));

        f.reservations.cancel(&r.id, "admin").unwrap();
        assert!(matches!(
            f.reservations.accept(&r.id, "juangarcia"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_check_walks_the_window() {
        let f = fixture();
        f.drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();

        assert!(matches!(
            f.reservations.check("+34612345678"),
            Disclosure::NoReservation
        ));

        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();
        f.reservations.accept(&r.id, "juangarcia").unwrap();

        f.clock
            .set(Utc.with_ymd_and_hms(2025, 1, 16, 13, 0, 0).unwrap());
        assert!(matches!(
            f.reservations.check("+34612345678"),
            Disclosure::NotYetWindow
        ));

        f.clock
            .set(Utc.with_ymd_and_hms(2025, 1, 16, 14, 0, 0).unwrap());
        match f.reservations.check("+34612345678") {
            Disclosure::Disclosed { driver, .. } => assert_eq!(driver.username, "juangarcia"),
            other => panic!("expected disclosure, got {:?}", other),
        }

        f.clock
            .set(Utc.with_ymd_and_hms(2025, 1, 16, 14, 31, 0).unwrap());
        assert!(matches!(
            f.reservations.check("+34612345678"),
            Disclosure::NotYetWindow
        ));
    }

    #[test]
    fn test_check_hides_banned_driver() {
        let f = fixture();
        f.drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();
        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();
        f.reservations.accept(&r.id, "juangarcia").unwrap();
        f.drivers.set_banned("juangarcia", true).unwrap();

        f.clock
            .set(Utc.with_ymd_and_hms(2025, 1, 16, 14, 0, 0).unwrap());
        assert!(matches!(
            f.reservations.check("+34612345678"),
            Disclosure::NoDriverAssigned { .. }
        ));
    }

    #[test]
    fn test_still_disclosed_follows_status_and_clock() {
        let f = fixture();
        for (username, email) in [
            ("juangarcia", "juan@example.com"),
            ("mariaperez", "maria@example.com"),
        ] {
            f.drivers.register(new_driver(username, email)).unwrap();
        }
        let phone = "+34612345678";
        let r = f
            .reservations
            .create(new_reservation(phone, "14:30"))
            .unwrap();
        f.reservations.accept(&r.id, "juangarcia").unwrap();

        f.clock
            .set(Utc.with_ymd_and_hms(2025, 1, 16, 14, 0, 0).unwrap());
        assert!(f.reservations.still_disclosed(phone, &r.id, "juangarcia"));
        assert!(!f.reservations.still_disclosed(phone, "other-id", "juangarcia"));

        // Another driver took the ride
        f.reservations.accept(&r.id, "mariaperez").unwrap();
        assert!(!f.reservations.still_disclosed(phone, &r.id, "juangarcia"));
        assert!(f.reservations.still_disclosed(phone, &r.id, "mariaperez"));

        // Pickup has passed
        f.clock
            .set(Utc.with_ymd_and_hms(2025, 1, 16, 14, 31, 0).unwrap());
        assert!(!f.reservations.still_disclosed(phone, &r.id, "mariaperez"));

        // Cancelled inside the window
        f.clock
            .set(Utc.with_ymd_and_hms(2025, 1, 16, 14, 0, 0).unwrap());
        f.reservations.cancel(&r.id, phone).unwrap();
        assert!(!f.reservations.still_disclosed(phone, &r.id, "mariaperez"));
    }

    #[test]
    fn test_trash_and_restore_round_trip() {
        let f = fixture();
        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();

        f.reservations.move_to_trash(&r.id).unwrap();
        assert!(matches!(
            f.reservations.get(&r.id),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(f.reservations.list_trash().len(), 1);

        let restored = f.reservations.restore(&r.id).unwrap();
        assert_eq!(restored, r);
        assert!(f.reservations.list_trash().is_empty());
        assert_eq!(f.reservations.get(&r.id).unwrap(), r);
    }

    #[test]
    fn test_open_requests_skip_accepted_and_past() {
        let f = fixture();
        f.drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();
        let past = f
            .reservations
            .create(new_reservation("+34612345678", "08:00"))
            .unwrap();
        let taken = f
            .reservations
            .create(new_reservation("+34612345678", "12:00"))
            .unwrap();
        let open = f
            .reservations
            .create(new_reservation("+34612345678", "11:00"))
            .unwrap();
        f.reservations.accept(&taken.id, "juangarcia").unwrap();

        let ids: Vec<_> = f
            .reservations
            .open_requests()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![open.id]);
        assert_eq!(f.reservations.list(None, None).len(), 3);
        assert_eq!(f.reservations.list(None, None)[0].id, past.id);
    }

    #[test]
    fn test_driver_can_only_complete_own_ride() {
        let f = fixture();
        f.drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();
        f.drivers
            .register(new_driver("mariarodriguez", "maria@example.com"))
            .unwrap();
        let r = f
            .reservations
            .create(new_reservation("+34612345678", "14:30"))
            .unwrap();
        f.reservations.accept(&r.id, "juangarcia").unwrap();

        assert!(matches!(
            f.reservations.complete_by_driver(&r.id, "mariarodriguez"),
            Err(AppError::Forbidden)
        ));
        let done = f
            .reservations
            .complete_by_driver(&r.id, "juangarcia")
            .unwrap();
        assert_eq!(done.status, ReservationStatus::Completed);
    }
}
