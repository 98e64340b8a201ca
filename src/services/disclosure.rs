// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Driver disclosure window.
//!
//! A rider only gets to see who is picking them up during the hour before
//! pickup. Everything here is pure so the window can be tested without a
//! clock.

use chrono::{Duration, NaiveDateTime};

use crate::models::Reservation;

/// How long before pickup the assigned driver becomes visible.
pub const DISCLOSURE_WINDOW_MINUTES: i64 = 60;

/// Outcome of checking one reservation against the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowDecision {
    /// Inside the window with an accepted driver
    Disclosed { driver_username: String },
    /// Inside the window but nobody has accepted
    NoDriverAssigned,
    /// Pickup more than an hour away, or already passed
    NotYetWindow,
}

/// True when `0 < pickup - now <= 60 min`.
///
/// Pickup exactly at `now` or in the past is outside the window.
pub fn in_window(pickup: NaiveDateTime, now: NaiveDateTime) -> bool {
    let delta = pickup - now;
    delta > Duration::zero() && delta <= Duration::minutes(DISCLOSURE_WINDOW_MINUTES)
}

/// Decide what the rider may see for `reservation` at local time `now`.
pub fn resolve_disclosure(reservation: &Reservation, now: NaiveDateTime) -> WindowDecision {
    if !in_window(reservation.pickup_at(), now) {
        return WindowDecision::NotYetWindow;
    }

    match reservation.status.accepted_by() {
        Some(username) => WindowDecision::Disclosed {
            driver_username: username.to_string(),
        },
        None => WindowDecision::NoDriverAssigned,
    }
}

/// Among `reservations`, the active one with the earliest pickup that is
/// inside the window.
pub fn first_in_window<'a, I>(reservations: I, now: NaiveDateTime) -> Option<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    reservations
        .into_iter()
        .filter(|r| r.status.is_active() && in_window(r.pickup_at(), now))
        .min_by_key(|r| r.pickup_at())
}
