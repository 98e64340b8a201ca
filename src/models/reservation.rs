// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Reservation model for storage and API.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::time_utils;

/// `+`, a 1-3 digit country code, then a 6-14 digit subscriber number.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{1,3}\d{6,14}$").expect("valid phone regex"));

/// Check a phone number against the accepted international format.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Lifecycle state of a reservation.
///
/// Stored flattened into the reservation record, e.g.
/// `{"status": "accepted", "acceptedBy": "juangarcia", "acceptedAt": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ReservationStatus {
    /// Waiting for a driver
    Active,
    /// Claimed by a driver; still counts as active
    Accepted {
        accepted_by: String,
        accepted_at: DateTime<Utc>,
    },
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Active or accepted: the reservation still needs a ride.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Active | ReservationStatus::Accepted { .. }
        )
    }

    /// Username of the driver who claimed the reservation, if any.
    pub fn accepted_by(&self) -> Option<&str> {
        match self {
            ReservationStatus::Accepted { accepted_by, .. } => Some(accepted_by),
            _ => None,
        }
    }

    /// Short label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "pending",
            ReservationStatus::Accepted { .. } => "accepted",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }
}

/// Stored reservation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Internal identifier (UUID v4)
    pub id: String,
    /// Ticket code shown to the rider
    pub sku: String,
    /// Rider name
    pub name: String,
    /// Rider phone, used to look reservations up
    pub phone: String,
    pub pickup_date: NaiveDate,
    #[serde(with = "time_utils::hhmm")]
    pub pickup_time: NaiveTime,
    pub pickup_location: String,
    pub destination: String,
    pub adults: u32,
    pub children: u32,
    /// Passengers with reduced mobility
    pub pmr: u32,
    #[serde(default)]
    pub observations: String,
    /// Whether the rider agreed to share their location
    #[serde(default)]
    pub client_location_tracking: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: ReservationStatus,
}

impl Reservation {
    /// Scheduled pickup as a local wall-clock datetime.
    pub fn pickup_at(&self) -> NaiveDateTime {
        time_utils::combine(self.pickup_date, self.pickup_time)
    }

    /// Case-insensitive match over the fields the admin search box covers.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            self.sku.as_str(),
            self.name.as_str(),
            self.phone.as_str(),
            self.pickup_location.as_str(),
            self.destination.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

fn default_adults() -> u32 {
    1
}

/// Rider submission for a new reservation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub phone: String,
    /// `YYYY-MM-DD`
    pub pickup_date: String,
    /// `HH:MM`
    pub pickup_time: String,
    #[validate(length(min = 1, max = 300, message = "Pickup location is required"))]
    pub pickup_location: String,
    #[validate(length(min = 1, max = 300, message = "Destination is required"))]
    pub destination: String,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub pmr: u32,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Observations are too long"))]
    pub observations: String,
    #[serde(default)]
    pub client_location_tracking: bool,
}
