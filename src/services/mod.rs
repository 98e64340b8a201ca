// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod audit;
pub mod clock;
pub mod disclosure;
pub mod drivers;
pub mod geocoding;
pub mod password;
pub mod password_reset;
pub mod reservations;
pub mod suggestions;
pub mod tracking;

pub use audit::{AuditLog, LogQuery};
pub use clock::{Clock, ManualClock, SystemClock};
pub use disclosure::{resolve_disclosure, WindowDecision, DISCLOSURE_WINDOW_MINUTES};
pub use drivers::DriverDirectory;
pub use geocoding::{GeocodingClient, ReverseGeocode, RouteEstimate};
pub use password_reset::PasswordResetService;
pub use reservations::{Disclosure, ReservationService};
pub use suggestions::SuggestionService;
pub use tracking::{start_tracking, LocationRegistry, TrackingHandle, TRACKING_INTERVAL};
