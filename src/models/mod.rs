// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod audit;
pub mod driver;
pub mod islands;
pub mod location;
pub mod password_reset;
pub mod reservation;
pub mod suggestion;

pub use audit::{AdminLogEntry, AdminLogView, AuditContext, AuditKind};
pub use driver::{Driver, DriverContact, DriverProfile, NewDriver};
pub use location::{Coordinates, DriverLocation};
pub use password_reset::PasswordResetRequest;
pub use reservation::{NewReservation, Reservation, ReservationStatus};
pub use suggestion::{NewSuggestion, Suggestion};
