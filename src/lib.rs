// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CityRide: taxi reservations for the Canary Islands
//!
//! This crate provides the backend API where riders book pickups, drivers
//! accept them, and an admin panel oversees drivers, reservations and the
//! audit log.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{
    AuditLog, Clock, DriverDirectory, GeocodingClient, LocationRegistry, PasswordResetService,
    ReservationService, SuggestionService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub audit: AuditLog,
    pub drivers: DriverDirectory,
    pub reservations: ReservationService,
    pub password_resets: PasswordResetService,
    pub suggestions: SuggestionService,
    pub geocoding: GeocodingClient,
    pub locations: LocationRegistry,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire every service to the same store and clock.
    pub fn new(config: Config, db: Db, clock: Arc<dyn Clock>) -> Self {
        let offset = config.local_offset();
        let audit = AuditLog::new(db.clone(), clock.clone(), offset);
        let drivers = DriverDirectory::new(db.clone(), clock.clone(), audit.clone());
        let reservations = ReservationService::new(
            db.clone(),
            clock.clone(),
            offset,
            audit.clone(),
            drivers.clone(),
        );
        let password_resets = PasswordResetService::new(db.clone(), clock.clone(), audit.clone());
        let suggestions = SuggestionService::new(db.clone(), clock.clone());
        let geocoding = GeocodingClient::new(
            config.geoapify_base_url.clone(),
            config.geoapify_api_key.clone(),
        );

        Self {
            config,
            db,
            audit,
            drivers,
            reservations,
            password_resets,
            suggestions,
            geocoding,
            locations: LocationRegistry::default(),
            clock,
        }
    }
}
