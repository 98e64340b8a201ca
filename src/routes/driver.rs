// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for logged-in drivers.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthDriver;
use crate::models::{Coordinates, DriverLocation, DriverProfile, Reservation};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Driver routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/driver/me", get(get_me))
        .route("/api/driver/requests", get(open_requests))
        .route("/api/driver/reservations", get(my_reservations))
        .route(
            "/api/driver/reservations/{id}/accept",
            post(accept_reservation),
        )
        .route(
            "/api/driver/reservations/{id}/complete",
            post(complete_reservation),
        )
        .route("/api/driver/location", post(publish_location))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthDriver>,
) -> Result<Json<DriverProfile>> {
    let driver = state
        .drivers
        .find_by_username(&auth.username)
        .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", auth.username)))?;
    Ok(Json(DriverProfile::from(&driver)))
}

/// Unclaimed reservations with a pickup still ahead.
async fn open_requests(State(state): State<Arc<AppState>>) -> Json<Vec<Reservation>> {
    Json(state.reservations.open_requests())
}

async fn my_reservations(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthDriver>,
) -> Json<Vec<Reservation>> {
    Json(state.reservations.accepted_by(&auth.username))
}

async fn accept_reservation(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthDriver>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.reservations.accept(&id, &auth.username)?))
}

async fn complete_reservation(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthDriver>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    Ok(Json(
        state.reservations.complete_by_driver(&id, &auth.username)?,
    ))
}

#[derive(Deserialize)]
struct LocationUpdate {
    lat: f64,
    lon: f64,
    /// Resolve the position to an address before storing it
    #[serde(default)]
    resolve_address: bool,
}

async fn publish_location(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthDriver>,
    Json(update): Json<LocationUpdate>,
) -> Result<Json<DriverLocation>> {
    let at = Coordinates {
        lat: update.lat,
        lon: update.lon,
    };
    if !at.is_valid() {
        return Err(AppError::validation("Coordinates out of range"));
    }

    let address = if update.resolve_address {
        Some(state.geocoding.reverse(at).await.formatted)
    } else {
        None
    };

    let location = DriverLocation {
        username: auth.username,
        lat: at.lat,
        lon: at.lon,
        address,
        updated_at: state.clock.now(),
    };
    state.locations.publish(location.clone());

    Ok(Json(location))
}
