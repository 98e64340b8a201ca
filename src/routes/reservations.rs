// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public rider routes: book, look up, check, track, cancel, suggest.

use crate::error::{AppError, Result};
use crate::models::reservation::is_valid_phone;
use crate::models::{DriverContact, NewReservation, NewSuggestion, Reservation, Suggestion};
use crate::services::{start_tracking, Disclosure, RouteEstimate, TRACKING_INTERVAL};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/reservations",
            post(create_reservation).get(list_by_phone),
        )
        .route("/api/reservations/check", get(check_reservation))
        .route("/api/reservations/track", get(track_driver))
        .route("/api/reservations/cancel-by-phone", post(cancel_by_phone))
        .route("/api/reservations/{id}/cancel", post(cancel_reservation))
        .route("/api/suggestions", post(add_suggestion))
}

#[derive(Deserialize)]
struct PhoneQuery {
    phone: String,
}

#[derive(Deserialize)]
struct PhoneBody {
    phone: String,
}

fn require_phone(phone: &str) -> Result<&str> {
    let phone = phone.trim();
    if !is_valid_phone(phone) {
        return Err(AppError::validation(
            "Phone must be in international format, e.g. +34612345678",
        ));
    }
    Ok(phone)
}

// ─── Booking ─────────────────────────────────────────────────

async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewReservation>,
) -> Result<(StatusCode, Json<Reservation>)> {
    let reservation = state.reservations.create(input)?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Active reservations for a phone, newest first.
async fn list_by_phone(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<Vec<Reservation>>> {
    let phone = require_phone(&query.phone)?;
    Ok(Json(state.reservations.find_active_by_phone(phone)))
}

// ─── Disclosure ──────────────────────────────────────────────

/// What the rider's status page shows.
#[derive(Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
enum CheckResponse {
    NoReservation,
    NotYetWindow,
    NoDriverAssigned {
        reservation: Reservation,
    },
    Disclosed {
        reservation: Reservation,
        driver: DriverContact,
        /// Pickup to destination
        eta: RouteEstimate,
    },
}

async fn check_reservation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<CheckResponse>> {
    let phone = require_phone(&query.phone)?;

    let response = match state.reservations.check(phone) {
        Disclosure::NoReservation => CheckResponse::NoReservation,
        Disclosure::NotYetWindow => CheckResponse::NotYetWindow,
        Disclosure::NoDriverAssigned { reservation } => {
            CheckResponse::NoDriverAssigned { reservation }
        }
        Disclosure::Disclosed {
            reservation,
            driver,
        } => {
            let eta = state
                .geocoding
                .directions_between(&reservation.pickup_location, &reservation.destination)
                .await;
            CheckResponse::Disclosed {
                driver: DriverContact::from(&driver),
                reservation,
                eta,
            }
        }
    };

    Ok(Json(response))
}

/// Server-sent events with the assigned driver's position.
///
/// Only available while the driver is disclosed. Disclosure is checked again
/// on every poll, and the stream ends once the pickup passes, the
/// reservation is cancelled or another driver takes it. The poller also stops
/// when the client goes away.
async fn track_driver(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PhoneQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let phone = require_phone(&query.phone)?;

    let Disclosure::Disclosed { driver, reservation } = state.reservations.check(phone) else {
        return Err(AppError::NotFound(
            "No driver to track for this phone".to_string(),
        ));
    };

    tracing::info!(sku = %reservation.sku, username = %driver.username, "Rider tracking driver");

    let reservations = state.reservations.clone();
    let phone = phone.to_string();
    let reservation_id = reservation.id;
    let username = driver.username.clone();
    let permitted =
        move || reservations.still_disclosed(&phone, &reservation_id, &username);

    let stream = start_tracking(
        state.locations.clone(),
        driver.username,
        TRACKING_INTERVAL,
        permitted,
    )
    .into_stream()
        .map(|location| Event::default().event("location").json_data(location));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ─── Cancellation ────────────────────────────────────────────

async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<PhoneBody>,
) -> Result<Json<Reservation>> {
    let phone = require_phone(&body.phone)?;
    Ok(Json(state.reservations.cancel_as_rider(&id, phone)?))
}

#[derive(Serialize)]
struct CancelByPhoneResponse {
    cancelled: usize,
    reservations: Vec<Reservation>,
}

async fn cancel_by_phone(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PhoneBody>,
) -> Result<Json<CancelByPhoneResponse>> {
    let phone = require_phone(&body.phone)?;
    let reservations = state.reservations.cancel_all_active_for_phone(phone)?;
    Ok(Json(CancelByPhoneResponse {
        cancelled: reservations.len(),
        reservations,
    }))
}

// ─── Suggestions ─────────────────────────────────────────────

async fn add_suggestion(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewSuggestion>,
) -> Result<(StatusCode, Json<Suggestion>)> {
    let suggestion = state.suggestions.add(input)?;
    Ok((StatusCode::CREATED, Json(suggestion)))
}
