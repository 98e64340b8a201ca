// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel routes.

use crate::error::{AppError, Result};
use crate::models::{AdminLogView, DriverProfile, PasswordResetRequest, Reservation, Suggestion};
use crate::services::LogQuery;
use crate::time_utils::parse_any_date;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

/// Actor recorded in the audit log for admin actions.
const ADMIN_ACTOR: &str = "admin";

/// Admin routes. The admin token check is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/reservations", get(list_reservations))
        .route("/admin/reservations/{id}", delete(trash_reservation))
        .route("/admin/reservations/{id}/cancel", post(cancel_reservation))
        .route(
            "/admin/reservations/{id}/complete",
            post(complete_reservation),
        )
        .route("/admin/trash", get(list_trash))
        .route("/admin/trash/{id}/restore", post(restore_reservation))
        .route("/admin/drivers", get(list_drivers))
        .route("/admin/drivers/{username}/ban", post(ban_driver))
        .route("/admin/drivers/{username}/unban", post(unban_driver))
        .route("/admin/logs", get(list_logs))
        .route("/admin/password-resets", get(list_password_resets))
        .route(
            "/admin/password-resets/{id}/approve",
            post(approve_password_reset),
        )
        .route(
            "/admin/password-resets/{id}/reject",
            post(reject_password_reset),
        )
        .route("/admin/suggestions", get(list_suggestions))
}

#[derive(Deserialize, Default)]
struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
}

fn parse_date_param(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_any_date(raw).map(Some).ok_or_else(|| {
            AppError::validation(format!(
                "Invalid '{}' parameter: expected YYYY-MM-DD or dd/mm/yyyy",
                name
            ))
        }),
    }
}

// ─── Reservations ────────────────────────────────────────────

#[derive(Deserialize)]
struct ReservationsQuery {
    date: Option<String>,
    q: Option<String>,
}

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReservationsQuery>,
) -> Result<Json<Vec<Reservation>>> {
    let date = parse_date_param("date", query.date.as_deref())?;
    Ok(Json(state.reservations.list(date, query.q.as_deref())))
}

async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.reservations.cancel(&id, ADMIN_ACTOR)?))
}

async fn complete_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.reservations.complete(&id, ADMIN_ACTOR)?))
}

async fn trash_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.reservations.move_to_trash(&id)?))
}

async fn list_trash(State(state): State<Arc<AppState>>) -> Json<Vec<Reservation>> {
    Json(state.reservations.list_trash())
}

async fn restore_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.reservations.restore(&id)?))
}

// ─── Drivers ─────────────────────────────────────────────────

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<DriverProfile>> {
    let drivers = state.drivers.list(query.q.as_deref());
    Json(drivers.iter().map(DriverProfile::from).collect())
}

async fn ban_driver(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<DriverProfile>> {
    let driver = state.drivers.set_banned(&username, true)?;
    state.locations.remove(&username);
    Ok(Json(DriverProfile::from(&driver)))
}

async fn unban_driver(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<DriverProfile>> {
    let driver = state.drivers.set_banned(&username, false)?;
    Ok(Json(DriverProfile::from(&driver)))
}

// ─── Audit log ───────────────────────────────────────────────

#[derive(Deserialize)]
struct LogsQuery {
    q: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<AdminLogView>>> {
    let log_query = LogQuery {
        search: query.q,
        from: parse_date_param("from", query.from.as_deref())?,
        to: parse_date_param("to", query.to.as_deref())?,
    };
    Ok(Json(state.audit.query(&log_query)))
}

// ─── Password resets ─────────────────────────────────────────

async fn list_password_resets(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<PasswordResetRequest>> {
    Json(state.password_resets.list())
}

async fn approve_password_reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PasswordResetRequest>> {
    Ok(Json(state.password_resets.approve(&id)?))
}

async fn reject_password_reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PasswordResetRequest>> {
    Ok(Json(state.password_resets.reject(&id)?))
}

// ─── Suggestions ─────────────────────────────────────────────

async fn list_suggestions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Suggestion>> {
    Json(state.suggestions.list(query.q.as_deref()))
}
