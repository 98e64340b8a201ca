// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geocoding proxy and island lookup routes.

use crate::error::{AppError, Result};
use crate::models::{islands, Coordinates};
use crate::services::{ReverseGeocode, RouteEstimate};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/geolocation/reverse-geocode", post(reverse_geocode))
        .route("/api/directions", post(directions))
        .route("/api/islands", get(list_islands))
        .route("/api/islands/municipalities", get(list_municipalities))
}

fn checked(lat: f64, lon: f64) -> Result<Coordinates> {
    let at = Coordinates { lat, lon };
    if !at.is_valid() {
        return Err(AppError::validation("Coordinates out of range"));
    }
    Ok(at)
}

async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Json(at): Json<Coordinates>,
) -> Result<Json<ReverseGeocode>> {
    let at = checked(at.lat, at.lon)?;
    Ok(Json(state.geocoding.reverse(at).await))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectionsRequest {
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
}

async fn directions(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DirectionsRequest>,
) -> Result<Json<RouteEstimate>> {
    let from = checked(body.start_lat, body.start_lon)?;
    let to = checked(body.end_lat, body.end_lon)?;
    Ok(Json(state.geocoding.directions(from, to).await))
}

async fn list_islands() -> Json<&'static [&'static str]> {
    Json(islands::ISLANDS)
}

#[derive(Deserialize)]
struct IslandQuery {
    island: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MunicipalitiesResponse {
    pub island: String,
    pub municipalities: Vec<String>,
}

async fn list_municipalities(
    Query(query): Query<IslandQuery>,
) -> Result<Json<MunicipalitiesResponse>> {
    let municipalities = islands::municipalities(&query.island)
        .ok_or_else(|| AppError::NotFound(format!("Unknown island '{}'", query.island)))?;

    Ok(Json(MunicipalitiesResponse {
        island: query.island,
        municipalities: municipalities.iter().map(|m| m.to_string()).collect(),
    }))
}
