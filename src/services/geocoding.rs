// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geoapify client for reverse/forward geocoding and route estimates.
//!
//! Every call degrades to a fallback value instead of failing: a missing API
//! key, a network error or an unexpected response all produce the fallback,
//! logged at `warn`.

use geo::{Coord, Distance, Haversine, LineString, MultiLineString, Point};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Coordinates;

/// Address shown when a position can't be resolved.
pub const UNKNOWN_ADDRESS: &str = "Location unavailable";

/// How many intermediate points a route keeps for map animation.
pub const INTERMEDIATE_WAYPOINTS: usize = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReverseGeocode {
    pub address: String,
    pub formatted: String,
}

impl ReverseGeocode {
    fn unavailable() -> Self {
        Self {
            address: UNKNOWN_ADDRESS.to_string(),
            formatted: UNKNOWN_ADDRESS.to_string(),
        }
    }
}

/// Driving route summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub time_minutes: f64,
    /// A handful of points along the route, not the full geometry
    pub waypoints: Vec<Coordinates>,
    /// Full geometry, Google polyline encoding at precision 5
    pub polyline: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    lat: Option<f64>,
    lon: Option<f64>,
    formatted: Option<String>,
    address_line1: Option<String>,
}

/// Errors inside the client. Never leave this module.
#[derive(Debug, thiserror::Error)]
enum GeocodingError {
    #[error("no API key configured")]
    NoApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse route: {0}")]
    Route(String),

    #[error("no result")]
    Empty,
}

#[derive(Clone)]
pub struct GeocodingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeocodingClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Address for a position, or "Location unavailable".
    pub async fn reverse(&self, at: Coordinates) -> ReverseGeocode {
        match self.try_reverse(at).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, lat = at.lat, lon = at.lon, "Reverse geocoding failed");
                ReverseGeocode::unavailable()
            }
        }
    }

    /// Coordinates for free-text address.
    pub async fn forward(&self, text: &str) -> Option<Coordinates> {
        match self.try_forward(text).await {
            Ok(found) => Some(found),
            Err(e) => {
                tracing::warn!(error = %e, "Forward geocoding failed");
                None
            }
        }
    }

    /// Driving route between two positions. Zeroed on failure.
    pub async fn directions(&self, from: Coordinates, to: Coordinates) -> RouteEstimate {
        match self.try_directions(from, to).await {
            Ok(route) => route,
            Err(e) => {
                tracing::warn!(error = %e, "Directions lookup failed");
                RouteEstimate::default()
            }
        }
    }

    /// Route between two free-text addresses.
    pub async fn directions_between(&self, from: &str, to: &str) -> RouteEstimate {
        if self.api_key.is_none() {
            return RouteEstimate::default();
        }
        let (Some(from), Some(to)) = tokio::join!(self.forward(from), self.forward(to)) else {
            return RouteEstimate::default();
        };
        self.directions(from, to).await
    }

    fn api_key(&self) -> Result<&str, GeocodingError> {
        self.api_key.as_deref().ok_or(GeocodingError::NoApiKey)
    }

    async fn try_reverse(&self, at: Coordinates) -> Result<ReverseGeocode, GeocodingError> {
        let url = format!(
            "{}/v1/geocode/reverse?lat={}&lon={}&format=json&apiKey={}",
            self.base_url,
            at.lat,
            at.lon,
            urlencoding::encode(self.api_key()?)
        );
        let response: GeocodeResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let first = response.results.into_iter().next().ok_or(GeocodingError::Empty)?;
        let formatted = first.formatted.ok_or(GeocodingError::Empty)?;
        Ok(ReverseGeocode {
            address: first.address_line1.unwrap_or_else(|| formatted.clone()),
            formatted,
        })
    }

    async fn try_forward(&self, text: &str) -> Result<Coordinates, GeocodingError> {
        let url = format!(
            "{}/v1/geocode/search?text={}&format=json&limit=1&apiKey={}",
            self.base_url,
            urlencoding::encode(text),
            urlencoding::encode(self.api_key()?)
        );
        let response: GeocodeResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .results
            .into_iter()
            .find_map(|r| Some(Coordinates { lat: r.lat?, lon: r.lon? }))
            .ok_or(GeocodingError::Empty)
    }

    async fn try_directions(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> Result<RouteEstimate, GeocodingError> {
        let url = format!(
            "{}/v1/routing?waypoints={},{}|{},{}&mode=drive&apiKey={}",
            self.base_url,
            from.lat,
            from.lon,
            to.lat,
            to.lon,
            urlencoding::encode(self.api_key()?)
        );
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_route(&body).map_err(GeocodingError::Route)
    }
}

/// Parse a routing response (a GeoJSON FeatureCollection whose first feature
/// carries `distance` in meters, `time` in seconds and the route geometry).
///
/// When `distance` is missing it is measured along the geometry.
pub fn parse_route(body: &str) -> Result<RouteEstimate, String> {
    let geojson: GeoJson = body.parse().map_err(|e: geojson::Error| e.to_string())?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err("expected a FeatureCollection".to_string());
    };
    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or_else(|| "no route feature".to_string())?;

    let distance_m = feature.property("distance").and_then(|v| v.as_f64());
    let time_s = feature
        .property("time")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);

    let geometry = feature
        .geometry
        .ok_or_else(|| "route has no geometry".to_string())?;
    let lines = to_multi_line(geometry.value)?;
    let coords: Vec<Coord<f64>> = lines.0.iter().flat_map(|l| l.0.iter().copied()).collect();

    let distance_m = distance_m.unwrap_or_else(|| path_length_m(&coords));
    let waypoints: Vec<Coordinates> = coords
        .iter()
        .map(|c| Coordinates { lat: c.y, lon: c.x })
        .collect();

    Ok(RouteEstimate {
        distance_km: distance_m / 1000.0,
        time_minutes: time_s / 60.0,
        waypoints: intermediate_waypoints(&waypoints, INTERMEDIATE_WAYPOINTS),
        polyline: polyline::encode_coordinates(coords, 5).map_err(|e| e.to_string())?,
    })
}

fn to_multi_line(value: geojson::Value) -> Result<MultiLineString<f64>, String> {
    use std::convert::TryInto;

    let multi: Result<MultiLineString<f64>, _> = value.clone().try_into();
    if let Ok(multi) = multi {
        return Ok(multi);
    }

    let line: Result<LineString<f64>, _> = value.try_into();
    line.map(|l| MultiLineString::new(vec![l]))
        .map_err(|_| "unsupported route geometry".to_string())
}

/// Great-circle length of a path in meters.
pub fn path_length_m(coords: &[Coord<f64>]) -> f64 {
    coords
        .windows(2)
        .map(|w| Haversine.distance(Point::from(w[0]), Point::from(w[1])))
        .sum()
}

/// Pick `count` evenly spaced interior points of `waypoints`.
///
/// Endpoints are never included. Short routes may return fewer points.
pub fn intermediate_waypoints(waypoints: &[Coordinates], count: usize) -> Vec<Coordinates> {
    if waypoints.len() < 2 || count == 0 {
        return Vec::new();
    }

    let step = (waypoints.len() - 1) / (count + 1);
    if step == 0 {
        return waypoints[1..waypoints.len() - 1].to_vec();
    }

    (1..=count)
        .map(|i| i * step)
        .filter(|&index| index < waypoints.len() - 1)
        .map(|index| waypoints[index])
        .collect()
}
