// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use chrono::{TimeZone, Utc};
use cityride::config::Config;
use cityride::db::Db;
use cityride::routes::create_router;
use cityride::services::ManualClock;
use cityride::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

/// Phone used by the rider in most tests, and its query-string form.
#[allow(dead_code)]
pub const RIDER_PHONE: &str = "+34612345678";
#[allow(dead_code)]
pub const RIDER_PHONE_QUERY: &str = "%2B34612345678";

/// Create a test app over an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let (app, state, _) = create_test_app_with_clock();
    (app, state)
}

/// Create a test app whose clock starts at 2025-01-16 09:00 UTC and only
/// moves when the test sets it.
#[allow(dead_code)]
pub fn create_test_app_with_clock() -> (axum::Router, Arc<AppState>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap(),
    ));
    let state = Arc::new(AppState::new(
        Config::default(),
        Db::in_memory(),
        clock.clone(),
    ));
    (create_router(state.clone()), state, clock)
}

/// Build a JSON request.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a body-less request with an optional bearer token.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A booking form for 2025-01-16 at `time`.
#[allow(dead_code)]
pub fn reservation_form(phone: &str, time: &str) -> Value {
    json!({
        "name": "Ana Pérez",
        "phone": phone,
        "pickupDate": "2025-01-16",
        "pickupTime": time,
        "pickupLocation": "Calle Mayor de Triana 1, Las Palmas",
        "destination": "Aeropuerto de Gran Canaria",
        "adults": 2,
        "children": 1,
        "pmr": 0,
        "observations": "Llevo una maleta grande"
    })
}

/// A registration form for a driver in Las Palmas.
#[allow(dead_code)]
pub fn driver_form(username: &str, email: &str) -> Value {
    json!({
        "name": "Juan García López",
        "username": username,
        "email": email,
        "phone": "+34612000111",
        "password": "password123",
        "confirmPassword": "password123",
        "license": "LIC001234",
        "island": "Gran Canaria",
        "municipality": "Las Palmas de Gran Canaria",
        "vehicleModel": "Toyota Prius 2023",
        "vehiclePlate": "AB-123-CD",
        "seats": 4,
        "pmrAdapted": true
    })
}

/// Register a driver and log in. Returns the session token.
#[allow(dead_code)]
pub async fn register_and_login(app: &axum::Router, username: &str, email: &str) -> String {
    use tower::ServiceExt;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", driver_form(username, email)))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": email, "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Book a reservation through the API and return its id.
#[allow(dead_code)]
pub async fn book(app: &axum::Router, phone: &str, time: &str) -> String {
    use tower::ServiceExt;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reservations",
            reservation_form(phone, time),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);

    body_json(response).await["id"].as_str().unwrap().to_string()
}
