// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Driver registration, login and password reset routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{DriverProfile, NewDriver};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/forgot-password", post(forgot_password))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewDriver>,
) -> Result<(StatusCode, Json<DriverProfile>)> {
    let driver = state.drivers.register(input)?;
    Ok((StatusCode::CREATED, Json(DriverProfile::from(&driver))))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    /// Same token as the cookie, for clients that send `Authorization`
    token: String,
    driver: DriverProfile,
}

/// Check credentials and start a session.
///
/// Every failure is the same 401 so the response never says whether the
/// email is registered.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let driver = state
        .drivers
        .authenticate(body.email.trim(), &body.password)?;

    let token = create_jwt(&driver.username, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let secure = !state.config.frontend_url.starts_with("http://");
    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build();

    tracing::info!(username = %driver.username, "Driver logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            driver: DriverProfile::from(&driver),
        }),
    ))
}

/// Clear the session cookie. Tokens sent by header just expire.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

#[derive(Deserialize)]
struct ForgotPasswordRequest {
    username: String,
    email: String,
}

#[derive(Serialize)]
struct ForgotPasswordResponse {
    message: &'static str,
}

/// Queue a reset request for the admin. The answer is the same whether or
/// not the account exists.
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<ForgotPasswordResponse>)> {
    state
        .password_resets
        .request(body.username.trim(), body.email.trim())?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ForgotPasswordResponse {
            message: "If the account exists, an administrator will review the request",
        }),
    ))
}
