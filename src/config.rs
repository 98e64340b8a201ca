// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::path::PathBuf;

use crate::db::DEFAULT_QUOTA_BYTES;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Directory for the file store; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
    /// Largest serialized collection the store accepts
    pub store_quota_bytes: usize,
    /// Geoapify endpoint
    pub geoapify_base_url: String,
    /// Offset of the local time pickups are written in, in minutes east of UTC
    pub local_utc_offset_minutes: i32,

    // --- Secrets ---
    /// JWT signing key for driver sessions (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Bearer token for the admin panel
    pub admin_token: String,
    /// Geoapify API key; geocoding falls back when unset
    pub geoapify_api_key: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            data_dir: None,
            store_quota_bytes: DEFAULT_QUOTA_BYTES,
            geoapify_base_url: "https://api.geoapify.com".to_string(),
            local_utc_offset_minutes: 0,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            admin_token: "test_admin_token".to_string(),
            geoapify_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            data_dir: env::var("DATA_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            store_quota_bytes: parse_var("STORE_QUOTA_BYTES", DEFAULT_QUOTA_BYTES)?,
            geoapify_base_url: env::var("GEOAPIFY_BASE_URL")
                .unwrap_or_else(|_| "https://api.geoapify.com".to_string()),
            local_utc_offset_minutes: parse_var("LOCAL_UTC_OFFSET_MINUTES", 0)?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            admin_token: env::var("ADMIN_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ADMIN_TOKEN"))?,
            geoapify_api_key: env::var("GEOAPIFY_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    /// Fixed offset for local wall-clock time. Out-of-range values fall back
    /// to UTC.
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.local_utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| {
            tracing::warn!(
                minutes = self.local_utc_offset_minutes,
                "Invalid UTC offset, using UTC"
            );
            Utc.fix()
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
