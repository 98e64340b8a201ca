//! Driver model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Driver record stored in the `taxi_drivers` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    /// Unique login handle, referenced by accepted reservations
    pub username: String,
    /// Unique, used to log in
    pub email: String,
    pub phone: String,
    /// Argon2 PHC string; never leaves the server
    pub password_hash: String,
    /// Taxi license number
    pub license: String,
    pub island: String,
    pub municipality: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub seats: u32,
    /// Vehicle adapted for reduced-mobility passengers
    pub pmr_adapted: bool,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub banned: bool,
}

/// Driver fields safe to show to riders, admins and the driver itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfile {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub license: String,
    pub island: String,
    pub municipality: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub seats: u32,
    pub pmr_adapted: bool,
    pub registered_at: DateTime<Utc>,
    pub banned: bool,
}

impl From<&Driver> for DriverProfile {
    fn from(driver: &Driver) -> Self {
        Self {
            id: driver.id.clone(),
            name: driver.name.clone(),
            username: driver.username.clone(),
            email: driver.email.clone(),
            phone: driver.phone.clone(),
            license: driver.license.clone(),
            island: driver.island.clone(),
            municipality: driver.municipality.clone(),
            vehicle_model: driver.vehicle_model.clone(),
            vehicle_plate: driver.vehicle_plate.clone(),
            seats: driver.seats,
            pmr_adapted: driver.pmr_adapted,
            registered_at: driver.registered_at,
            banned: driver.banned,
        }
    }
}

/// What a rider sees once the disclosure window opens.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverContact {
    pub name: String,
    pub phone: String,
    pub license: String,
    pub municipality: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub seats: u32,
    pub pmr_adapted: bool,
}

impl From<&Driver> for DriverContact {
    fn from(driver: &Driver) -> Self {
        Self {
            name: driver.name.clone(),
            phone: driver.phone.clone(),
            license: driver.license.clone(),
            municipality: driver.municipality.clone(),
            vehicle_model: driver.vehicle_model.clone(),
            vehicle_plate: driver.vehicle_plate.clone(),
            seats: driver.seats,
            pmr_adapted: driver.pmr_adapted,
        }
    }
}

fn default_seats() -> u32 {
    4
}

/// Registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDriver {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub phone: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Checked against `password` when present
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[validate(length(min = 1, message = "License number is required"))]
    pub license: String,
    pub island: String,
    pub municipality: String,
    #[validate(length(min = 1, message = "Vehicle model is required"))]
    pub vehicle_model: String,
    #[validate(length(min = 1, message = "Vehicle plate is required"))]
    pub vehicle_plate: String,
    #[serde(default = "default_seats")]
    #[validate(range(min = 1, message = "Seats must be at least 1"))]
    pub seats: u32,
    #[serde(default)]
    pub pmr_adapted: bool,
}
