// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Driver directory: registration, authentication and lookups.

use std::sync::Arc;
use validator::Validate;

use crate::db::{collections, Db};
use crate::error::{AppError, DuplicateField, Result};
use crate::models::islands;
use crate::models::reservation::is_valid_phone;
use crate::models::{AuditContext, AuditKind, Driver, NewDriver};
use crate::services::password::{hash_password, verify_against_dummy, verify_password};
use crate::services::{AuditLog, Clock};

#[derive(Clone)]
pub struct DriverDirectory {
    db: Db,
    clock: Arc<dyn Clock>,
    audit: AuditLog,
}

impl DriverDirectory {
    pub fn new(db: Db, clock: Arc<dyn Clock>, audit: AuditLog) -> Self {
        Self { db, clock, audit }
    }

    /// Register a new driver.
    ///
    /// Username is checked before email, so a form colliding on both reports
    /// the username. The password is hashed before anything is stored.
    pub fn register(&self, input: NewDriver) -> Result<Driver> {
        input.validate()?;

        if !is_valid_phone(&input.phone) {
            return Err(AppError::validation(
                "Phone must be in international format, e.g. +34612345678",
            ));
        }
        if let Some(confirm) = &input.confirm_password {
            if confirm != &input.password {
                return Err(AppError::validation("Passwords do not match"));
            }
        }
        if !islands::is_valid_municipality(&input.island, &input.municipality) {
            return Err(AppError::validation(format!(
                "Municipality '{}' is not on island '{}'",
                input.municipality, input.island
            )));
        }

        // Cheap checks first so a duplicate doesn't pay for hashing
        let existing = self.db.read::<Driver>(collections::DRIVERS);
        check_unique(&existing, &input.username, &input.email)?;

        let password_hash = hash_password(&input.password)?;
        let driver = Driver {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            username: input.username,
            email: input.email,
            phone: input.phone,
            password_hash,
            license: input.license,
            island: input.island,
            municipality: input.municipality,
            vehicle_model: input.vehicle_model,
            vehicle_plate: input.vehicle_plate,
            seats: input.seats,
            pmr_adapted: input.pmr_adapted,
            registered_at: self.clock.now(),
            banned: false,
        };

        self.db.update::<Driver, _, _>(collections::DRIVERS, |drivers| {
            // Re-check against what is stored right before the write
            check_unique(drivers, &driver.username, &driver.email)?;
            drivers.push(driver.clone());
            Ok(())
        })?;

        self.audit.record(
            AuditKind::DriverRegistration,
            &driver.username,
            AuditContext::driver(&driver.username),
        );

        tracing::info!(username = %driver.username, "Driver registered");
        Ok(driver)
    }

    /// Check an email/password pair.
    ///
    /// Unknown email, wrong password and banned account all produce the same
    /// `InvalidCredentials` error.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Driver> {
        let driver = self
            .db
            .read::<Driver>(collections::DRIVERS)
            .into_iter()
            .find(|d| d.email == email);

        let Some(driver) = driver else {
            verify_against_dummy(password);
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &driver.password_hash) || driver.banned {
            tracing::debug!(username = %driver.username, "Driver login rejected");
            return Err(AppError::InvalidCredentials);
        }

        self.audit.record(
            AuditKind::DriverLogin,
            &driver.username,
            AuditContext::driver(&driver.username),
        );

        Ok(driver)
    }

    /// Look a driver up by username, banned or not.
    pub fn find_by_username(&self, username: &str) -> Option<Driver> {
        self.db
            .read::<Driver>(collections::DRIVERS)
            .into_iter()
            .find(|d| d.username == username)
    }

    /// Look up a driver who may currently work: exists and is not banned.
    pub fn find_active(&self, username: &str) -> Option<Driver> {
        self.find_by_username(username).filter(|d| !d.banned)
    }

    /// All drivers, optionally filtered by a case-insensitive search over
    /// name, username, email, plate and municipality.
    pub fn list(&self, search: Option<&str>) -> Vec<Driver> {
        let drivers = self.db.read::<Driver>(collections::DRIVERS);
        let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) else {
            return drivers;
        };
        let needle = needle.to_lowercase();

        drivers
            .into_iter()
            .filter(|d| {
                [
                    &d.name,
                    &d.username,
                    &d.email,
                    &d.vehicle_plate,
                    &d.municipality,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Ban or unban a driver. Banned drivers cannot log in or accept rides.
    pub fn set_banned(&self, username: &str, banned: bool) -> Result<Driver> {
        let driver = self.db.update::<Driver, _, _>(collections::DRIVERS, |drivers| {
            let driver = drivers
                .iter_mut()
                .find(|d| d.username == username)
                .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", username)))?;
            driver.banned = banned;
            Ok(driver.clone())
        })?;

        let kind = if banned {
            AuditKind::DriverBanned
        } else {
            AuditKind::DriverUnbanned
        };
        self.audit.record(kind, "admin", AuditContext::driver(username));

        tracing::info!(username, banned, "Driver ban flag updated");
        Ok(driver)
    }
}

fn check_unique(drivers: &[Driver], username: &str, email: &str) -> Result<()> {
    if drivers.iter().any(|d| d.username == username) {
        return Err(AppError::Duplicate(DuplicateField::Username));
    }
    if drivers.iter().any(|d| d.email == email) {
        return Err(AppError::Duplicate(DuplicateField::Email));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::ManualClock;
    use chrono::{FixedOffset, TimeZone, Utc};

    pub(crate) fn new_driver(username: &str, email: &str) -> NewDriver {
        NewDriver {
            name: "Juan García López".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            phone: "+34612345678".to_string(),
            password: "password123".to_string(),
            confirm_password: None,
            license: "LIC001234".to_string(),
            island: "Gran Canaria".to_string(),
            municipality: "Las Palmas de Gran Canaria".to_string(),
            vehicle_model: "Toyota Prius 2023".to_string(),
            vehicle_plate: "AB-123-CD".to_string(),
            seats: 4,
            pmr_adapted: true,
        }
    }

    fn directory() -> (DriverDirectory, Db) {
        let db = Db::in_memory();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap(),
        ));
        let audit = AuditLog::new(db.clone(), clock.clone(), FixedOffset::east_opt(0).unwrap());
        (DriverDirectory::new(db.clone(), clock, audit), db)
    }

    #[test]
    fn test_register_stores_hash_not_plaintext() {
        let (drivers, db) = directory();

        let driver = drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();

        assert_ne!(driver.password_hash, "password123");
        let raw = db.read::<serde_json::Value>(collections::DRIVERS);
        assert!(!raw[0].to_string().contains("password123"));
    }

    #[test]
    fn test_duplicate_username_checked_before_email() {
        let (drivers, _) = directory();
        drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();

        let err = drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(DuplicateField::Username)));

        let err = drivers
            .register(new_driver("otro", "juan@example.com"))
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(DuplicateField::Email)));

        assert_eq!(drivers.list(None).len(), 1);
    }

    #[test]
    fn test_uniqueness_is_case_sensitive() {
        let (drivers, _) = directory();
        drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();

        assert!(drivers
            .register(new_driver("JuanGarcia", "Juan@example.com"))
            .is_ok());
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let (drivers, _) = directory();

        let mut input = new_driver("juangarcia", "juan@example.com");
        input.municipality = "La Orotava".to_string();
        assert!(matches!(
            drivers.register(input),
            Err(AppError::Validation(_))
        ));

        let mut input = new_driver("juangarcia", "juan@example.com");
        input.seats = 0;
        assert!(matches!(
            drivers.register(input),
            Err(AppError::Validation(_))
        ));

        let mut input = new_driver("juangarcia", "juan@example.com");
        input.confirm_password = Some("different1".to_string());
        assert!(matches!(
            drivers.register(input),
            Err(AppError::Validation(_))
        ));

        assert!(drivers.list(None).is_empty());
    }

    #[test]
    fn test_authenticate_failures_are_indistinguishable() {
        let (drivers, _) = directory();
        drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();

        let unknown = drivers
            .authenticate("nobody@example.com", "password123")
            .unwrap_err();
        let wrong = drivers
            .authenticate("juan@example.com", "wrong-password")
            .unwrap_err();

        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());

        let driver = drivers
            .authenticate("juan@example.com", "password123")
            .unwrap();
        assert_eq!(driver.username, "juangarcia");
    }

    #[test]
    fn test_banned_driver_cannot_log_in() {
        let (drivers, _) = directory();
        drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();

        drivers.set_banned("juangarcia", true).unwrap();

        assert!(matches!(
            drivers.authenticate("juan@example.com", "password123"),
            Err(AppError::InvalidCredentials)
        ));
        assert!(drivers.find_by_username("juangarcia").is_some());
        assert!(drivers.find_active("juangarcia").is_none());
    }
}
