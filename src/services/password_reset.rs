// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password reset requests, handled by hand from the admin panel.

use std::sync::Arc;

use crate::db::{collections, Db};
use crate::error::{AppError, Result};
use crate::models::{AuditContext, AuditKind, Driver, PasswordResetRequest};
use crate::services::{AuditLog, Clock};

#[derive(Clone)]
pub struct PasswordResetService {
    db: Db,
    clock: Arc<dyn Clock>,
    audit: AuditLog,
}

impl PasswordResetService {
    pub fn new(db: Db, clock: Arc<dyn Clock>, audit: AuditLog) -> Self {
        Self { db, clock, audit }
    }

    /// File a reset request.
    ///
    /// Returns `Ok(None)` without storing anything when no driver has both
    /// this username and email, so callers can't discover which accounts
    /// exist. A second request while one is pending returns the pending one.
    pub fn request(&self, username: &str, email: &str) -> Result<Option<PasswordResetRequest>> {
        let known = self
            .db
            .read::<Driver>(collections::DRIVERS)
            .iter()
            .any(|d| d.username == username && d.email == email);
        if !known {
            tracing::debug!(username, "Password reset for unknown account ignored");
            return Ok(None);
        }

        let candidate = PasswordResetRequest {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            requested_at: self.clock.now(),
            approved: false,
        };

        let (request, created) = self.db.update::<PasswordResetRequest, _, _>(
            collections::PASSWORD_RESET_REQUESTS,
            |requests| {
                if let Some(pending) = requests
                    .iter()
                    .find(|r| r.username == username && !r.approved)
                {
                    return Ok((pending.clone(), false));
                }
                requests.push(candidate.clone());
                Ok((candidate, true))
            },
        )?;

        if created {
            self.audit.record(
                AuditKind::PasswordResetRequested,
                username,
                AuditContext::driver(username),
            );
            tracing::info!(username, "Password reset requested");
        }
        Ok(Some(request))
    }

    /// All requests, oldest first.
    pub fn list(&self) -> Vec<PasswordResetRequest> {
        let mut requests: Vec<PasswordResetRequest> =
            self.db.read(collections::PASSWORD_RESET_REQUESTS);
        requests.sort_by_key(|r| r.requested_at);
        requests
    }

    pub fn approve(&self, id: &str) -> Result<PasswordResetRequest> {
        let request = self.db.update::<PasswordResetRequest, _, _>(
            collections::PASSWORD_RESET_REQUESTS,
            |requests| {
                let request = requests
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| not_found(id))?;
                request.approved = true;
                Ok(request.clone())
            },
        )?;

        self.audit.record(
            AuditKind::PasswordResetApproved,
            "admin",
            AuditContext::driver(&request.username),
        );
        Ok(request)
    }

    /// Drop a request from the queue.
    pub fn reject(&self, id: &str) -> Result<PasswordResetRequest> {
        let request = self.db.update::<PasswordResetRequest, _, _>(
            collections::PASSWORD_RESET_REQUESTS,
            |requests| {
                let pos = requests
                    .iter()
                    .position(|r| r.id == id)
                    .ok_or_else(|| not_found(id))?;
                Ok(requests.remove(pos))
            },
        )?;

        self.audit.record(
            AuditKind::PasswordResetRejected,
            "admin",
            AuditContext::driver(&request.username),
        );
        Ok(request)
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Password reset request {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::drivers::tests::new_driver;
    use crate::services::{DriverDirectory, ManualClock};
    use chrono::{FixedOffset, TimeZone, Utc};

    fn setup() -> (PasswordResetService, DriverDirectory) {
        let db = Db::in_memory();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap(),
        ));
        let audit = AuditLog::new(db.clone(), clock.clone(), FixedOffset::east_opt(0).unwrap());
        let drivers = DriverDirectory::new(db.clone(), clock.clone(), audit.clone());
        (PasswordResetService::new(db, clock, audit), drivers)
    }

    #[test]
    fn test_unknown_account_creates_nothing() {
        let (resets, drivers) = setup();
        drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();

        assert!(resets
            .request("juangarcia", "other@example.com")
            .unwrap()
            .is_none());
        assert!(resets.request("nobody", "juan@example.com").unwrap().is_none());
        assert!(resets.list().is_empty());
    }

    #[test]
    fn test_request_approve_reject() {
        let (resets, drivers) = setup();
        drivers
            .register(new_driver("juangarcia", "juan@example.com"))
            .unwrap();

        let first = resets
            .request("juangarcia", "juan@example.com")
            .unwrap()
            .unwrap();
        let again = resets
            .request("juangarcia", "juan@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(resets.list().len(), 1);

        assert!(resets.approve(&first.id).unwrap().approved);

        let second = resets
            .request("juangarcia", "juan@example.com")
            .unwrap()
            .unwrap();
        assert_ne!(second.id, first.id);

        resets.reject(&second.id).unwrap();
        assert_eq!(resets.list().len(), 1);
        assert!(matches!(
            resets.reject(&second.id),
            Err(AppError::NotFound(_))
        ));
    }
}
