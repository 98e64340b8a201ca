// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Admin audit log entries.
//!
//! Entries are stored as structured events. The human-readable message is
//! rendered when the log is read, in the `es-ES` display format.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::{format_display_date, format_display_time, to_local};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    DriverRegistration,
    DriverLogin,
    DriverBanned,
    DriverUnbanned,
    ReservationCreated,
    ReservationAccepted,
    ReservationCancelled,
    ReservationCompleted,
    ReservationTrashed,
    ReservationRestored,
    PasswordResetRequested,
    PasswordResetApproved,
    PasswordResetRejected,
}

/// Optional references attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_username: Option<String>,
}

impl AuditContext {
    pub fn reservation(sku: &str) -> Self {
        Self {
            reservation_sku: Some(sku.to_string()),
            ..Default::default()
        }
    }

    pub fn driver(username: &str) -> Self {
        Self {
            driver_username: Some(username.to_string()),
            ..Default::default()
        }
    }

    pub fn with_driver(mut self, username: &str) -> Self {
        self.driver_username = Some(username.to_string());
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }
}

/// Stored audit event (`admin_logs` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AuditKind,
    /// Who triggered the event: a driver username, "admin", or a rider phone
    pub actor: String,
    #[serde(default)]
    pub context: AuditContext,
    pub timestamp: DateTime<Utc>,
}

impl AdminLogEntry {
    /// Render the display message in the service's local time.
    pub fn render(&self, offset: FixedOffset) -> String {
        let local = to_local(self.timestamp, offset);
        let when = format!(
            "el {} a las {}",
            format_display_date(local),
            format_display_time(local)
        );
        let sku = self.context.reservation_sku.as_deref().unwrap_or("-");
        let driver = self
            .context
            .driver_username
            .as_deref()
            .unwrap_or(self.actor.as_str());

        match self.kind {
            AuditKind::DriverRegistration => {
                format!("El taxista {driver} se ha registrado {when}")
            }
            AuditKind::DriverLogin => format!("El taxista {driver} ha iniciado sesión {when}"),
            AuditKind::DriverBanned => format!("El taxista {driver} ha sido bloqueado {when}"),
            AuditKind::DriverUnbanned => {
                format!("El taxista {driver} ha sido desbloqueado {when}")
            }
            AuditKind::ReservationCreated => format!("Nueva reserva {sku} creada {when}"),
            AuditKind::ReservationAccepted => {
                format!("La reserva {sku} ha sido aceptada por {driver} {when}")
            }
            AuditKind::ReservationCancelled => {
                format!("La reserva {sku} ha sido cancelada {when}")
            }
            AuditKind::ReservationCompleted => {
                format!("La reserva {sku} ha sido completada {when}")
            }
            AuditKind::ReservationTrashed => {
                format!("La reserva {sku} se ha movido a la papelera {when}")
            }
            AuditKind::ReservationRestored => {
                format!("La reserva {sku} se ha restaurado de la papelera {when}")
            }
            AuditKind::PasswordResetRequested => {
                format!("El taxista {driver} ha solicitado restablecer su contraseña {when}")
            }
            AuditKind::PasswordResetApproved => {
                format!("Restablecimiento de contraseña de {driver} aprobado {when}")
            }
            AuditKind::PasswordResetRejected => {
                format!("Restablecimiento de contraseña de {driver} rechazado {when}")
            }
        }
    }
}

/// Audit entry with its rendered message, as returned to the admin panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogView {
    #[serde(flatten)]
    pub entry: AdminLogEntry,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_cancellation() {
        let entry = AdminLogEntry {
            id: "l1".to_string(),
            kind: AuditKind::ReservationCancelled,
            actor: "+34612345678".to_string(),
            context: AuditContext::reservation("M5XK2A-7QW3ER"),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 16, 13, 5, 9).unwrap(),
        };

        let offset = FixedOffset::east_opt(0).unwrap();
        assert_eq!(
            entry.render(offset),
            "La reserva M5XK2A-7QW3ER ha sido cancelada el 16/01/2025 a las 13:05:09"
        );
    }

    #[test]
    fn test_kind_wire_names() {
        let value = serde_json::to_value(AuditKind::ReservationAccepted).unwrap();
        assert_eq!(value, "reservation_accepted");
    }
}
