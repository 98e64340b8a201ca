//! Password reset request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A driver's request to have their password reset by an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub id: String,
    pub username: String,
    pub email: String,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub approved: bool,
}
