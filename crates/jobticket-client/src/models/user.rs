//! User and auth token models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Field technician; fills out job tickets.
    #[default]
    Tech,
    /// Reviews submitted tickets and manages invoices.
    Manager,
    /// Full access.
    Admin,
}

/// An account in the JobTicketInvoice system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: i64,

    /// Login email.
    pub email: String,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Company the account belongs to.
    #[serde(default)]
    pub company_name: Option<String>,

    /// Worker specialization (pump tech, electrician, ...), free-form.
    #[serde(default)]
    pub job_type: Option<String>,

    /// Company logo URL for invoice rendering.
    #[serde(default)]
    pub logo_url: Option<String>,

    /// Account role.
    #[serde(default)]
    pub role: UserRole,

    /// Account creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Bearer token returned by the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// The bearer token value.
    pub access_token: String,

    /// Token type, always `"bearer"`.
    pub token_type: String,
}
