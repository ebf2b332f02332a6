//! Invoice data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being prepared.
    #[default]
    Draft,
    /// Sent to the customer.
    Sent,
    /// Payment received.
    Paid,
}

/// An invoice generated from a job ticket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID. Absent on invoices not yet persisted.
    #[serde(default)]
    pub id: Option<i64>,

    /// User who created the invoice.
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Job ticket this invoice bills for.
    pub job_ticket_id: i64,

    /// Total amount.
    pub amount: f64,

    /// Lifecycle status.
    #[serde(default)]
    pub status: InvoiceStatus,

    /// Line items, as a JSON-encoded list.
    #[serde(default)]
    pub line_items: Option<String>,

    /// Creation timestamp, set by the backend.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Paginated invoice listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceList {
    /// Invoices in this page.
    #[serde(default)]
    pub invoices: Vec<Invoice>,

    /// Total matching invoices across all pages.
    #[serde(default)]
    pub total: i64,
}
