//! Job ticket data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobTicketStatus {
    /// Saved but not yet submitted for review.
    #[default]
    Draft,
    /// Submitted and awaiting manager review.
    Submitted,
    /// Reviewed and closed out.
    Complete,
}

/// A job ticket filled out by a field worker.
///
/// Time fields are free-form strings as entered on the ticket form;
/// the backend does not normalize them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTicket {
    /// Ticket ID. Absent on tickets not yet persisted.
    #[serde(default)]
    pub id: Option<i64>,

    /// Owning user, when the ticket was created by an authenticated account.
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Customer-facing job number.
    #[serde(default)]
    pub job_number: Option<String>,

    /// Unique short ticket number assigned by the backend.
    #[serde(default)]
    pub ticket_number: Option<String>,

    /// Company the work was performed for.
    #[serde(default)]
    pub company_name: Option<String>,

    /// Customer contact name.
    #[serde(default)]
    pub customer_name: Option<String>,

    /// Work site location.
    #[serde(default)]
    pub location: Option<String>,

    /// Kind of work performed (varies by worker role).
    #[serde(default)]
    pub work_type: Option<String>,

    /// Equipment worked on.
    #[serde(default)]
    pub equipment: Option<String>,

    /// Work start time as entered on the form.
    #[serde(default)]
    pub work_start_time: Option<String>,

    /// Work end time as entered on the form.
    #[serde(default)]
    pub work_end_time: Option<String>,

    /// Total work hours.
    #[serde(default)]
    pub work_total_hours: Option<f64>,

    /// Drive start time.
    #[serde(default)]
    pub drive_start_time: Option<String>,

    /// Drive end time.
    #[serde(default)]
    pub drive_end_time: Option<String>,

    /// Total drive hours.
    #[serde(default)]
    pub drive_total_hours: Option<f64>,

    /// Travel type (one-way, round trip).
    #[serde(default)]
    pub travel_type: Option<String>,

    /// Parts used, as a JSON-encoded list.
    #[serde(default)]
    pub parts_used: Option<String>,

    /// Free-form description of the work performed.
    #[serde(default)]
    pub work_description: Option<String>,

    /// Name of the person who submitted the ticket.
    #[serde(default)]
    pub submitted_by: Option<String>,

    /// Lifecycle status.
    #[serde(default)]
    pub status: JobTicketStatus,

    /// Creation timestamp, set by the backend.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobTicket {
    /// Whether the ticket is still an editable draft.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.status == JobTicketStatus::Draft
    }
}

/// Paginated job ticket listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTicketList {
    /// Tickets in this page.
    #[serde(default)]
    pub job_tickets: Vec<JobTicket>,

    /// Total matching tickets across all pages.
    #[serde(default)]
    pub total: i64,
}
