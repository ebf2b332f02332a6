//! Data models matching the JobTicketInvoice API schemas.
//!
//! The API uses snake_case field names throughout; optional fields use
//! `#[serde(default)]` so partially-filled drafts deserialize cleanly.

mod invoice;
mod ticket;
mod user;

pub use invoice::{Invoice, InvoiceList, InvoiceStatus};
pub use ticket::{JobTicket, JobTicketList, JobTicketStatus};
pub use user::{Token, User, UserRole};
