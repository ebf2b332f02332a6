//! JobTicketInvoice API client
//!
//! Client-side API layer for the JobTicketInvoice system: field workers fill
//! out job tickets, save drafts, submit them, and managers review submissions
//! and raise invoices.
//!
//! The core of the crate is the [`dispatch`] middleware: every network call
//! is routed through [`dispatch::Dispatcher::execute`], which layers
//! structured logging, optional GET-response caching, and bounded
//! fixed-delay retry around the call without touching its payload.
//! [`client::JobTicketClient`] is the typed surface built on top of it.
//!
//! # Example
//!
//! ```no_run
//! use jobticket_client::{client::JobTicketClient, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = JobTicketClient::new(config)?;
//!
//!     let tickets = client.list_tickets().await?;
//!     println!("{} tickets", tickets.total);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;

pub use client::JobTicketClient;
pub use config::Config;
pub use dispatch::{ApiRequest, Dispatcher, Method, Policy};
pub use error::{ApiError, ApiResult};
