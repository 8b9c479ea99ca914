//! Ticket sale orchestration
//!
//! The end-to-end sale: request validation, entity and draw checks, cutoff
//! enforcement, multiplier resolution, restriction evaluation, commission
//! snapshots and the atomic persistence of the ticket with its plays and
//! audit entry. Transient failures are retried from scratch inside the
//! retry wrapper; admission control bounds how many sales run at once.

mod cutoff;
mod transaction;
mod types;

pub use crate::db::repository::TicketAggregate;
pub use transaction::TicketEngine;
pub use types::{PlayInput, SaleReceipt, SaleRequest};
