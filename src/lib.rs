//! Ticket sale transaction engine for multi-tenant lottery banks.
//!
//! The engine sells numbered plays against scheduled draws on behalf of
//! banks, their windows and their selling agents. One call to
//! [`TicketEngine::sell`] performs the whole unit of work:
//!
//! 1. allocate a unique, monotonic ticket number,
//! 2. resolve the effective payout multiplier through the override chain,
//! 3. evaluate every play against the hierarchical betting-limit rules,
//! 4. snapshot the seller commission per play,
//! 5. persist ticket + plays + audit entry in one database transaction.
//!
//! Transient database conflicts (the sequence counter is a single hot row)
//! are retried transparently; domain rejections are surfaced immediately
//! with full context.

pub mod audit;
pub mod cache;
pub mod commission;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod money;
pub mod multiplier;
pub mod restriction;
pub mod retry;
pub mod sequence;
pub mod ticket;

pub use config::EngineConfig;
pub use db::DbService;
pub use error::SaleError;
pub use restriction::{RuleScope, Violation};
pub use ticket::{PlayInput, SaleReceipt, SaleRequest, TicketAggregate, TicketEngine};
