//! Commission resolution
//!
//! Commissions are owned by exactly one level of the hierarchy: the agent's
//! policy document if one exists, otherwise the window's, otherwise the
//! bank's. The first level that *has* a document owns commission for the
//! whole ticket, even when that document turns out to be expired or
//! malformed; a bad document degrades to a 0% fallback rather than blocking
//! the sale.
//!
//! The computed percent, amount and winning rule are frozen onto each play
//! at sale time. Later policy edits never change an already-sold ticket.

mod policy;
mod resolver;

pub use policy::{CommissionPolicy, CommissionRule};
pub use resolver::{CommissionResolver, CommissionSnapshot, PolicySelection};
