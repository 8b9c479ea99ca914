//! Restriction engine
//!
//! Evaluates every applicable betting-limit rule against the plays of a
//! pending ticket before it is persisted. Rules can cap a single ticket's
//! stake on a number, cap the accumulated stake across a whole draw, scale
//! a cap with observed sales, or block a multiplier outright. Accumulated
//! totals are always read fresh from the database; only the rule documents
//! themselves are briefly cached.
//!
//! Rules never auto-expire: date and hour filters gate when a rule bites,
//! not whether it exists.

mod engine;
mod matcher;
mod types;

pub use engine::RestrictionEngine;
pub use types::{Clearance, PendingPlay, RuleScope, SaleContext, Violation};
