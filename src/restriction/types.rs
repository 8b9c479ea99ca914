//! Restriction evaluation types

use crate::db::models::PlayKind;
use crate::db::repository::CapGuard;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Which level of the hierarchy owns the violated rule.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    Agent,
    Window,
    Bank,
}

/// A rejected sale, with enough context for the caller to tell the buyer
/// exactly what was over the line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Violation {
    pub scope: RuleScope,
    /// Target number, when the rule caps a number
    pub number: Option<String>,
    /// The stake that would have resulted had the sale gone through
    pub attempted: f64,
    pub limit: f64,
    pub message: String,
}

/// A passed pre-check: the advisory warnings produced for privileged
/// agents, plus the accumulated-cap conditions that must hold again inside
/// the write transaction (the pre-check reads totals outside it, so a
/// concurrent sale can land in between).
#[derive(Debug, Clone, Default)]
pub struct Clearance {
    pub warnings: Vec<String>,
    pub guards: Vec<CapGuard>,
}

/// A play as it exists before persistence: amounts validated, multiplier
/// identifier already resolved for plain-number plays.
#[derive(Debug, Clone)]
pub struct PendingPlay {
    pub kind: PlayKind,
    pub number: String,
    pub amount: f64,
    pub multiplier: Option<String>,
}

/// Ambient facts of the sale the rules are evaluated against.
#[derive(Debug, Clone)]
pub struct SaleContext {
    pub bank: String,
    pub window: String,
    pub agent: String,
    pub draw: String,
    pub is_privileged: bool,
    /// Wall-clock time of the sale, injected for date/hour filters
    pub now: NaiveDateTime,
}
