//! Ticket and Play entities
//!
//! A ticket is one purchased slip; its plays are the wagered lines. The
//! multiplier and commission fields on a play are snapshots taken at sale
//! time and are never recomputed afterwards; later changes to policy
//! documents must not retroactively alter sold plays.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Ticket lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Active,
    Evaluated,
    Paid,
    Cancelled,
    Excluded,
}

/// Play type: a plain number, or a number with the boost side-bet
/// ("reventado") attached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayKind {
    Number,
    Boosted,
}

/// Which level of the override chain produced the effective multiplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierSource {
    AgentOverride,
    WindowOverride,
    BankDraw,
    DrawBase,
    DrawRules,
    Default,
}

/// Which owner level produced the commission snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommissionSource {
    Agent,
    Window,
    Bank,
    /// No policy anywhere, or the winning policy degraded (expired/malformed)
    Fallback,
}

/// One purchased slip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    /// Globally unique, strictly increasing sequence number
    pub sequence: i64,
    pub draw: String,
    pub window: String,
    pub agent: String,
    pub total_amount: f64,
    pub status: TicketStatus,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_winner: bool,
    #[serde(default)]
    pub total_payout: f64,
    #[serde(default)]
    pub total_paid: f64,
    #[serde(default)]
    pub remaining_payable: f64,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_excluded: bool,
    /// RFC3339 creation timestamp
    pub created_at: String,
}

/// One wagered line within a ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Play {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub ticket: RecordId,
    /// Denormalized refs; accumulation queries filter on these
    pub draw: String,
    pub window: String,
    pub agent: String,
    pub kind: PlayKind,
    pub number: String,
    pub boost_number: Option<String>,
    pub amount: f64,
    /// Multiplier record the play was sold under (NUMBER plays only; the
    /// boost variant resolves its factor at evaluation time)
    pub multiplier: Option<String>,
    /// Frozen effective multiplier value
    pub multiplier_value: f64,
    pub multiplier_source: MultiplierSource,
    /// Frozen commission snapshot
    pub commission_percent: f64,
    pub commission_amount: f64,
    pub commission_source: CommissionSource,
    pub commission_rule: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_excluded: bool,
}
