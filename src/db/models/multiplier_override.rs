//! Multiplier override records
//!
//! Pins an effective base multiplier for an (owner, draw) pair, overriding
//! the bank-level and draw-level defaults. Created by an external admin
//! workflow; strictly read-only here.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Agent-level override for a draw (`agent_multiplier` table)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMultiplierOverride {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub owner: String,
    pub draw: String,
    pub value: f64,
}

/// Window-level override for a draw (`window_multiplier` table)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowMultiplierOverride {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub owner: String,
    pub draw: String,
    pub value: f64,
}

/// Bank-wide setting for a draw (`bank_draw_multiplier` table)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankDrawMultiplier {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub bank: String,
    pub draw: String,
    pub value: f64,
}
