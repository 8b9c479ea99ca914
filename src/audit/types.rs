//! Audit entry types

use crate::db::models::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// One append-only audit entry (`audit_log` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    /// Ticket sequence the entry was written under
    pub seq: i64,
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: String,
    #[serde(default)]
    pub details: serde_json::Value,
    /// Previous entry's hash, empty string for the genesis entry
    pub prev_hash: String,
    pub curr_hash: String,
}

impl AuditEntry {
    /// The canonical preimage of an entry's hash.
    pub fn hash_input(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.prev_hash, self.seq, self.action, self.resource_id, self.operator_id
        )
    }
}

/// A detected discontinuity in the chain.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChainBreak {
    pub seq: i64,
    pub reason: String,
}

/// Result of a full chain verification.
#[derive(Debug, Clone, Serialize)]
pub struct ChainVerification {
    pub entries: usize,
    pub valid: bool,
    pub breaks: Vec<ChainBreak>,
}
