//! Commission policy record
//!
//! The raw, versioned JSON document attached to a bank, window or agent.
//! The document is an external value type: validated on read, never trusted
//! at point of use (see `commission::policy`).

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Raw policy document attached to an owner (`commission_policy` table)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionPolicyRecord {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub owner: String,
    #[serde(default)]
    pub version: Option<i64>,
    pub document: serde_json::Value,
}
