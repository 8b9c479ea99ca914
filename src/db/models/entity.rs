//! Tenant hierarchy: bank, window, agent, product
//!
//! Banks own windows; agents sell under a window. All four carry only the
//! fields the sale path needs: active flags, the hierarchy refs and the
//! optional cutoff-minutes override.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Top-level tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default, deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub cutoff_minutes: Option<u32>,
}

/// Resale point under a bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    pub bank: String,
    #[serde(default, deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub cutoff_minutes: Option<u32>,
}

/// Individual seller under a window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    pub window: String,
    pub bank: String,
    #[serde(default, deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    /// Privileged actors get warnings instead of multiplier-block rejections
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_privileged: bool,
    #[serde(default)]
    pub cutoff_minutes: Option<u32>,
}

/// Product family a draw belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default, deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
}
