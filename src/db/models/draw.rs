//! Draw and draw-multiplier entities
//!
//! The draw lifecycle (scheduling, closing, evaluation) is owned by an
//! external collaborator; the engine only reads status, product family and
//! the per-draw multiplier records.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Draw lifecycle status; sales require `Open`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawStatus {
    Scheduled,
    Open,
    Closed,
    Evaluated,
}

/// Optional rules document attached to a draw. May embed a payout
/// multiplier (step 5 of the resolution chain).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawRules {
    #[serde(default)]
    pub multiplier: Option<f64>,
}

/// A scheduled lottery event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draw {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    pub product: String,
    pub status: DrawStatus,
    /// RFC3339 close-of-sales instant
    pub close_at: String,
    #[serde(default)]
    pub rules: Option<DrawRules>,
}

/// Kind of a per-draw multiplier record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MultiplierKind {
    Number,
    Boost,
}

/// The conventional name of the draw's base NUMBER multiplier record
pub const BASE_MULTIPLIER_NAME: &str = "Base";

/// Per-draw payout factor record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawMultiplier {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub draw: String,
    pub name: String,
    pub kind: MultiplierKind,
    pub value: f64,
    #[serde(default, deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
}
