//! Restriction rule entity
//!
//! A betting-limit policy scoped to exactly one of bank / window / agent.
//! Rules at every scope apply simultaneously; scope only determines who the
//! rule belongs to, not which rule "wins". Rules are soft-disabled, never
//! deleted (rule CRUD lives outside this crate).

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::ticket::PlayKind;

/// A betting-limit policy record.
///
/// Cap semantics:
/// - `max_amount`: per-ticket cap for the rule's number,
/// - `max_total`: accumulated cap across the draw,
/// - `base_amount` + `sales_percent`: dynamic cap
///   `base + percent/100 * observed sales` (draw-wide, or scoped to the
///   selling agent when `per_agent_sales` is set),
/// - no numeric field at all + a multiplier filter: the rule blocks that
///   multiplier outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictionRule {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,

    // ===== Scope (exactly one set) =====
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,

    // ===== Narrowing filters (None = wildcard) =====
    /// Target number; resolved from the calendar day when `auto_date_number`
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub play_kind: Option<PlayKind>,
    /// Multiplier record filter ("draw_multiplier:xxx")
    #[serde(default)]
    pub multiplier: Option<String>,
    /// Calendar date filter, "YYYY-MM-DD"
    #[serde(default)]
    pub date: Option<String>,
    /// Hour-of-day filter, 0..=23
    #[serde(default)]
    pub hour: Option<u32>,

    // ===== Caps =====
    #[serde(default)]
    pub max_amount: Option<f64>,
    #[serde(default)]
    pub max_total: Option<f64>,
    #[serde(default)]
    pub base_amount: Option<f64>,
    #[serde(default)]
    pub sales_percent: Option<f64>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub per_agent_sales: bool,

    /// Resolve the target number from the current day of month
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub auto_date_number: bool,

    #[serde(default, deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
}

impl RestrictionRule {
    /// True when the rule configures no numeric cap at all; combined with a
    /// multiplier filter this makes it a multiplier-blocking rule.
    pub fn has_no_caps(&self) -> bool {
        self.max_amount.is_none()
            && self.max_total.is_none()
            && self.base_amount.is_none()
            && self.sales_percent.is_none()
    }
}
