//! Pure rule-to-play matching
//!
//! Every filter on a rule narrows it; an absent filter is a wildcard. All
//! time-dependent checks take the sale's clock as an argument so matching
//! stays deterministic under test.

use super::types::{PendingPlay, RuleScope};
use crate::db::models::RestrictionRule;
use chrono::{Datelike, NaiveDateTime, Timelike};

/// The level a rule is attached to. Scope fields are set exclusively by the
/// admin tooling; should more than one be present, the narrowest wins.
pub(super) fn scope_of(rule: &RestrictionRule) -> RuleScope {
    if rule.agent.is_some() {
        RuleScope::Agent
    } else if rule.window.is_some() {
        RuleScope::Window
    } else {
        RuleScope::Bank
    }
}

/// Evaluation order: agent rules first, then window, then bank.
pub(super) fn scope_rank(rule: &RestrictionRule) -> u8 {
    match scope_of(rule) {
        RuleScope::Agent => 0,
        RuleScope::Window => 1,
        RuleScope::Bank => 2,
    }
}

/// The number a rule targets right now: its static number, or today's day
/// of month (zero-padded) for calendar-tracking rules.
pub(super) fn effective_number(rule: &RestrictionRule, now: NaiveDateTime) -> Option<String> {
    if rule.auto_date_number {
        Some(format!("{:02}", now.day()))
    } else {
        rule.number.clone()
    }
}

/// Whether a rule applies to a play at the given sale time.
pub(super) fn rule_matches_play(
    rule: &RestrictionRule,
    play: &PendingPlay,
    now: NaiveDateTime,
) -> bool {
    if let Some(number) = effective_number(rule, now) {
        if play.number != number {
            return false;
        }
    }
    if let Some(kind) = rule.play_kind {
        if play.kind != kind {
            return false;
        }
    }
    if let Some(multiplier) = rule.multiplier.as_deref() {
        // Boost-variant plays carry no sale-time multiplier and are outside
        // any multiplier-filtered rule.
        if play.multiplier.as_deref() != Some(multiplier) {
            return false;
        }
    }
    if let Some(date) = rule.date.as_deref() {
        if now.format("%Y-%m-%d").to_string() != date {
            return false;
        }
    }
    if let Some(hour) = rule.hour {
        if now.hour() != hour {
            return false;
        }
    }
    true
}
