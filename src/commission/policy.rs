//! Commission policy documents
//!
//! The stored form is a free JSON document (admin tooling writes it), so the
//! shape is validated here on every read. A document that fails to parse is
//! reported to the caller, which degrades the sale to a 0% fallback instead
//! of rejecting it.
//!
//! Rule matching is first-match over the document's rule list: a rule
//! applies when its draw filter, play-kind filter and multiplier range all
//! accept the play; `"*"` and an absent field are both wildcards. When no
//! rule matches, the document's default percent applies.

use crate::db::models::PlayKind;
use chrono::NaiveDate;
use serde::Deserialize;

/// One matching rule inside a policy document.
#[derive(Debug, Clone, Deserialize)]
pub struct CommissionRule {
    #[serde(default)]
    pub id: Option<String>,
    /// Draw filter ("draw:xxx"), wildcard when absent or "*"
    #[serde(default)]
    pub draw: Option<String>,
    #[serde(default)]
    pub play_kind: Option<PlayKind>,
    /// Inclusive multiplier-value range
    #[serde(default)]
    pub min_multiplier: Option<f64>,
    #[serde(default)]
    pub max_multiplier: Option<f64>,
    pub percent: f64,
}

impl CommissionRule {
    fn matches(&self, draw: &str, kind: PlayKind, multiplier_value: Option<f64>) -> bool {
        if let Some(filter) = self.draw.as_deref() {
            if filter != "*" && filter != draw {
                return false;
            }
        }
        if let Some(filter) = self.play_kind {
            if filter != kind {
                return false;
            }
        }
        if self.min_multiplier.is_some() || self.max_multiplier.is_some() {
            // A range can only accept plays whose multiplier value is known
            // at sale time.
            let Some(value) = multiplier_value else {
                return false;
            };
            if let Some(min) = self.min_multiplier {
                if value < min {
                    return false;
                }
            }
            if let Some(max) = self.max_multiplier {
                if value > max {
                    return false;
                }
            }
        }
        true
    }
}

/// A validated commission policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CommissionPolicy {
    pub default_percent: f64,
    #[serde(default)]
    pub rules: Vec<CommissionRule>,
    /// Validity window, inclusive on both ends ("YYYY-MM-DD")
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl CommissionPolicy {
    /// Validate a raw stored document.
    pub fn parse(document: &serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(document.clone()).map_err(|e| e.to_string())
    }

    pub fn is_effective(&self, today: NaiveDate) -> bool {
        if let Some(from) = self.effective_from {
            if today < from {
                return false;
            }
        }
        if let Some(to) = self.effective_to {
            if today > to {
                return false;
            }
        }
        true
    }

    /// First matching rule's percent (and its id), else the default percent.
    pub fn percent_for(
        &self,
        draw: &str,
        kind: PlayKind,
        multiplier_value: Option<f64>,
    ) -> (f64, Option<String>) {
        for rule in &self.rules {
            if rule.matches(draw, kind, multiplier_value) {
                return (rule.percent, rule.id.clone());
            }
        }
        (self.default_percent, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy(doc: serde_json::Value) -> CommissionPolicy {
        CommissionPolicy::parse(&doc).unwrap()
    }

    #[test]
    fn test_parse_rejects_missing_default() {
        assert!(CommissionPolicy::parse(&json!({ "rules": [] })).is_err());
        assert!(CommissionPolicy::parse(&json!("not an object")).is_err());
        assert!(CommissionPolicy::parse(&json!({ "default_percent": "five" })).is_err());
    }

    #[test]
    fn test_first_match_wins() {
        let p = policy(json!({
            "default_percent": 3.0,
            "rules": [
                { "id": "r1", "draw": "draw:evening", "percent": 7.0 },
                { "id": "r2", "draw": "*", "percent": 5.0 },
            ]
        }));
        assert_eq!(
            p.percent_for("draw:evening", PlayKind::Number, Some(70.0)),
            (7.0, Some("r1".to_string()))
        );
        assert_eq!(
            p.percent_for("draw:noon", PlayKind::Number, Some(70.0)),
            (5.0, Some("r2".to_string()))
        );
    }

    #[test]
    fn test_default_when_no_rule_matches() {
        let p = policy(json!({
            "default_percent": 3.0,
            "rules": [
                { "draw": "draw:evening", "play_kind": "BOOSTED", "percent": 2.0 },
            ]
        }));
        assert_eq!(
            p.percent_for("draw:evening", PlayKind::Number, Some(70.0)),
            (3.0, None)
        );
    }

    #[test]
    fn test_multiplier_range_is_inclusive() {
        let p = policy(json!({
            "default_percent": 1.0,
            "rules": [
                { "min_multiplier": 70.0, "max_multiplier": 80.0, "percent": 9.0 },
            ]
        }));
        assert_eq!(p.percent_for("draw:x", PlayKind::Number, Some(70.0)).0, 9.0);
        assert_eq!(p.percent_for("draw:x", PlayKind::Number, Some(80.0)).0, 9.0);
        assert_eq!(p.percent_for("draw:x", PlayKind::Number, Some(69.9)).0, 1.0);
        assert_eq!(p.percent_for("draw:x", PlayKind::Number, Some(80.1)).0, 1.0);
        // Boosted plays carry no value, so ranged rules never accept them
        assert_eq!(p.percent_for("draw:x", PlayKind::Boosted, None).0, 1.0);
    }

    #[test]
    fn test_effective_window() {
        let p = policy(json!({
            "default_percent": 5.0,
            "effective_from": "2026-01-01",
            "effective_to": "2026-06-30",
        }));
        let d = |s: &str| s.parse::<NaiveDate>().unwrap();
        assert!(!p.is_effective(d("2025-12-31")));
        assert!(p.is_effective(d("2026-01-01")));
        assert!(p.is_effective(d("2026-06-30")));
        assert!(!p.is_effective(d("2026-07-01")));

        let open = policy(json!({ "default_percent": 5.0 }));
        assert!(open.is_effective(d("2030-01-01")));
    }
}
