//! The logistics non-conformance rule.
//!
//! A record is non-conformant when it must be moved under transport the
//! organization controls (not self-transported, not exempted as a
//! collection piece) but lacks a well-formed weight or dimensions value.
//!
//! The rule is declared once as data (flag gates plus format checks) and
//! backs both forms the callers need: a per-record boolean and a SQL
//! predicate for aggregate counts. The two can never drift apart because
//! neither restates the logic.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Anchored pattern a well-formed weight must match.
pub const WEIGHT_PATTERN: &str = r"^-?\d+(\.\d+)?$";

/// Anchored pattern well-formed dimensions must match (`WxHxD` integers).
pub const DIMENSIONS_PATTERN: &str = r"^\d+x\d+x\d+$";

/// The attributes of one record the rule evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceContext {
    /// Exempted as a collection piece.
    pub collection_item: bool,
    /// Flagged for movement.
    pub to_be_moved: bool,
    /// Moved by the owning party itself.
    pub self_transported: bool,
    /// Raw weight text. Empty means missing and fails the format check.
    pub weight: String,
    /// Raw dimensions text. Empty fails the format check.
    pub dimensions: String,
}

impl ComplianceContext {
    fn flag(&self, column: &str) -> bool {
        match column {
            "collection_item" => self.collection_item,
            "to_be_moved" => self.to_be_moved,
            "self_transported" => self.self_transported,
            _ => false,
        }
    }

    fn text(&self, column: &str) -> &str {
        match column {
            "weight" => &self.weight,
            "dimensions" => &self.dimensions,
            _ => "",
        }
    }
}

/// A flag condition gating the rule: the column must hold `expected`.
#[derive(Debug, Clone, Copy)]
struct FlagGate {
    column: &'static str,
    expected: bool,
}

/// A format condition: the column must match `pattern` to be conformant.
#[derive(Debug)]
struct FormatCheck {
    column: &'static str,
    pattern: &'static str,
    compiled: OnceLock<Regex>,
}

impl FormatCheck {
    const fn new(column: &'static str, pattern: &'static str) -> Self {
        Self {
            column,
            pattern,
            compiled: OnceLock::new(),
        }
    }

    fn regex(&self) -> &Regex {
        self.compiled.get_or_init(|| {
            // Patterns are crate constants; failing to compile one is a
            // programming error, not a runtime condition.
            Regex::new(self.pattern)
                .unwrap_or_else(|e| panic!("invalid built-in pattern '{}': {e}", self.pattern))
        })
    }

    fn is_malformed(&self, ctx: &ComplianceContext) -> bool {
        !self.regex().is_match(ctx.text(self.column))
    }
}

/// The non-conformance rule: conjunctive flag gates, disjunctive format
/// checks. Versioned because the gate set has changed as flags were added
/// to the schema.
#[derive(Debug)]
pub struct ComplianceRule {
    version: u32,
    gates: Vec<FlagGate>,
    checks: Vec<FormatCheck>,
}

static CURRENT_RULE: OnceLock<ComplianceRule> = OnceLock::new();

impl ComplianceRule {
    /// The rule in force. Version 2: version 1 predates the
    /// `collection_item` flag and applied to every record flagged for
    /// movement.
    pub fn current() -> &'static Self {
        CURRENT_RULE.get_or_init(|| Self {
            version: 2,
            gates: vec![
                FlagGate {
                    column: "collection_item",
                    expected: false,
                },
                FlagGate {
                    column: "to_be_moved",
                    expected: true,
                },
                FlagGate {
                    column: "self_transported",
                    expected: false,
                },
            ],
            checks: vec![
                FormatCheck::new("weight", WEIGHT_PATTERN),
                FormatCheck::new("dimensions", DIMENSIONS_PATTERN),
            ],
        })
    }

    /// The version marker of this rule.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Evaluates the rule for one record.
    #[must_use]
    pub fn is_non_conformant(&self, ctx: &ComplianceContext) -> bool {
        let gated = self.gates.iter().all(|g| ctx.flag(g.column) == g.expected);
        gated && self.checks.iter().any(|c| c.is_malformed(ctx))
    }

    /// Renders the rule as a SQL predicate over the record table, for use
    /// as a computed column or inside an aggregate count.
    ///
    /// Flag gates use tri-state `IS` comparisons (NULL gates as false);
    /// format checks treat NULL like any non-matching text.
    #[must_use]
    pub fn sql_predicate(&self) -> String {
        let mut parts: Vec<String> = self
            .gates
            .iter()
            .map(|g| {
                if g.expected {
                    format!("{} IS TRUE", g.column)
                } else {
                    format!("{} IS NOT TRUE", g.column)
                }
            })
            .collect();

        let checks: Vec<String> = self
            .checks
            .iter()
            .map(|c| format!("({col} IS NULL OR {col} !~ '{}')", c.pattern, col = c.column))
            .collect();
        parts.push(format!("({})", checks.join(" OR ")));

        format!("({})", parts.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(
        collection_item: bool,
        to_be_moved: bool,
        self_transported: bool,
        weight: &str,
        dimensions: &str,
    ) -> ComplianceContext {
        ComplianceContext {
            collection_item,
            to_be_moved,
            self_transported,
            weight: weight.to_string(),
            dimensions: dimensions.to_string(),
        }
    }

    #[test]
    fn test_collection_item_is_always_conformant() {
        let rule = ComplianceRule::current();
        assert!(!rule.is_non_conformant(&ctx(true, true, false, "abc", "bad")));
    }

    #[test]
    fn test_well_formed_measurements_are_conformant() {
        let rule = ComplianceRule::current();
        assert!(!rule.is_non_conformant(&ctx(false, true, false, "12.5", "10x20x30")));
    }

    #[test]
    fn test_truncated_dimensions_are_non_conformant() {
        let rule = ComplianceRule::current();
        assert!(rule.is_non_conformant(&ctx(false, true, false, "12.5", "10x20")));
    }

    #[test]
    fn test_malformed_weight_is_non_conformant() {
        let rule = ComplianceRule::current();
        assert!(rule.is_non_conformant(&ctx(false, true, false, "approx 12", "10x20x30")));
    }

    #[test]
    fn test_empty_measurements_fail_their_patterns() {
        let rule = ComplianceRule::current();
        assert!(rule.is_non_conformant(&ctx(false, true, false, "", "")));
    }

    #[test]
    fn test_not_flagged_for_movement_is_conformant() {
        let rule = ComplianceRule::current();
        assert!(!rule.is_non_conformant(&ctx(false, false, false, "", "")));
    }

    #[test]
    fn test_self_transported_is_conformant() {
        let rule = ComplianceRule::current();
        assert!(!rule.is_non_conformant(&ctx(false, true, true, "", "")));
    }

    #[test]
    fn test_negative_and_integer_weights_are_well_formed() {
        let rule = ComplianceRule::current();
        assert!(!rule.is_non_conformant(&ctx(false, true, false, "-3", "1x2x3")));
        assert!(!rule.is_non_conformant(&ctx(false, true, false, "40", "1x2x3")));
        // Trailing garbage is not, because the pattern is anchored.
        assert!(rule.is_non_conformant(&ctx(false, true, false, "40kg", "1x2x3")));
    }

    #[test]
    fn test_sql_predicate_names_all_conditions() {
        let sql = ComplianceRule::current().sql_predicate();
        assert!(sql.contains("collection_item IS NOT TRUE"));
        assert!(sql.contains("to_be_moved IS TRUE"));
        assert!(sql.contains("self_transported IS NOT TRUE"));
        assert!(sql.contains(WEIGHT_PATTERN));
        assert!(sql.contains(DIMENSIONS_PATTERN));
    }

    #[test]
    fn test_rule_version() {
        assert_eq!(ComplianceRule::current().version(), 2);
    }
}
