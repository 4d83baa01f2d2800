//! The filter compiler.
//!
//! Compiles a per-field filter request into a typed predicate. The compiled
//! form renders to SQL fragments plus a bound-parameter map for a SQL
//! backend, and evaluates directly against [`InventoryRecord`]s for the
//! in-memory backend, so both backends answer from the same predicate.
//!
//! Column names in fragments only ever come from the field registry, and
//! every value-bearing fragment binds a parameter. Caller input never
//! reaches query text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::field::{FieldKind, FieldRegistry, FieldSpec};
use crate::record::InventoryRecord;

/// Reserved filter token meaning "the field is unassigned".
///
/// On sentinel-aware fields it switches the filter from substring match to
/// an empty-or-NULL test. The literal is a caller-facing contract inherited
/// from the register's search form.
pub const UNASSIGNED_SENTINEL: &str = "SENZA";

/// Accepted filter tokens for flag fields, compared case-sensitively.
pub const FILTER_FLAG_TRUE: &str = "true";
/// See [`FILTER_FLAG_TRUE`].
pub const FILTER_FLAG_FALSE: &str = "false";

/// A raw filter request: field name to raw string value.
///
/// Absent and blank-after-trim values mean "no constraint on this field",
/// never "match empty string".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterRequest(BTreeMap<String, String>);

impl FilterRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field's raw value, replacing any previous one.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Reads a field's raw value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Iterates over the supplied field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterRequest {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One compiled predicate condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Tri-state equality on a flag column. Rendered without a bind: the
    /// value is a parsed boolean, never caller text.
    FlagIs {
        /// Registry column.
        column: &'static str,
        /// Required value.
        value: bool,
    },

    /// The sentinel condition: empty string and NULL both match.
    Unassigned {
        /// Registry column.
        column: &'static str,
    },

    /// Case-insensitive substring match, bound as a parameter.
    Contains {
        /// Registry column.
        column: &'static str,
        /// Bound parameter name.
        param: String,
        /// The trimmed needle (unwrapped; wildcards are added at bind time).
        needle: String,
    },

    /// OR group of case-insensitive substring matches, one bound parameter
    /// per sub-value.
    ContainsAny {
        /// Registry column.
        column: &'static str,
        /// `(param, needle)` pairs in sub-value order.
        needles: Vec<(String, String)>,
    },
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Condition {
    /// Renders this condition as a SQL fragment referencing its bound
    /// parameters by name.
    #[must_use]
    pub fn fragment(&self) -> String {
        match self {
            Self::FlagIs { column, value } => {
                if *value {
                    format!("{column} IS TRUE")
                } else {
                    format!("{column} IS FALSE")
                }
            }
            Self::Unassigned { column } => {
                format!("({column} = '' OR {column} IS NULL)")
            }
            Self::Contains { column, param, .. } => format!("{column} ILIKE :{param}"),
            Self::ContainsAny { column, needles } => {
                let parts: Vec<String> = needles
                    .iter()
                    .map(|(param, _)| format!("{column} ILIKE :{param}"))
                    .collect();
                format!("({})", parts.join(" OR "))
            }
        }
    }

    fn collect_params(&self, params: &mut BTreeMap<String, String>) {
        match self {
            Self::FlagIs { .. } | Self::Unassigned { .. } => {}
            Self::Contains { param, needle, .. } => {
                params.insert(param.clone(), format!("%{needle}%"));
            }
            Self::ContainsAny { needles, .. } => {
                for (param, needle) in needles {
                    params.insert(param.clone(), format!("%{needle}%"));
                }
            }
        }
    }

    /// Evaluates this condition against one record.
    #[must_use]
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        match self {
            Self::FlagIs { column, value } => record.flag(column) == *value,
            Self::Unassigned { column } => {
                record.text_column(column).map_or(true, str::is_empty)
            }
            Self::Contains { column, needle, .. } => record
                .text_column(column)
                .is_some_and(|text| contains_ci(text, needle)),
            Self::ContainsAny { column, needles } => record
                .text_column(column)
                .is_some_and(|text| needles.iter().any(|(_, n)| contains_ci(text, n))),
        }
    }
}

/// A compiled filter: ordered conditions plus their bound parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompiledFilter {
    conditions: Vec<Condition>,
}

impl CompiledFilter {
    /// Listing order for every query built from a compiled filter. The id
    /// tie-break keeps pagination and diffs deterministic.
    pub const ORDER_BY: &'static str = "description ASC, id ASC";

    /// True when the request constrained nothing. Callers must not execute
    /// a query from an empty filter; "show everything" is an explicit
    /// caller decision, not a default.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The compiled conditions, in field-registry order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// SQL fragments in field-registry order, to be ANDed with the caller's
    /// base query and its `deleted IS NULL` exclusion.
    #[must_use]
    pub fn fragments(&self) -> Vec<String> {
        self.conditions.iter().map(Condition::fragment).collect()
    }

    /// Bound parameters for the fragments, wildcard-wrapped where the
    /// condition is a substring match.
    #[must_use]
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        for condition in &self.conditions {
            condition.collect_params(&mut params);
        }
        params
    }

    /// The fragments joined with AND, without the base exclusion.
    #[must_use]
    pub fn where_sql(&self) -> String {
        self.fragments().join(" AND ")
    }

    /// Evaluates all conditions against one record. The soft-delete
    /// exclusion is the backend's responsibility, not the filter's.
    #[must_use]
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

/// Compiles a filter request against the registry.
///
/// Fields are processed in registry order, so compilation is deterministic
/// and idempotent. Request fields that do not resolve to a filterable
/// registry entry reject the whole request.
///
/// # Errors
/// - [`ValidationError::UnknownField`] for a name the registry does not
///   know, or knows but does not allow in filters.
/// - [`ValidationError::InvalidValue`] for a flag token other than the two
///   accepted literals.
pub fn compile_filter(
    registry: &FieldRegistry,
    request: &FilterRequest,
) -> Result<CompiledFilter, ValidationError> {
    for name in request.field_names() {
        let known = registry.lookup(name).is_some_and(|spec| spec.filterable);
        if !known {
            return Err(ValidationError::UnknownField {
                field: name.to_string(),
            });
        }
    }

    let mut conditions = Vec::new();
    for spec in registry.filterable_fields() {
        let Some(raw) = request.get(spec.name) else {
            continue;
        };
        match spec.kind {
            FieldKind::Flag => compile_flag(spec, raw, &mut conditions)?,
            FieldKind::Text | FieldKind::SentinelText => {
                compile_text(spec, raw, &mut conditions);
            }
        }
    }

    Ok(CompiledFilter { conditions })
}

fn compile_flag(
    spec: &FieldSpec,
    raw: &str,
    conditions: &mut Vec<Condition>,
) -> Result<(), ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let value = match trimmed {
        FILTER_FLAG_TRUE => true,
        FILTER_FLAG_FALSE => false,
        _ => {
            return Err(ValidationError::InvalidValue {
                field: spec.name.to_string(),
                value: raw.to_string(),
                reason: format!("expected {FILTER_FLAG_TRUE} or {FILTER_FLAG_FALSE}"),
            })
        }
    };
    conditions.push(Condition::FlagIs {
        column: spec.column,
        value,
    });
    Ok(())
}

fn compile_text(spec: &FieldSpec, raw: &str, conditions: &mut Vec<Condition>) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }

    if spec.kind == FieldKind::SentinelText && trimmed == UNASSIGNED_SENTINEL {
        conditions.push(Condition::Unassigned {
            column: spec.column,
        });
        return;
    }

    if spec.multi_value && trimmed.contains(',') {
        let needles: Vec<(String, String)> = trimmed
            .split(',')
            .map(str::trim)
            .filter(|sub| !sub.is_empty())
            .enumerate()
            .map(|(i, sub)| (format!("{}_{i}", spec.column), sub.to_string()))
            .collect();
        if !needles.is_empty() {
            conditions.push(Condition::ContainsAny {
                column: spec.column,
                needles,
            });
        }
        return;
    }

    conditions.push(Condition::Contains {
        column: spec.column,
        param: spec.column.to_string(),
        needle: trimmed.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;

    fn registry() -> &'static FieldRegistry {
        FieldRegistry::current()
    }

    #[test]
    fn test_blank_request_compiles_empty() {
        let request = FilterRequest::new()
            .with("description", "   ")
            .with("owner", "");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert!(compiled.is_empty());
        assert!(compiled.fragments().is_empty());
        assert!(compiled.params().is_empty());
    }

    #[test]
    fn test_unknown_field_rejects_whole_request() {
        let request = FilterRequest::new()
            .with("description", "pump")
            .with("appraised_value", "1000");
        let err = compile_filter(registry(), &request).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownField {
                field: "appraised_value".to_string()
            }
        );
    }

    #[test]
    fn test_unfilterable_field_is_rejected() {
        let request = FilterRequest::new().with("weight", "12");
        assert!(compile_filter(registry(), &request).is_err());
    }

    #[test]
    fn test_text_field_binds_wildcards() {
        let request = FilterRequest::new().with("description", " pump ");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(compiled.fragments(), vec!["description ILIKE :description"]);
        assert_eq!(
            compiled.params().get("description"),
            Some(&"%pump%".to_string())
        );
    }

    #[test]
    fn test_flag_field_renders_tri_state_fragment() {
        let request = FilterRequest::new().with("to_be_moved", "true");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(compiled.fragments(), vec!["to_be_moved IS TRUE"]);
        assert!(compiled.params().is_empty());

        let request = FilterRequest::new().with("to_be_moved", "false");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(compiled.fragments(), vec!["to_be_moved IS FALSE"]);
    }

    #[test]
    fn test_flag_tokens_are_case_sensitive() {
        let request = FilterRequest::new().with("to_be_moved", "TRUE");
        let err = compile_filter(registry(), &request).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn test_sentinel_value_matches_unassigned() {
        let request = FilterRequest::new().with("owner", "SENZA");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(compiled.fragments(), vec!["(owner = '' OR owner IS NULL)"]);
        assert!(compiled.params().is_empty());

        let mut record = InventoryRecord::new(RecordId(1), "Pump");
        assert!(compiled.matches(&record));
        record.owner = Some(String::new());
        assert!(compiled.matches(&record));
        record.owner = Some("Rossi".to_string());
        assert!(!compiled.matches(&record));
    }

    #[test]
    fn test_sentinel_on_plain_text_field_is_a_needle() {
        // Only sentinel-aware fields understand the token.
        let request = FilterRequest::new().with("notes", "SENZA");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(compiled.fragments(), vec!["notes ILIKE :notes"]);
    }

    #[test]
    fn test_multi_owner_binds_one_param_per_sub_value() {
        let request = FilterRequest::new().with("owner", "Rossi, Bianchi");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(
            compiled.fragments(),
            vec!["(owner ILIKE :owner_0 OR owner ILIKE :owner_1)"]
        );
        let params = compiled.params();
        assert_eq!(params.get("owner_0"), Some(&"%Rossi%".to_string()));
        assert_eq!(params.get("owner_1"), Some(&"%Bianchi%".to_string()));
    }

    #[test]
    fn test_multi_owner_matches_case_insensitively() {
        let request = FilterRequest::new().with("owner", "Rossi, Bianchi");
        let compiled = compile_filter(registry(), &request).unwrap();

        let mut record = InventoryRecord::new(RecordId(1), "Pump");
        record.owner = Some("Lab BIANCHI".to_string());
        assert!(compiled.matches(&record));
        record.owner = Some("rossini".to_string());
        assert!(compiled.matches(&record)); // substring semantics
        record.owner = Some("Verdi".to_string());
        assert!(!compiled.matches(&record));
    }

    #[test]
    fn test_multi_owner_drops_empty_sub_values() {
        let request = FilterRequest::new().with("owner", "Rossi, , ");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(
            compiled.fragments(),
            vec!["(owner ILIKE :owner_0)"]
        );

        let request = FilterRequest::new().with("owner", " , ,");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert!(compiled.is_empty());
    }

    #[test]
    fn test_conditions_follow_registry_order() {
        // Request insertion order differs from registry order on purpose.
        let request = FilterRequest::new()
            .with("notes", "fragile")
            .with("description", "pump")
            .with("to_be_moved", "true");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(
            compiled.fragments(),
            vec![
                "description ILIKE :description",
                "to_be_moved IS TRUE",
                "notes ILIKE :notes",
            ]
        );
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let request = FilterRequest::new()
            .with("owner", "Rossi, Bianchi")
            .with("to_be_moved", "true")
            .with("description", "pump");
        let first = compile_filter(registry(), &request).unwrap();
        let second = compile_filter(registry(), &request).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.fragments(), second.fragments());
        assert_eq!(first.params(), second.params());
    }

    #[test]
    fn test_where_sql_joins_with_and() {
        let request = FilterRequest::new()
            .with("description", "pump")
            .with("to_be_moved", "true");
        let compiled = compile_filter(registry(), &request).unwrap();
        assert_eq!(
            compiled.where_sql(),
            "description ILIKE :description AND to_be_moved IS TRUE"
        );
    }

    #[test]
    fn test_compiled_filter_serializes_for_export() {
        let request = FilterRequest::new()
            .with("owner", "SENZA")
            .with("to_be_moved", "true");
        let compiled = compile_filter(registry(), &request).unwrap();
        let json = serde_json::to_value(&compiled).unwrap();
        let kinds: Vec<&str> = json["conditions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["unassigned", "flag_is"]);
    }

    #[test]
    fn test_order_by_is_fixed() {
        assert_eq!(CompiledFilter::ORDER_BY, "description ASC, id ASC");
    }
}
