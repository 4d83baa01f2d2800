//! The field registry: the static catalog of searchable and editable fields.
//!
//! Every field name arriving from a caller must resolve to a [`FieldSpec`]
//! here before it is allowed anywhere near a query or an update. Field names
//! that do not resolve are rejected, never interpolated.
//!
//! The registry is loaded once per process and is read-only afterwards; the
//! set of flag columns has grown over the register's life, which is why the
//! registry carries an explicit [`FieldRegistry::schema_version`] marker.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Accepted flag tokens for bulk updates, compared case-insensitively.
pub const FLAG_TRUE_TOKEN: &str = "SI";
/// See [`FLAG_TRUE_TOKEN`].
pub const FLAG_FALSE_TOKEN: &str = "NO";

/// The kind of a registered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text, filtered by case-insensitive substring match.
    Text,
    /// Tri-state boolean column queried with an explicit `IS` comparison.
    Flag,
    /// Free text that additionally understands the unassigned sentinel.
    SentinelText,
}

/// A coerced value ready to be written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// A text column value.
    Text(String),
    /// A flag column value.
    Flag(bool),
}

/// One entry of the field registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Public field name, as callers supply it.
    pub name: &'static str,
    /// Storage column backing the field.
    pub column: &'static str,
    /// The field's kind.
    pub kind: FieldKind,
    /// Whether the field participates in filter compilation.
    pub filterable: bool,
    /// Whether the field is in the bulk-update allow-list.
    pub bulk_editable: bool,
    /// Whether a comma-separated filter value is split into an OR group.
    pub multi_value: bool,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            column: name,
            kind: FieldKind::Text,
            filterable: true,
            bulk_editable: false,
            multi_value: false,
        }
    }

    const fn sentinel(name: &'static str) -> Self {
        Self {
            name,
            column: name,
            kind: FieldKind::SentinelText,
            filterable: true,
            bulk_editable: false,
            multi_value: false,
        }
    }

    const fn flag(name: &'static str) -> Self {
        Self {
            name,
            column: name,
            kind: FieldKind::Flag,
            filterable: true,
            bulk_editable: false,
            multi_value: false,
        }
    }

    fn editable(mut self) -> Self {
        self.bulk_editable = true;
        self
    }

    fn multi(mut self) -> Self {
        self.multi_value = true;
        self
    }

    fn unfilterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    /// Coerces a raw caller-supplied value into a typed [`FieldValue`].
    ///
    /// Flag fields accept exactly [`FLAG_TRUE_TOKEN`]/[`FLAG_FALSE_TOKEN`],
    /// case-insensitively. Blank values are rejected for every kind.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidValue`] on a kind mismatch.
    pub fn coerce(&self, raw: &str) -> Result<FieldValue, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: self.name.to_string(),
                value: raw.to_string(),
                reason: "value cannot be blank".to_string(),
            });
        }

        match self.kind {
            FieldKind::Text | FieldKind::SentinelText => {
                Ok(FieldValue::Text(trimmed.to_string()))
            }
            FieldKind::Flag => {
                if trimmed.eq_ignore_ascii_case(FLAG_TRUE_TOKEN) {
                    Ok(FieldValue::Flag(true))
                } else if trimmed.eq_ignore_ascii_case(FLAG_FALSE_TOKEN) {
                    Ok(FieldValue::Flag(false))
                } else {
                    Err(ValidationError::InvalidValue {
                        field: self.name.to_string(),
                        value: raw.to_string(),
                        reason: format!(
                            "expected {FLAG_TRUE_TOKEN} or {FLAG_FALSE_TOKEN}"
                        ),
                    })
                }
            }
        }
    }
}

/// The static catalog of register fields.
///
/// Declaration order is the contract: it drives both filter compilation and
/// the column shape of filtered exports, and is stable across calls.
#[derive(Debug)]
pub struct FieldRegistry {
    schema_version: u32,
    fields: Vec<FieldSpec>,
}

/// Fields of schema version 4 of the register.
///
/// Versions 1-3 lacked `collection_item`, `priority_power` and
/// `teaching_use`; additions append here so earlier positions never shift.
fn schema_v4() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("description"),
        FieldSpec::sentinel("owner").editable().multi(),
        FieldSpec::text("inventory_no"),
        FieldSpec::text("university_inventory_no"),
        FieldSpec::text("load_date"),
        FieldSpec::sentinel("site_code_main").editable(),
        FieldSpec::sentinel("site_code_branch").editable(),
        FieldSpec::text("destination").editable(),
        FieldSpec::flag("microscopy"),
        FieldSpec::flag("requires_refrigeration").editable(),
        FieldSpec::flag("high_specialty"),
        FieldSpec::flag("to_be_moved").editable(),
        FieldSpec::flag("self_transported").editable(),
        FieldSpec::flag("decommission"),
        FieldSpec::flag("collection_item"),
        FieldSpec::flag("priority_power"),
        FieldSpec::flag("teaching_use").editable(),
        FieldSpec::text("supplier"),
        FieldSpec::text("year_built"),
        FieldSpec::text("serial_no"),
        FieldSpec::text("category"),
        FieldSpec::text("classification"),
        FieldSpec::text("manufacturer"),
        FieldSpec::text("notes").editable(),
        FieldSpec::text("weight").unfilterable(),
        FieldSpec::text("dimensions").unfilterable(),
    ]
}

static REGISTRY: OnceLock<FieldRegistry> = OnceLock::new();

impl FieldRegistry {
    /// Returns the process-wide registry, initializing it on first use.
    pub fn current() -> &'static Self {
        REGISTRY.get_or_init(|| Self {
            schema_version: 4,
            fields: schema_v4(),
        })
    }

    /// The schema version this registry describes.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Looks up a field by its public name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Like [`lookup`](Self::lookup), but rejecting unknown names.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnknownField`] naming the offending field.
    pub fn resolve(&self, name: &str) -> Result<&FieldSpec, ValidationError> {
        self.lookup(name).ok_or_else(|| ValidationError::UnknownField {
            field: name.to_string(),
        })
    }

    /// All filterable fields, in declaration order.
    pub fn filterable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.filterable)
    }

    /// All bulk-editable fields, in declaration order.
    pub fn bulk_editable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.bulk_editable)
    }

    /// All registered flag columns, in declaration order.
    pub fn flag_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Flag)
            .map(|f| f.column)
    }
}
