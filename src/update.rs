//! The bulk field updater.
//!
//! Applies one new value to one field across a caller-supplied list of
//! record identifiers. Validation (allow-list membership, value coercion)
//! happens once, before the first write; each identifier's update is then
//! an independent unit whose failure is reported, never silently dropped
//! and never aborting the rest of the batch.

use serde::{Deserialize, Serialize};

use crate::audit::{with_caller_identity, CallerIdentity};
use crate::error::{RegisterResult, ValidationError};
use crate::field::FieldRegistry;
use crate::record::RecordId;
use crate::storage::InventoryStore;

/// One identifier the bulk update could not apply, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUpdate {
    /// The identifier that failed.
    pub id: RecordId,
    /// The storage error, rendered for the caller's summary.
    pub reason: String,
}

/// Outcome of a bulk update: which identifiers succeeded, which failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    /// Identifiers updated, in the order they were given.
    pub succeeded: Vec<RecordId>,
    /// Identifiers that failed, in the order they were given.
    pub failed: Vec<FailedUpdate>,
}

impl BulkResult {
    /// Number of identifiers successfully updated.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.succeeded.len()
    }

    /// True if at least one identifier failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Applies `raw_value` to `field` on every record in `ids`, in order,
/// attributing each write to `identity`.
///
/// The field must be in the bulk-editable allow-list (narrower than the
/// registry: identity and most descriptive fields are never bulk-edited)
/// and the value must coerce to the field's kind. Both checks run before
/// any record is touched.
///
/// # Errors
/// - [`ValidationError::UnknownField`] / [`ValidationError::NotBulkEditable`]
///   for a field outside the allow-list.
/// - [`ValidationError::InvalidValue`] for a raw value that does not fit
///   the field's kind (e.g. a flag token other than `SI`/`NO`).
///
/// Per-identifier storage failures are not errors: they are reported in
/// [`BulkResult::failed`] with the failing identifier attached.
pub fn bulk_update(
    store: &dyn InventoryStore,
    registry: &FieldRegistry,
    field: &str,
    raw_value: &str,
    ids: &[RecordId],
    identity: &CallerIdentity,
) -> RegisterResult<BulkResult> {
    let spec = registry.resolve(field)?;
    if !spec.bulk_editable {
        return Err(ValidationError::NotBulkEditable {
            field: field.to_string(),
        }
        .into());
    }
    let value = spec.coerce(raw_value)?;

    let result = with_caller_identity(store, identity, |scope| {
        let mut result = BulkResult::default();
        for &id in ids {
            match scope.update_field(id, spec.column, value.clone()) {
                Ok(()) => result.succeeded.push(id),
                Err(err) => result.failed.push(FailedUpdate {
                    id,
                    reason: err.to_string(),
                }),
            }
        }
        result
    });

    Ok(result)
}
