//! Audit attribution for mutating operations.
//!
//! Every write issued through this core carries the identity of the caller
//! performing it. The guarantee is structural, not conventional: the
//! storage trait's only mutating method requires a [`CallerIdentity`], and
//! the bulk updater issues its writes through an [`AuditScope`] whose
//! identity cannot outlive the scope. An external mechanism (a database
//! trigger or change-capture process) consumes the attribution; this core
//! only ever attaches it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::field::FieldValue;
use crate::record::RecordId;
use crate::storage::{InventoryStore, StorageError};

/// The identity a mutating operation is attributed to.
///
/// Construction validates non-emptiness, so holding a `CallerIdentity`
/// proves there is something to attribute writes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Creates an identity from a non-blank string.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyIdentity`] if the input is empty
    /// after trimming.
    pub fn new(identity: impl Into<String>) -> Result<Self, ValidationError> {
        let identity = identity.into();
        let trimmed = identity.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyIdentity);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the audit trail, as the audit mechanism consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry id.
    pub id: Uuid,
    /// What happened, e.g. `UPDATE owner`.
    pub operation: String,
    /// The record the operation touched.
    pub record_id: RecordId,
    /// Who performed it.
    pub executed_by: String,
    /// When it was recorded.
    pub executed_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry stamped now.
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        record_id: RecordId,
        identity: &CallerIdentity,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation: operation.into(),
            record_id,
            executed_by: identity.as_str().to_string(),
            executed_at: Utc::now(),
        }
    }
}

/// A write handle bound to one caller identity.
///
/// Writes issued through the scope carry its identity; the scope borrows
/// both the store and the identity, so neither can leak past the closure
/// given to [`with_caller_identity`].
pub struct AuditScope<'a> {
    store: &'a dyn InventoryStore,
    identity: &'a CallerIdentity,
}

impl AuditScope<'_> {
    /// The identity writes in this scope are attributed to.
    #[must_use]
    pub fn identity(&self) -> &CallerIdentity {
        self.identity
    }

    /// Updates one field of one record, attributed to the scope identity.
    ///
    /// # Errors
    /// Propagates the storage error unmodified.
    pub fn update_field(
        &self,
        id: RecordId,
        column: &str,
        value: FieldValue,
    ) -> Result<(), StorageError> {
        self.store.update_field(id, column, value, self.identity)
    }
}

/// Runs `op` inside an identity scope over `store`.
///
/// All mutating paths of this core go through here; establishing the scope
/// before the first write is what makes a missing identity a compile
/// error rather than a runtime surprise.
pub fn with_caller_identity<R>(
    store: &dyn InventoryStore,
    identity: &CallerIdentity,
    op: impl FnOnce(&AuditScope<'_>) -> R,
) -> R {
    let scope = AuditScope { store, identity };
    op(&scope)
}
