//! The abstract storage contract the core consumes.

use thiserror::Error;

use crate::audit::CallerIdentity;
use crate::compliance::ComplianceRule;
use crate::field::FieldValue;
use crate::filter::CompiledFilter;
use crate::record::{InventoryRecord, RecordId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record not found or soft-deleted.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    /// The column name does not exist on the record table.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Backend error (constraint violation, malformed state, ...).
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Connection failed.
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Storage contract for the register's record table.
///
/// Read paths exclude soft-deleted records and order listings by
/// [`CompiledFilter::ORDER_BY`]. Access is connection-scoped per logical
/// operation; the core never holds a connection across operations.
///
/// Concurrent writers over overlapping record sets are not coordinated
/// here: the last write wins. That is an accepted design limit of the
/// register, not a defect to paper over in an implementation.
pub trait InventoryStore: Send + Sync {
    /// Runs a compiled filter, returning active records in listing order.
    ///
    /// Callers must not pass an empty filter; emptiness means "no filter
    /// supplied" and is handled above the storage layer.
    ///
    /// # Errors
    /// Backend failures only; an empty result set is `Ok(vec![])`.
    fn search(&self, filter: &CompiledFilter) -> Result<Vec<InventoryRecord>, StorageError>;

    /// Fetches one active record.
    ///
    /// # Errors
    /// Backend failures only; a missing or deleted record is `Ok(None)`.
    fn get(&self, id: RecordId) -> Result<Option<InventoryRecord>, StorageError>;

    /// Counts the active records matching `filter` that the rule marks
    /// non-conformant. Aggregate form of the per-row evaluation; both are
    /// backed by the same rule definition.
    ///
    /// # Errors
    /// Backend failures only.
    fn count_non_conformant(
        &self,
        filter: &CompiledFilter,
        rule: &ComplianceRule,
    ) -> Result<u64, StorageError>;

    /// Writes one field of one active record, attributed to `identity`.
    ///
    /// # Errors
    /// - [`StorageError::RecordNotFound`] if the record is missing or
    ///   soft-deleted.
    /// - [`StorageError::UnknownColumn`] if the column does not exist.
    fn update_field(
        &self,
        id: RecordId,
        column: &str,
        value: FieldValue,
        identity: &CallerIdentity,
    ) -> Result<(), StorageError>;
}
