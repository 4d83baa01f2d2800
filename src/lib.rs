//! # asset-register
//!
//! The query and compliance core of a physical asset register. It turns
//! open-ended per-field filter requests into safe, parameterized
//! predicates over the register schema, evaluates a logistics
//! non-conformance rule per record and as an aggregate count, and applies
//! validated bulk field updates with audit attribution.
//!
//! The surrounding web application (authentication, forms, spreadsheet
//! import, label printing) is an external collaborator: it parses
//! requests, calls this engine, and renders the results. The only I/O
//! boundary is the [`InventoryStore`] trait.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use asset_register::{
//!     CallerIdentity, FilterRequest, InMemoryInventoryStore, InventoryRecord,
//!     RecordId, RegisterEngine, SearchOutcome,
//! };
//!
//! let store = Arc::new(InMemoryInventoryStore::new());
//! let mut record = InventoryRecord::new(RecordId(0), "Vacuum pump");
//! record.owner = Some("Rossi".to_string());
//! store.seed(record);
//!
//! let engine = RegisterEngine::new(store);
//! let request = FilterRequest::new().with("owner", "Rossi");
//! let SearchOutcome::Listing(rows) = engine.search(&request)? else {
//!     unreachable!("a constraint was supplied");
//! };
//! assert_eq!(rows.len(), 1);
//! # Ok::<(), asset_register::RegisterError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod audit;
pub mod compliance;
pub mod engine;
pub mod error;
pub mod field;
pub mod filter;
pub mod record;
pub mod storage;
pub mod update;

// Re-export primary types at crate root for convenience
pub use audit::{with_caller_identity, AuditEntry, AuditScope, CallerIdentity};
pub use compliance::{ComplianceContext, ComplianceRule, DIMENSIONS_PATTERN, WEIGHT_PATTERN};
pub use engine::{ListedRecord, RegisterEngine, SearchOutcome};
pub use error::{RegisterError, RegisterResult, ValidationError};
pub use field::{FieldKind, FieldRegistry, FieldSpec, FieldValue};
pub use filter::{
    compile_filter, CompiledFilter, Condition, FilterRequest, UNASSIGNED_SENTINEL,
};
pub use record::{InventoryRecord, RecordId};
pub use storage::{InMemoryInventoryStore, InventoryStore, StorageError};
pub use update::{bulk_update, BulkResult, FailedUpdate};
