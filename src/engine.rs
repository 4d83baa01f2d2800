//! The register engine: the external interface of the core.
//!
//! The web-layer collaborator parses a request, then calls into this
//! facade: compile a filter, run a listing (each row enriched with its
//! non-conformance boolean), count non-conformant records under a
//! predicate, or apply a bulk field update. The engine owns no state
//! beyond a handle to the storage backend; the field registry and the
//! compliance rule are the process-wide singletons.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audit::CallerIdentity;
use crate::compliance::{ComplianceContext, ComplianceRule};
use crate::error::RegisterResult;
use crate::field::FieldRegistry;
use crate::filter::{compile_filter, CompiledFilter, FilterRequest};
use crate::record::{InventoryRecord, RecordId};
use crate::storage::InventoryStore;
use crate::update::{bulk_update, BulkResult};

/// One listing row: the record plus its computed non-conformance flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedRecord {
    /// The record.
    pub record: InventoryRecord,
    /// Per-row form of the compliance rule.
    pub non_conformant: bool,
}

/// Outcome of a search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "rows", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Every supplied value was absent or blank; no query was executed.
    /// Whether that renders as "no results" or "refine your search" is the
    /// caller's decision.
    NoFilter,
    /// The executed listing, in `description ASC, id ASC` order.
    Listing(Vec<ListedRecord>),
}

/// The query-and-compliance engine over a pluggable storage backend.
#[derive(Clone)]
pub struct RegisterEngine {
    store: Arc<dyn InventoryStore>,
}

impl RegisterEngine {
    /// Creates an engine over the given backend.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// The field registry in force.
    #[must_use]
    pub fn registry(&self) -> &'static FieldRegistry {
        FieldRegistry::current()
    }

    /// The compliance rule in force.
    #[must_use]
    pub fn rule(&self) -> &'static ComplianceRule {
        ComplianceRule::current()
    }

    /// Compiles a filter request against the registry.
    ///
    /// # Errors
    /// Rejects the whole request on an unknown field or a malformed flag
    /// token.
    pub fn compile_filter(&self, request: &FilterRequest) -> RegisterResult<CompiledFilter> {
        Ok(compile_filter(self.registry(), request)?)
    }

    /// Compiles and runs a listing, enriching each row with the per-row
    /// compliance evaluation.
    ///
    /// # Errors
    /// Compilation errors reject the request; storage errors propagate.
    pub fn search(&self, request: &FilterRequest) -> RegisterResult<SearchOutcome> {
        let compiled = self.compile_filter(request)?;
        if compiled.is_empty() {
            return Ok(SearchOutcome::NoFilter);
        }

        let rule = self.rule();
        let rows = self
            .store
            .search(&compiled)?
            .into_iter()
            .map(|record| {
                let non_conformant = rule.is_non_conformant(&record.compliance_context());
                ListedRecord {
                    record,
                    non_conformant,
                }
            })
            .collect();
        Ok(SearchOutcome::Listing(rows))
    }

    /// Evaluates the compliance rule for one record's attributes.
    #[must_use]
    pub fn is_non_conformant(&self, ctx: &ComplianceContext) -> bool {
        self.rule().is_non_conformant(ctx)
    }

    /// Counts non-conformant records among those matching `filter`.
    ///
    /// An empty filter counts over the whole active register; the
    /// no-filter guard applies to listings, not to this aggregate.
    ///
    /// # Errors
    /// Storage errors propagate unmodified.
    pub fn count_non_conformant(&self, filter: &CompiledFilter) -> RegisterResult<u64> {
        Ok(self.store.count_non_conformant(filter, self.rule())?)
    }

    /// Applies one value to one field across `ids`, attributed to
    /// `identity`. See [`bulk_update`].
    ///
    /// # Errors
    /// Validation errors reject the request before any write.
    pub fn bulk_update(
        &self,
        field: &str,
        raw_value: &str,
        ids: &[RecordId],
        identity: &CallerIdentity,
    ) -> RegisterResult<BulkResult> {
        bulk_update(
            self.store.as_ref(),
            self.registry(),
            field,
            raw_value,
            ids,
            identity,
        )
    }
}
