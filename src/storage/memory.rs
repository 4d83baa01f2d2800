//! In-memory storage backend.
//!
//! Thread-safe reference implementation of [`InventoryStore`], used by the
//! test suites and by embedded callers. It answers compiled filters by
//! direct evaluation and keeps its own audit log, standing in for the
//! database trigger a SQL backend would rely on.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::audit::{AuditEntry, CallerIdentity};
use crate::compliance::ComplianceRule;
use crate::field::FieldValue;
use crate::filter::CompiledFilter;
use crate::record::{InventoryRecord, RecordId};
use crate::storage::traits::{InventoryStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// In-memory record store with an attached audit log.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    records: RwLock<BTreeMap<RecordId, InventoryRecord>>,
    audit: RwLock<Vec<AuditEntry>>,
    next_id: AtomicI64,
}

impl InMemoryInventoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            audit: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Inserts a record, assigning it the next identity.
    ///
    /// Record creation is an external collaborator's operation; this
    /// helper exists so tests and embedded callers can populate state.
    /// A pre-set `deleted` marker is kept, so deleted rows can be seeded.
    ///
    /// # Panics
    /// Panics if the record lock is poisoned.
    pub fn seed(&self, mut record: InventoryRecord) -> RecordId {
        let id = RecordId(self.next_id.fetch_add(1, Ordering::SeqCst));
        record.id = id;
        self.records
            .write()
            .expect("record lock poisoned")
            .insert(id, record);
        id
    }

    /// A snapshot of the audit log, in write order.
    #[must_use]
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.read().map(|log| log.clone()).unwrap_or_default()
    }
}

fn listing_order(a: &InventoryRecord, b: &InventoryRecord) -> std::cmp::Ordering {
    a.description.cmp(&b.description).then(a.id.cmp(&b.id))
}

impl InventoryStore for InMemoryInventoryStore {
    fn search(&self, filter: &CompiledFilter) -> Result<Vec<InventoryRecord>, StorageError> {
        let records = self.records.read().map_err(|_| lock_err("search"))?;
        let mut matched: Vec<InventoryRecord> = records
            .values()
            .filter(|r| r.is_active() && filter.matches(r))
            .cloned()
            .collect();
        matched.sort_by(listing_order);
        Ok(matched)
    }

    fn get(&self, id: RecordId) -> Result<Option<InventoryRecord>, StorageError> {
        let records = self.records.read().map_err(|_| lock_err("get"))?;
        Ok(records.get(&id).filter(|r| r.is_active()).cloned())
    }

    fn count_non_conformant(
        &self,
        filter: &CompiledFilter,
        rule: &ComplianceRule,
    ) -> Result<u64, StorageError> {
        let records = self.records.read().map_err(|_| lock_err("count"))?;
        let count = records
            .values()
            .filter(|r| r.is_active() && filter.matches(r))
            .filter(|r| rule.is_non_conformant(&r.compliance_context()))
            .count();
        Ok(count as u64)
    }

    fn update_field(
        &self,
        id: RecordId,
        column: &str,
        value: FieldValue,
        identity: &CallerIdentity,
    ) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| lock_err("update"))?;
        let record = records
            .get_mut(&id)
            .filter(|r| r.is_active())
            .ok_or(StorageError::RecordNotFound(id))?;

        match value {
            // The flag map is open: any flag column name is writable.
            FieldValue::Flag(flag) => record.set_flag(column, flag),
            FieldValue::Text(text) => {
                if !record.set_text_column(column, text) {
                    return Err(StorageError::UnknownColumn(column.to_string()));
                }
            }
        }

        let entry = AuditEntry::new(format!("UPDATE {column}"), id, identity);
        self.audit
            .write()
            .map_err(|_| lock_err("audit"))?
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldRegistry;
    use crate::filter::{compile_filter, FilterRequest};

    fn identity() -> CallerIdentity {
        CallerIdentity::new("tester@example.edu").unwrap()
    }

    fn seeded_store() -> InMemoryInventoryStore {
        let store = InMemoryInventoryStore::new();

        let mut a = InventoryRecord::new(RecordId(0), "Beta centrifuge");
        a.owner = Some("Rossi".to_string());
        store.seed(a);

        let mut b = InventoryRecord::new(RecordId(0), "Alpha pump");
        b.owner = Some("Bianchi".to_string());
        b.set_flag("to_be_moved", true);
        store.seed(b);

        let mut deleted = InventoryRecord::new(RecordId(0), "Alpha pump");
        deleted.deleted = Some(chrono::Utc::now());
        store.seed(deleted);

        store
    }

    fn compiled(request: &FilterRequest) -> CompiledFilter {
        compile_filter(FieldRegistry::current(), request).unwrap()
    }

    #[test]
    fn test_search_excludes_deleted_and_orders_by_description() {
        let store = seeded_store();
        let filter = compiled(&FilterRequest::new().with("description", "a"));
        let rows = store.search(&filter).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(names, vec!["Alpha pump", "Beta centrifuge"]);
    }

    #[test]
    fn test_search_ties_break_on_id() {
        let store = InMemoryInventoryStore::new();
        let first = store.seed(InventoryRecord::new(RecordId(0), "Same"));
        let second = store.seed(InventoryRecord::new(RecordId(0), "Same"));
        let filter = compiled(&FilterRequest::new().with("description", "Same"));
        let ids: Vec<RecordId> = store
            .search(&filter)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_get_hides_deleted() {
        let store = InMemoryInventoryStore::new();
        let mut record = InventoryRecord::new(RecordId(0), "Gone");
        record.deleted = Some(chrono::Utc::now());
        let id = store.seed(record);
        assert!(store.get(id).unwrap().is_none());
    }

    #[test]
    fn test_update_field_records_audit_entry() {
        let store = seeded_store();
        let filter = compiled(&FilterRequest::new().with("owner", "Rossi"));
        let id = store.search(&filter).unwrap()[0].id;

        store
            .update_field(id, "destination", FieldValue::Text("Hall B".to_string()), &identity())
            .unwrap();

        assert_eq!(store.get(id).unwrap().unwrap().destination, "Hall B");
        let entries = store.audit_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, "UPDATE destination");
        assert_eq!(entries[0].executed_by, "tester@example.edu");
    }

    #[test]
    fn test_update_missing_record_fails() {
        let store = InMemoryInventoryStore::new();
        let err = store
            .update_field(
                RecordId(99),
                "notes",
                FieldValue::Text("x".to_string()),
                &identity(),
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::RecordNotFound(RecordId(99))));
        assert!(store.audit_entries().is_empty());
    }

    #[test]
    fn test_update_deleted_record_fails() {
        let store = InMemoryInventoryStore::new();
        let mut record = InventoryRecord::new(RecordId(0), "Gone");
        record.deleted = Some(chrono::Utc::now());
        let id = store.seed(record);
        let err = store
            .update_field(id, "notes", FieldValue::Text("x".to_string()), &identity())
            .unwrap_err();
        assert!(matches!(err, StorageError::RecordNotFound(_)));
    }

    #[test]
    fn test_update_unknown_text_column_fails() {
        let store = seeded_store();
        let filter = compiled(&FilterRequest::new().with("owner", "Rossi"));
        let id = store.search(&filter).unwrap()[0].id;
        let err = store
            .update_field(id, "no_such", FieldValue::Text("x".to_string()), &identity())
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownColumn(_)));
    }

    #[test]
    fn test_count_non_conformant_matches_row_level_rule() {
        let store = seeded_store();
        let rule = ComplianceRule::current();
        // "Alpha pump" is flagged for movement with no measurements.
        let filter = compiled(&FilterRequest::new().with("description", "a"));
        assert_eq!(store.count_non_conformant(&filter, rule).unwrap(), 1);

        let rows = store.search(&filter).unwrap();
        let row_level = rows
            .iter()
            .filter(|r| rule.is_non_conformant(&r.compliance_context()))
            .count() as u64;
        assert_eq!(store.count_non_conformant(&filter, rule).unwrap(), row_level);
    }
}
