//! Inventory records: one row per physical asset.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceContext;

/// Identifier of an inventory record, assigned by storage at creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One row of the asset register.
///
/// Owner and site codes distinguish NULL from empty string at the storage
/// layer, but the two compare as equal "unassigned" states everywhere in
/// this core. Flags live in an open map because the flag set has grown over
/// the register's life; an absent flag reads as false, matching the
/// tri-state `IS` comparison on a nullable boolean column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Storage-assigned identity.
    pub id: RecordId,
    /// Asset description.
    pub description: String,
    /// Register inventory number. No uniqueness is enforced.
    pub inventory_no: String,
    /// University-level inventory number.
    pub university_inventory_no: String,
    /// Date the asset was loaded into the register (free text).
    pub load_date: String,
    /// Responsible party. `None` and `Some("")` both mean unassigned.
    pub owner: Option<String>,
    /// Site code at the main campus.
    pub site_code_main: Option<String>,
    /// Site code at the branch campus.
    pub site_code_branch: Option<String>,
    /// Destination after the move.
    pub destination: String,
    /// Supplier name.
    pub supplier: String,
    /// Year of manufacture (free text).
    pub year_built: String,
    /// Serial number.
    pub serial_no: String,
    /// Inventory category.
    pub category: String,
    /// Material/instrumentation classification.
    pub classification: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Free-form notes.
    pub notes: String,
    /// Weight, expected to be a decimal number when the compliance rule
    /// applies.
    pub weight: String,
    /// Dimensions, expected as `WxHxD` integers when the rule applies.
    pub dimensions: String,
    /// Optional quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    /// Named boolean flags. Absent flags read as false.
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    /// Soft-delete marker: `None` = active, `Some(_)` = deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    /// Creates an active record with the given id and description and every
    /// other column empty.
    #[must_use]
    pub fn new(id: RecordId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            inventory_no: String::new(),
            university_inventory_no: String::new(),
            load_date: String::new(),
            owner: None,
            site_code_main: None,
            site_code_branch: None,
            destination: String::new(),
            supplier: String::new(),
            year_built: String::new(),
            serial_no: String::new(),
            category: String::new(),
            classification: String::new(),
            manufacturer: String::new(),
            notes: String::new(),
            weight: String::new(),
            dimensions: String::new(),
            quantity: None,
            flags: BTreeMap::new(),
            deleted: None,
        }
    }

    /// Returns true if the record has not been soft-deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted.is_none()
    }

    /// Reads a flag column. Absent flags are false.
    #[must_use]
    pub fn flag(&self, column: &str) -> bool {
        self.flags.get(column).copied().unwrap_or(false)
    }

    /// Sets a flag column.
    pub fn set_flag(&mut self, column: impl Into<String>, value: bool) {
        self.flags.insert(column.into(), value);
    }

    /// Reads a text column by its storage name.
    ///
    /// Optional columns (owner, site codes) surface `None` and `Some("")`
    /// alike as the empty string. Returns `None` for names that are not
    /// text columns of this record.
    #[must_use]
    pub fn text_column(&self, column: &str) -> Option<&str> {
        let value = match column {
            "description" => &self.description,
            "inventory_no" => &self.inventory_no,
            "university_inventory_no" => &self.university_inventory_no,
            "load_date" => &self.load_date,
            "owner" => return Some(self.owner.as_deref().unwrap_or("")),
            "site_code_main" => return Some(self.site_code_main.as_deref().unwrap_or("")),
            "site_code_branch" => {
                return Some(self.site_code_branch.as_deref().unwrap_or(""))
            }
            "destination" => &self.destination,
            "supplier" => &self.supplier,
            "year_built" => &self.year_built,
            "serial_no" => &self.serial_no,
            "category" => &self.category,
            "classification" => &self.classification,
            "manufacturer" => &self.manufacturer,
            "notes" => &self.notes,
            "weight" => &self.weight,
            "dimensions" => &self.dimensions,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Writes a text column by its storage name. Returns false for names
    /// that are not text columns of this record.
    pub fn set_text_column(&mut self, column: &str, value: String) -> bool {
        match column {
            "description" => self.description = value,
            "inventory_no" => self.inventory_no = value,
            "university_inventory_no" => self.university_inventory_no = value,
            "load_date" => self.load_date = value,
            "owner" => self.owner = Some(value),
            "site_code_main" => self.site_code_main = Some(value),
            "site_code_branch" => self.site_code_branch = Some(value),
            "destination" => self.destination = value,
            "supplier" => self.supplier = value,
            "year_built" => self.year_built = value,
            "serial_no" => self.serial_no = value,
            "category" => self.category = value,
            "classification" => self.classification = value,
            "manufacturer" => self.manufacturer = value,
            "notes" => self.notes = value,
            "weight" => self.weight = value,
            "dimensions" => self.dimensions = value,
            _ => return false,
        }
        true
    }

    /// Projects the attributes the compliance rule evaluates.
    #[must_use]
    pub fn compliance_context(&self) -> ComplianceContext {
        ComplianceContext {
            collection_item: self.flag("collection_item"),
            to_be_moved: self.flag("to_be_moved"),
            self_transported: self.flag("self_transported"),
            weight: self.weight.clone(),
            dimensions: self.dimensions.clone(),
        }
    }
}
