//! Storage abstraction for the asset register.
//!
//! The core never performs I/O itself; it is expressed as transformations
//! over the [`InventoryStore`] trait. The in-memory backend is the
//! reference implementation, used by tests and embedded callers.

mod memory;
mod traits;

pub use memory::InMemoryInventoryStore;
pub use traits::{InventoryStore, StorageError};
