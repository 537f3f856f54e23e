//! Document store adapter
//!
//! The transformer never touches a store. A store receives validated
//! documents and hands raw records back for presentation. Stores own the
//! `_id` and `__v` bookkeeping fields and enforce uniqueness.

mod errors;
mod filter;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use filter::RecordFilter;
pub use memory::MemoryStore;

use crate::document::Document;

/// Persistence seam between the model and a concrete store.
pub trait DocumentStore {
    /// Registers a field whose values must be unique across records.
    fn ensure_unique(&mut self, field: &str);

    /// Persists one record and returns it as stored.
    fn insert(&mut self, record: Document) -> StoreResult<Document>;

    /// Persists a batch. Implementations should persist nothing when any
    /// record is rejected.
    fn insert_all(&mut self, records: Vec<Document>) -> StoreResult<Vec<Document>> {
        records.into_iter().map(|r| self.insert(r)).collect()
    }

    /// Copies of every record matching the equality filter.
    fn find(&self, filter: &Document) -> StoreResult<Vec<Document>>;

    /// Removes every matching record, returning how many were removed.
    fn delete(&mut self, filter: &Document) -> StoreResult<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes writes durable. In-memory stores have nothing to do.
    fn flush(&mut self) -> StoreResult<()> {
        Ok(())
    }
}
