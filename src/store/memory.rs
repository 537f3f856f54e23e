//! In-memory document store with optional JSON file persistence
//!
//! - `_id` is assigned (UUID v4, simple form) when the record lacks one;
//!   numeric ids are stored as text, other non-string ids are rejected
//! - `__v` starts at 0
//! - `_id` and every registered unique field reject duplicate values;
//!   numbers are compared by value
//! - `flush` rewrites the whole data file as one JSON array

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::filter::RecordFilter;
use super::DocumentStore;
use crate::document::{values_equal, Document, ID_FIELD, VERSION_FIELD};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Document>,
    unique_fields: BTreeSet<String>,
    /// Data file, when file backed
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a file-backed store. A missing file starts empty.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let mut store = Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        };
        if !path.exists() {
            return Ok(store);
        }

        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: display.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(store);
        }

        let values: Vec<Value> =
            serde_json::from_str(&content).map_err(|e| StoreError::MalformedData {
                path: display.clone(),
                reason: e.to_string(),
            })?;
        for (i, value) in values.into_iter().enumerate() {
            let record = Document::from_value(value).ok_or_else(|| StoreError::MalformedData {
                path: display.clone(),
                reason: format!("entry {} is not an object", i),
            })?;
            store.records.push(record);
        }
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records(&self) -> &[Document] {
        &self.records
    }

    /// Assigns `_id` and `__v` when missing. Numeric ids are kept as text;
    /// other non-string ids are rejected.
    fn stamp(mut record: Document) -> StoreResult<Document> {
        let id = match record.get(ID_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) if id.trim().is_empty() => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => return Err(StoreError::InvalidId(other.clone())),
        };
        let id = id.unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        record.insert(ID_FIELD, Value::String(id));
        if !record.contains(VERSION_FIELD) {
            record.insert(VERSION_FIELD, Value::from(0));
        }
        Ok(record)
    }

    /// Rejects `record` if it repeats a unique value already held by the
    /// store or by `pending`.
    fn check_unique(&self, record: &Document, pending: &[Document]) -> StoreResult<()> {
        let keyed = std::iter::once(ID_FIELD).chain(self.unique_fields.iter().map(String::as_str));
        for field in keyed {
            let Some(value) = record.get_present(field) else {
                continue;
            };
            let taken = self
                .records
                .iter()
                .chain(pending)
                .any(|existing| existing.get(field).is_some_and(|v| values_equal(v, value)));
            if taken {
                return Err(StoreError::DuplicateKey {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn ensure_unique(&mut self, field: &str) {
        self.unique_fields.insert(field.to_string());
    }

    fn insert(&mut self, record: Document) -> StoreResult<Document> {
        let record = Self::stamp(record)?;
        self.check_unique(&record, &[])?;
        self.records.push(record.clone());
        Ok(record)
    }

    fn insert_all(&mut self, records: Vec<Document>) -> StoreResult<Vec<Document>> {
        let mut staged: Vec<Document> = Vec::with_capacity(records.len());
        for record in records {
            let record = Self::stamp(record)?;
            self.check_unique(&record, &staged)?;
            staged.push(record);
        }
        self.records.extend(staged.iter().cloned());
        Ok(staged)
    }

    fn find(&self, filter: &Document) -> StoreResult<Vec<Document>> {
        Ok(self
            .records
            .iter()
            .filter(|record| RecordFilter::matches(record, filter))
            .cloned()
            .collect())
    }

    fn delete(&mut self, filter: &Document) -> StoreResult<usize> {
        let before = self.records.len();
        self.records
            .retain(|record| !RecordFilter::matches(record, filter));
        Ok(before - self.records.len())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn flush(&mut self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let display = path.display().to_string();
        let content =
            serde_json::to_string_pretty(&self.records).map_err(|e| StoreError::MalformedData {
                path: display.clone(),
                reason: e.to_string(),
            })?;
        fs::write(path, content).map_err(|source| StoreError::Io {
            path: display,
            source,
        })
    }
}
