//! A schema bound to a document store
//!
//! Writes go through `validate` before reaching the store; reads come back
//! through `present`. Named helpers build equality filters and serve both
//! as static methods (`call_static`) and query helpers (`Query::helper`).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::errors::{ModelError, ModelResult};
use super::query::Query;
use crate::document::{Document, ID_FIELD};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{FieldType, Schema};
use crate::store::DocumentStore;
use crate::transform::{coerce, present, validate, PresentOptions};

/// Builds a filter from a helper argument
pub type FilterBuilder = Arc<dyn Fn(&Value) -> Document + Send + Sync>;

pub struct Model<S: DocumentStore> {
    schema: Schema,
    store: S,
    helpers: BTreeMap<String, FilterBuilder>,
}

impl<S: DocumentStore> Model<S> {
    /// Binds `schema` to `store`, registering the schema's unique fields.
    pub fn new(schema: Schema, mut store: S) -> Self {
        for field in schema.unique_fields() {
            store.ensure_unique(field);
        }
        Self {
            schema,
            store,
            helpers: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn flush(&mut self) -> ModelResult<()> {
        self.store.flush()?;
        Ok(())
    }

    /// Validates and persists one document, returning it as presented.
    pub fn insert_one(&mut self, candidate: &Document) -> ModelResult<Document> {
        let validated = self.checked(candidate)?;
        let stored = self.store.insert(validated)?;
        log_event_with_fields(
            Event::DocumentInserted,
            &[
                ("collection", self.schema.name()),
                ("id", stored.id().unwrap_or_default()),
            ],
        );
        Ok(present(&self.schema, &stored, &PresentOptions::new()))
    }

    /// Validates every candidate before persisting any of them.
    pub fn insert_many(&mut self, candidates: &[Document]) -> ModelResult<Vec<Document>> {
        let validated = candidates
            .iter()
            .map(|candidate| self.checked(candidate))
            .collect::<ModelResult<Vec<_>>>()?;
        let stored = self.store.insert_all(validated)?;
        let count = stored.len().to_string();
        log_event_with_fields(
            Event::DocumentsInserted,
            &[("collection", self.schema.name()), ("count", &count)],
        );
        Ok(stored
            .iter()
            .map(|record| present(&self.schema, record, &PresentOptions::new()))
            .collect())
    }

    pub fn find(&self, filter: Document) -> Query<'_, S> {
        Query::new(self, filter)
    }

    pub fn find_one(&self, filter: Document) -> ModelResult<Option<Document>> {
        self.find(filter).first()
    }

    /// Removes every matching record. An empty filter removes everything.
    pub fn delete_many(&mut self, filter: &Document) -> ModelResult<usize> {
        let filter = self.normalize_filter(filter);
        let removed = self.store.delete(&filter)?;
        let count = removed.to_string();
        log_event_with_fields(
            Event::DocumentsDeleted,
            &[("collection", self.schema.name()), ("count", &count)],
        );
        Ok(removed)
    }

    /// Registers a named filter builder.
    pub fn register_helper<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn(&Value) -> Document + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(builder));
    }

    /// Registers a helper matching `field` against the argument.
    pub fn register_field_helper(&mut self, name: impl Into<String>, field: impl Into<String>) {
        let field = field.into();
        self.register_helper(name, move |arg| {
            std::iter::once((field.clone(), arg.clone())).collect()
        });
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    pub(crate) fn helper_filter(&self, name: &str, arg: &Value) -> ModelResult<Document> {
        let builder = self
            .helpers
            .get(name)
            .ok_or_else(|| ModelError::UnknownHelper(name.to_string()))?;
        Ok(builder(arg))
    }

    /// Runs a helper directly on the model.
    pub fn call_static(&self, name: &str, arg: &Value) -> ModelResult<Vec<Document>> {
        let filter = self.helper_filter(name, arg)?;
        self.find(filter).exec()
    }

    /// Finds records sharing `field`'s value with `doc`, `doc` included.
    ///
    /// When `doc` carries an `_id`, the stored value is used, so documents
    /// already rewritten by getters still match.
    pub fn find_similar(&self, doc: &Document, field: &str) -> ModelResult<Vec<Document>> {
        let canonical = self
            .schema
            .canonical_name(field)
            .ok_or_else(|| ModelError::UnknownField(field.to_string()))?;

        let stored = match doc.id() {
            Some(id) => {
                let filter = single(ID_FIELD, Value::String(id.to_string()));
                self.store.find(&filter)?.into_iter().next()
            }
            None => None,
        };
        let source = stored.as_ref().unwrap_or(doc);

        match source.get_present(canonical) {
            Some(value) => self.find(single(canonical, value.clone())).exec(),
            None => Ok(Vec::new()),
        }
    }

    /// Rewrites filter keys to canonical names and casts values to the
    /// declared type where possible, so `{"fullName": "A"}` and
    /// `{"age": "20"}` match stored records.
    pub(crate) fn normalize_filter(&self, filter: &Document) -> Document {
        filter
            .iter()
            .map(|(key, value)| {
                let canonical = self.schema.canonical_name(key).unwrap_or(key);
                let declared = self
                    .schema
                    .field(canonical)
                    .and_then(|spec| spec.field_type.as_ref());
                let cast = declared.and_then(|ty| match (ty, value) {
                    (FieldType::Array(_), Value::Array(_)) => coerce(value, ty).ok(),
                    (FieldType::Array(inner), _) => coerce(value, inner).ok(),
                    _ => coerce(value, ty).ok(),
                });
                (canonical.to_string(), cast.unwrap_or_else(|| value.clone()))
            })
            .collect()
    }

    fn checked(&self, candidate: &Document) -> ModelResult<Document> {
        validate(&self.schema, candidate).map_err(|failure| {
            let count = failure.len().to_string();
            log_event_with_fields(
                Event::DocumentRejected,
                &[("collection", self.schema.name()), ("violations", &count)],
            );
            ModelError::from(failure)
        })
    }
}

pub(crate) fn single(field: &str, value: Value) -> Document {
    std::iter::once((field.to_string(), value)).collect()
}
