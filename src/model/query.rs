//! Query builder over a model
//!
//! Execution order:
//! 1. Normalize the filter (aliases, casts)
//! 2. Fetch matching records from the store
//! 3. Apply limit
//! 4. Present each record with the query's selection
//! 5. Replace populated reference ids with the referenced documents

use serde_json::Value;

use super::errors::{ModelError, ModelResult};
use super::model::{single, Model};
use crate::document::{Document, ID_FIELD};
use crate::observability::{log_event_with_fields, Event};
use crate::store::DocumentStore;
use crate::transform::{present, PresentOptions};

pub struct Query<'m, S: DocumentStore> {
    model: &'m Model<S>,
    filter: Document,
    options: PresentOptions,
    populate: Vec<String>,
    limit: Option<usize>,
}

impl<'m, S: DocumentStore> Query<'m, S> {
    pub(crate) fn new(model: &'m Model<S>, filter: Document) -> Self {
        Self {
            model,
            filter,
            options: PresentOptions::new(),
            populate: Vec::new(),
            limit: None,
        }
    }

    /// Adds an equality condition
    pub fn where_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter.insert(field, value);
        self
    }

    /// Merges the filter built by a registered helper.
    pub fn helper(mut self, name: &str, arg: &Value) -> ModelResult<Self> {
        let extra = self.model.helper_filter(name, arg)?;
        for (field, value) in extra.iter() {
            self.filter.insert(field.clone(), value.clone());
        }
        Ok(self)
    }

    /// Sets the field selection, e.g. `"+importantId"`.
    pub fn select(mut self, selection: &str) -> ModelResult<Self> {
        self.options = PresentOptions::parse(selection)?;
        Ok(self)
    }

    pub fn with_options(mut self, options: PresentOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the ids held by `field` with the referenced documents.
    pub fn populate(mut self, field: impl Into<String>) -> Self {
        self.populate.push(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn exec(self) -> ModelResult<Vec<Document>> {
        let schema = self.model.schema();
        let targets = self.populate_targets()?;
        let filter = self.model.normalize_filter(&self.filter);

        let mut records = self.model.store().find(&filter)?;
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }

        let mut results = Vec::with_capacity(records.len());
        for record in &records {
            let mut presented = present(schema, record, &self.options);
            for field in &targets {
                self.populate_field(&mut presented, field)?;
            }
            results.push(presented);
        }

        let count = results.len().to_string();
        log_event_with_fields(
            Event::QueryExecuted,
            &[("collection", schema.name()), ("returned", &count)],
        );
        Ok(results)
    }

    pub fn first(self) -> ModelResult<Option<Document>> {
        Ok(self.limit(1).exec()?.into_iter().next())
    }

    /// Canonical names of the fields to populate, checked against the schema.
    fn populate_targets(&self) -> ModelResult<Vec<String>> {
        let schema = self.model.schema();
        self.populate
            .iter()
            .map(|name| {
                let spec = schema
                    .field(name)
                    .ok_or_else(|| ModelError::UnknownField(name.clone()))?;
                let holds_refs = spec
                    .field_type
                    .as_ref()
                    .is_some_and(|ty| ty.holds_references());
                if !holds_refs {
                    return Err(ModelError::NotAReference(spec.name.clone()));
                }
                if let Some(collection) = &spec.reference {
                    if collection != schema.name() {
                        return Err(ModelError::ForeignReference {
                            field: spec.name.clone(),
                            collection: collection.clone(),
                        });
                    }
                }
                Ok(spec.name.clone())
            })
            .collect()
    }

    /// Unknown ids are dropped from arrays and become null for single
    /// references. A field removed by the selection or transform is skipped.
    fn populate_field(&self, presented: &mut Document, field: &str) -> ModelResult<()> {
        let Some(value) = presented.get(field).cloned() else {
            return Ok(());
        };
        let resolved = match value {
            Value::Array(ids) => {
                let mut docs = Vec::with_capacity(ids.len());
                for id in &ids {
                    if let Some(doc) = self.lookup(id)? {
                        docs.push(doc.into_value());
                    }
                }
                Value::Array(docs)
            }
            Value::Null => Value::Null,
            id => self
                .lookup(&id)?
                .map(Document::into_value)
                .unwrap_or(Value::Null),
        };
        presented.insert(field, resolved);
        Ok(())
    }

    fn lookup(&self, id: &Value) -> ModelResult<Option<Document>> {
        let records = self.model.store().find(&single(ID_FIELD, id.clone()))?;
        Ok(records
            .first()
            .map(|record| present(self.model.schema(), record, &PresentOptions::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, FieldType, SchemaBuilder};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    fn model() -> Model<MemoryStore> {
        let schema = SchemaBuilder::new("users")
            .field(FieldSpec::new("name", FieldType::String))
            .field(FieldSpec::new("type", FieldType::String))
            .field(FieldSpec::new("importantId", FieldType::String).hidden())
            .field(
                FieldSpec::new("friends", FieldType::array_of(FieldType::Reference))
                    .references("users"),
            )
            .field(FieldSpec::new("manager", FieldType::Reference))
            .field(
                FieldSpec::new("team", FieldType::array_of(FieldType::Reference))
                    .references("teams"),
            )
            .build()
            .unwrap();
        let mut model = Model::new(schema, MemoryStore::new());
        model.register_field_helper("byName", "name");
        model
    }

    #[test]
    fn test_select_includes_hidden_field() {
        let mut model = model();
        model
            .insert_one(&doc(json!({"name": "A", "importantId": "k1"})))
            .unwrap();

        let plain = model.find(Document::new()).exec().unwrap();
        assert!(!plain[0].contains("importantId"));

        let selected = model
            .find(Document::new())
            .select("+importantId")
            .unwrap()
            .exec()
            .unwrap();
        assert_eq!(selected[0].get("importantId"), Some(&json!("k1")));
    }

    #[test]
    fn test_query_helper_and_limit() {
        let mut model = model();
        model.insert_one(&doc(json!({"name": "Alice", "type": "admin"}))).unwrap();
        model.insert_one(&doc(json!({"name": "Alice", "type": "user"}))).unwrap();

        let found = model
            .find(Document::new())
            .helper("byName", &json!("Alice"))
            .unwrap()
            .exec()
            .unwrap();
        assert_eq!(found.len(), 2);

        let first = model
            .find(Document::new())
            .where_eq("type", json!("user"))
            .first()
            .unwrap()
            .unwrap();
        assert_eq!(first.get("type"), Some(&json!("user")));
    }

    #[test]
    fn test_populate_array_and_single() {
        let mut model = model();
        let bob = model.insert_one(&doc(json!({"_id": "bob", "name": "Bob"}))).unwrap();
        model
            .insert_one(&doc(json!({
                "name": "Sounak",
                "friends": [bob.id().unwrap(), "ghost"],
                "manager": "bob"
            })))
            .unwrap();

        let me = model
            .find(doc(json!({"name": "Sounak"})))
            .populate("friends")
            .populate("manager")
            .first()
            .unwrap()
            .unwrap();

        let friends = me.get("friends").unwrap().as_array().unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0]["name"], json!("Bob"));
        assert_eq!(me.get("manager").unwrap()["name"], json!("Bob"));
    }

    #[test]
    fn test_populate_rejects_non_reference_fields() {
        let model = model();
        let err = model.find(Document::new()).populate("name").exec().unwrap_err();
        assert!(matches!(err, ModelError::NotAReference(_)));

        let err = model.find(Document::new()).populate("team").exec().unwrap_err();
        assert!(matches!(err, ModelError::ForeignReference { .. }));

        let err = model.find(Document::new()).populate("frineds").exec().unwrap_err();
        assert!(matches!(err, ModelError::UnknownField(_)));
    }

    #[test]
    fn test_bad_selection_rejected() {
        let model = model();
        assert!(model.find(Document::new()).select("+").is_err());
    }
}
