//! Operations accepted by `docshape run`, one JSON object per line
//!
//! ```json
//! {"op": "insert", "doc": {"name": "Alice"}}
//! {"op": "insertMany", "docs": [{"name": "A"}, {"name": "B"}]}
//! {"op": "find", "filter": {"type": "admin"}, "select": "+importantId", "populate": ["friends"]}
//! {"op": "findOne", "helper": {"name": "byName", "arg": "Bob"}}
//! {"op": "delete", "filter": {}}
//! {"op": "similar", "id": "<_id>", "field": "type"}
//! {"op": "call", "helper": "byName", "arg": "Bob"}
//! ```

use serde::Deserialize;
use serde_json::{json, Value};

use crate::document::{Document, ID_FIELD};
use crate::model::{Model, ModelResult, Query};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    Insert {
        doc: Document,
    },
    InsertMany {
        docs: Vec<Document>,
    },
    Find(QuerySpec),
    FindOne(QuerySpec),
    Delete {
        #[serde(default)]
        filter: Document,
    },
    Similar {
        id: String,
        field: String,
    },
    Call {
        helper: String,
        #[serde(default)]
        arg: Value,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::InsertMany { .. } => "insertMany",
            Operation::Find(_) => "find",
            Operation::FindOne(_) => "findOne",
            Operation::Delete { .. } => "delete",
            Operation::Similar { .. } => "similar",
            Operation::Call { .. } => "call",
        }
    }
}

/// Query parameters shared by `find` and `findOne`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    pub filter: Document,
    pub select: Option<String>,
    pub populate: Vec<String>,
    pub helper: Option<HelperCall>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelperCall {
    pub name: String,
    #[serde(default)]
    pub arg: Value,
}

impl QuerySpec {
    fn build<S: DocumentStore>(self, model: &Model<S>) -> ModelResult<Query<'_, S>> {
        let mut query = model.find(self.filter);
        if let Some(call) = &self.helper {
            query = query.helper(&call.name, &call.arg)?;
        }
        if let Some(selection) = &self.select {
            query = query.select(selection)?;
        }
        for field in self.populate {
            query = query.populate(field);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

/// Applies one operation, returning the response payload.
pub fn apply<S: DocumentStore>(model: &mut Model<S>, operation: Operation) -> ModelResult<Value> {
    match operation {
        Operation::Insert { doc } => Ok(model.insert_one(&doc)?.into_value()),
        Operation::InsertMany { docs } => Ok(to_array(model.insert_many(&docs)?)),
        Operation::Find(spec) => Ok(to_array(spec.build(model)?.exec()?)),
        Operation::FindOne(spec) => Ok(spec
            .build(model)?
            .first()?
            .map(Document::into_value)
            .unwrap_or(Value::Null)),
        Operation::Delete { filter } => {
            let deleted = model.delete_many(&filter)?;
            Ok(json!({ "deleted": deleted }))
        }
        Operation::Similar { id, field } => {
            let probe: Document = std::iter::once((ID_FIELD.to_string(), Value::String(id))).collect();
            Ok(to_array(model.find_similar(&probe, &field)?))
        }
        Operation::Call { helper, arg } => Ok(to_array(model.call_static(&helper, &arg)?)),
    }
}

fn to_array(docs: Vec<Document>) -> Value {
    Value::Array(docs.into_iter().map(Document::into_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelError;
    use crate::schema::{FieldSpec, FieldType, SchemaBuilder};
    use crate::store::MemoryStore;

    fn model() -> Model<MemoryStore> {
        let schema = SchemaBuilder::new("users")
            .field(FieldSpec::new("name", FieldType::String).required())
            .field(FieldSpec::new("type", FieldType::String))
            .build()
            .unwrap();
        let mut model = Model::new(schema, MemoryStore::new());
        model.register_field_helper("byName", "name");
        model
    }

    fn op(line: &str) -> Operation {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_parse_operations() {
        assert_eq!(op(r#"{"op": "insert", "doc": {"name": "A"}}"#).name(), "insert");
        assert_eq!(op(r#"{"op": "findOne"}"#).name(), "findOne");
        assert_eq!(op(r#"{"op": "delete"}"#).name(), "delete");
        assert!(serde_json::from_str::<Operation>(r#"{"op": "upsert"}"#).is_err());
        assert!(serde_json::from_str::<Operation>(r#"{"op": "insert"}"#).is_err());
    }

    #[test]
    fn test_insert_then_find() {
        let mut model = model();
        apply(&mut model, op(r#"{"op": "insert", "doc": {"name": "A", "type": "admin"}}"#)).unwrap();
        apply(&mut model, op(r#"{"op": "insert", "doc": {"name": "B", "type": "user"}}"#)).unwrap();

        let found = apply(&mut model, op(r#"{"op": "find", "filter": {"type": "admin"}}"#)).unwrap();
        assert_eq!(found.as_array().unwrap().len(), 1);

        let one = apply(
            &mut model,
            op(r#"{"op": "findOne", "helper": {"name": "byName", "arg": "B"}}"#),
        )
        .unwrap();
        assert_eq!(one["type"], json!("user"));

        let none = apply(&mut model, op(r#"{"op": "findOne", "filter": {"name": "Z"}}"#)).unwrap();
        assert!(none.is_null());
    }

    #[test]
    fn test_similar_and_call() {
        let mut model = model();
        let a = apply(&mut model, op(r#"{"op": "insert", "doc": {"name": "A", "type": "admin"}}"#))
            .unwrap();
        apply(&mut model, op(r#"{"op": "insert", "doc": {"name": "B", "type": "admin"}}"#)).unwrap();

        let id = a["_id"].as_str().unwrap();
        let similar = apply(
            &mut model,
            op(&format!(r#"{{"op": "similar", "id": "{}", "field": "type"}}"#, id)),
        )
        .unwrap();
        assert_eq!(similar.as_array().unwrap().len(), 2);

        let called = apply(&mut model, op(r#"{"op": "call", "helper": "byName", "arg": "A"}"#)).unwrap();
        assert_eq!(called.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_and_errors() {
        let mut model = model();
        apply(&mut model, op(r#"{"op": "insertMany", "docs": [{"name": "A"}, {"name": "B"}]}"#))
            .unwrap();
        let deleted = apply(&mut model, op(r#"{"op": "delete"}"#)).unwrap();
        assert_eq!(deleted, json!({"deleted": 2}));

        let err = apply(&mut model, op(r#"{"op": "insert", "doc": {}}"#)).unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));

        let err = apply(&mut model, op(r#"{"op": "call", "helper": "byAge"}"#)).unwrap_err();
        assert_eq!(err.code(), "DOC_UNKNOWN_HELPER");
    }
}
