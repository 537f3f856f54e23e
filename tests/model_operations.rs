//! Model Operation Tests
//!
//! End-to-end scenarios over a `Model` backed by a `MemoryStore`:
//! - insert, find, select, delete on a schema with getter, alias, hidden
//!   field, validator and transform
//! - instance method, query helper, static method, virtual and population
//!   on a schema with references

use docshape::model::{Model, ModelError};
use docshape::schema::{FieldSpec, FieldType, SchemaBuilder};
use docshape::store::{DocumentStore, MemoryStore};
use docshape::Document;
use serde_json::{json, Value};

fn doc(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

fn docs(value: Value) -> Vec<Document> {
    value
        .as_array()
        .unwrap()
        .iter()
        .cloned()
        .map(doc)
        .collect()
}

// =============================================================================
// Schema options scenario
// =============================================================================

fn options_model() -> Model<MemoryStore> {
    let schema = SchemaBuilder::new("Users")
        .field(FieldSpec::new("name", FieldType::String).getter(|v| {
            json!(v.as_str().unwrap_or_default().to_uppercase())
        }))
        .field(FieldSpec::new("email", FieldType::String))
        .field(FieldSpec::new("importantId", FieldType::String).hidden())
        .field(FieldSpec::new("age", FieldType::Number).validator(|v| {
            match v.as_f64() {
                Some(age) if age < 18.0 => {
                    Err("Age validation failed! You are underage!".to_string())
                }
                _ => Ok(()),
            }
        }))
        .field(FieldSpec::alias_of("fullName", "name"))
        .transform(|_, mut out| {
            out.remove("_id");
            out.remove("__v");
            out
        })
        .build()
        .unwrap();
    Model::new(schema, MemoryStore::new())
}

#[test]
fn test_schema_options_scenario() {
    let mut users = options_model();

    users
        .insert_many(&docs(json!([
            {"name": "Alice", "email": "alice@example.com", "age": 20, "importantId": "k-alice"},
            {"name": "Bob", "email": "bob@example.com", "age": 25}
        ])))
        .unwrap();

    let all = users.find(Document::new()).exec().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(
        all[0].clone().into_value(),
        json!({"name": "ALICE", "email": "alice@example.com", "age": 20})
    );

    let with_id = users
        .find(Document::new())
        .select("+importantId")
        .unwrap()
        .exec()
        .unwrap();
    assert_eq!(with_id[0].get("importantId"), Some(&json!("k-alice")));
    assert!(!with_id[1].contains("importantId"));

    users
        .insert_one(&doc(json!({"fullName": "Sounka", "email": "sounka@example.com", "age": 22})))
        .unwrap();
    let sounka = users.find_one(doc(json!({"name": "Sounka"}))).unwrap().unwrap();
    assert_eq!(sounka.get("name"), Some(&json!("SOUNKA")));

    let err = users
        .insert_one(&doc(json!({"name": "Kid", "age": 12})))
        .unwrap_err();
    assert!(err.to_string().contains("underage"));

    assert_eq!(users.delete_many(&Document::new()).unwrap(), 3);
    assert!(users.store().is_empty());
}

/// A failing document in a batch persists nothing.
#[test]
fn test_insert_many_rejects_whole_batch() {
    let mut users = options_model();
    let err = users
        .insert_many(&docs(json!([
            {"name": "Alice", "age": 20},
            {"name": "Kid", "age": 9}
        ])))
        .unwrap_err();
    assert!(matches!(err, ModelError::Validation(_)));
    assert_eq!(users.store().len(), 0);
}

// =============================================================================
// Schema methods scenario
// =============================================================================

fn methods_model() -> Model<MemoryStore> {
    let schema = SchemaBuilder::new("User")
        .field(FieldSpec::new("name", FieldType::String).required())
        .field(FieldSpec::new("email", FieldType::String).unique())
        .field(FieldSpec::new("type", FieldType::String).required())
        .field(
            FieldSpec::new("friends", FieldType::array_of(FieldType::Reference)).references("User"),
        )
        .virtual_field("nameemail", |record| {
            let text = |field| record.get(field).and_then(Value::as_str).unwrap_or_default();
            json!(format!("I am {} and my role is {}", text("name"), text("type")))
        })
        .build()
        .unwrap();

    let mut model = Model::new(schema, MemoryStore::new());
    model.register_field_helper("byName", "name");
    model
        .insert_many(&docs(json!([
            {"name": "Sounak", "type": "admin", "email": "sounak@example.com"},
            {"name": "Alice", "type": "admin", "email": "alice@example.com"},
            {"name": "Bob", "type": "user", "email": "bob@example.com"}
        ])))
        .unwrap();
    model
}

#[test]
fn test_virtual_on_found_document() {
    let users = methods_model();
    let me = users.find_one(doc(json!({"name": "Sounak"}))).unwrap().unwrap();
    assert_eq!(
        me.get("nameemail"),
        Some(&json!("I am Sounak and my role is admin"))
    );
}

#[test]
fn test_find_similar_types() {
    let users = methods_model();
    let me = users.find_one(doc(json!({"name": "Sounak"}))).unwrap().unwrap();

    let similar = users.find_similar(&me, "type").unwrap();
    let names: Vec<_> = similar.iter().map(|d| d.get("name").unwrap().clone()).collect();
    assert_eq!(names, vec![json!("Sounak"), json!("Alice")]);
}

#[test]
fn test_query_helper_and_static_agree() {
    let users = methods_model();

    let via_query = users
        .find(Document::new())
        .helper("byName", &json!("Alice"))
        .unwrap()
        .exec()
        .unwrap();
    let via_static = users.call_static("byName", &json!("Alice")).unwrap();

    assert_eq!(via_query.len(), 1);
    assert_eq!(via_query, via_static);
    assert_eq!(users.call_static("byName", &json!("Bob")).unwrap()[0]["type"], json!("user"));
}

#[test]
fn test_populate_friends() {
    let mut users = methods_model();
    let bob = users.find_one(doc(json!({"name": "Bob"}))).unwrap().unwrap();

    users
        .insert_one(&doc(json!({
            "name": "Carol",
            "type": "user",
            "friends": [bob.id().unwrap()]
        })))
        .unwrap();

    let plain = users.find_one(doc(json!({"name": "Carol"}))).unwrap().unwrap();
    assert_eq!(plain.get("friends"), Some(&json!([bob.id().unwrap()])));

    let populated = users
        .find(doc(json!({"name": "Carol"})))
        .populate("friends")
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(populated["friends"][0]["name"], json!("Bob"));
    assert_eq!(
        populated["friends"][0]["nameemail"],
        json!("I am Bob and my role is user")
    );
}

#[test]
fn test_friends_filter_matches_containment() {
    let mut users = methods_model();
    let alice = users.find_one(doc(json!({"name": "Alice"}))).unwrap().unwrap();
    let alice_id = alice.id().unwrap().to_string();
    users
        .insert_one(&doc(json!({"name": "Dan", "type": "user", "friends": [alice_id.clone()]})))
        .unwrap();

    let found = users.find(doc(json!({"friends": alice_id}))).exec().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], json!("Dan"));
}

#[test]
fn test_unique_email_enforced() {
    let mut users = methods_model();
    let err = users
        .insert_one(&doc(json!({"name": "Eve", "type": "user", "email": "bob@example.com"})))
        .unwrap_err();
    assert!(matches!(err, ModelError::Store(_)));
    assert_eq!(users.store().len(), 3);
}
