//! Document representation shared by the write path, the read path and the
//! store adapter.
//!
//! A document is a JSON object keyed by field name. The store owns two
//! reserved bookkeeping fields: `_id` and `__v`.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved identifier field assigned by the store
pub const ID_FIELD: &str = "_id";

/// Reserved version field assigned by the store
pub const VERSION_FIELD: &str = "__v";

/// Returns true for the store-owned bookkeeping fields.
pub fn is_reserved(field: &str) -> bool {
    field == ID_FIELD || field == VERSION_FIELD
}

/// JSON equality in which numbers compare by value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            x.as_f64() == y.as_f64()
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// A mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Raw field access, including explicit nulls
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field access that treats an explicit null as absent.
    pub fn get_present(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The store-assigned identifier, if this document has been persisted.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

/// Missing fields index as `null`, as with `serde_json::Value`.
impl Index<&str> for Document {
    type Output = Value;

    fn index(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.0.get(field).unwrap_or(&NULL)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
