//! Type coercion applied on the write path
//!
//! Lenient casts, in the manner of a document mapper:
//! - string: numbers and booleans are rendered as text
//! - number: numeric strings are parsed; booleans become 1 or 0; whole
//!   floats are stored as integers so `20.0` and `20` are one value
//! - boolean: "true"/"false"/"1"/"0"/"yes"/"no" and 1/0
//! - reference: non-empty strings; embedded documents collapse to their `_id`
//! - array: each element is cast; a lone scalar is wrapped in an array

use serde_json::{Number, Value};

use crate::document::ID_FIELD;
use crate::schema::FieldType;

/// Casts `value` to `field_type`. `Err` carries the reason.
pub fn coerce(value: &Value, field_type: &FieldType) -> Result<Value, String> {
    match field_type {
        FieldType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(cast_error(other, field_type)),
        },
        FieldType::Number => match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() => Ok(float_value(f)),
                _ => Ok(value.clone()),
            },
            Value::String(s) => parse_number(s).ok_or_else(|| cast_error(value, field_type)),
            Value::Bool(b) => Ok(Value::from(u8::from(*b))),
            other => Err(cast_error(other, field_type)),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(cast_error(value, field_type)),
            },
            Value::Number(n) => match n.as_f64() {
                Some(f) if f == 1.0 => Ok(Value::Bool(true)),
                Some(f) if f == 0.0 => Ok(Value::Bool(false)),
                _ => Err(cast_error(value, field_type)),
            },
            other => Err(cast_error(other, field_type)),
        },
        FieldType::Reference => match value {
            Value::String(s) if !s.trim().is_empty() => Ok(value.clone()),
            Value::Object(map) => match map.get(ID_FIELD) {
                Some(Value::String(id)) if !id.trim().is_empty() => Ok(Value::String(id.clone())),
                _ => Err("embedded document has no _id to reference".to_string()),
            },
            other => Err(cast_error(other, field_type)),
        },
        FieldType::Array(element_type) => match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    if item.is_null() {
                        return Err(format!("element {} is null", i));
                    }
                    coerce(item, element_type).map_err(|reason| format!("element {}: {}", i, reason))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            scalar => coerce(scalar, element_type).map(|v| Value::Array(vec![v])),
        },
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(float_value)
}

/// Largest magnitude below which every integer is exact in an `f64`
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

fn cast_error(value: &Value, field_type: &FieldType) -> String {
    format!(
        "cannot cast {} {} to {}",
        json_type_name(value),
        value,
        field_type.type_name()
    )
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_string_to_number() {
        assert_eq!(coerce(&json!("42"), &FieldType::Number).unwrap(), json!(42));
        assert_eq!(coerce(&json!(" 2.5 "), &FieldType::Number).unwrap(), json!(2.5));
        assert!(coerce(&json!("forty"), &FieldType::Number).is_err());
        assert!(coerce(&json!(""), &FieldType::Number).is_err());
    }

    #[test]
    fn test_whole_floats_stored_as_integers() {
        assert_eq!(coerce(&json!("20.0"), &FieldType::Number).unwrap(), json!(20));
        assert_eq!(coerce(&json!(20.0), &FieldType::Number).unwrap(), json!(20));
        assert_eq!(coerce(&json!(-3.0), &FieldType::Number).unwrap(), json!(-3));
        assert_eq!(coerce(&json!(20.5), &FieldType::Number).unwrap(), json!(20.5));
        assert_eq!(coerce(&json!(1e300), &FieldType::Number).unwrap(), json!(1e300));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(coerce(&json!("NaN"), &FieldType::Number).is_err());
        assert!(coerce(&json!("inf"), &FieldType::Number).is_err());
    }

    #[test]
    fn test_scalars_to_string() {
        assert_eq!(coerce(&json!(7), &FieldType::String).unwrap(), json!("7"));
        assert_eq!(coerce(&json!(true), &FieldType::String).unwrap(), json!("true"));
        let err = coerce(&json!({"a": 1}), &FieldType::String).unwrap_err();
        assert!(err.contains("object"));
    }

    #[test]
    fn test_boolean_casts() {
        assert_eq!(coerce(&json!("yes"), &FieldType::Boolean).unwrap(), json!(true));
        assert_eq!(coerce(&json!(0), &FieldType::Boolean).unwrap(), json!(false));
        assert!(coerce(&json!(2), &FieldType::Boolean).is_err());
    }

    #[test]
    fn test_reference_from_embedded_document() {
        let embedded = json!({"_id": "67d1707281fed269c08dcaea", "name": "Bob"});
        assert_eq!(
            coerce(&embedded, &FieldType::Reference).unwrap(),
            json!("67d1707281fed269c08dcaea")
        );
        assert!(coerce(&json!({"name": "Bob"}), &FieldType::Reference).is_err());
        assert!(coerce(&json!("  "), &FieldType::Reference).is_err());
    }

    #[test]
    fn test_array_elements_cast() {
        let ty = FieldType::array_of(FieldType::Number);
        assert_eq!(coerce(&json!(["1", 2]), &ty).unwrap(), json!([1, 2]));

        let err = coerce(&json!([1, "x"]), &ty).unwrap_err();
        assert!(err.starts_with("element 1"));

        let err = coerce(&json!([null]), &ty).unwrap_err();
        assert!(err.contains("null"));
    }

    #[test]
    fn test_scalar_wrapped_into_array() {
        let ty = FieldType::array_of(FieldType::Reference);
        assert_eq!(coerce(&json!("abc"), &ty).unwrap(), json!(["abc"]));
    }
}
