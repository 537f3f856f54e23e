//! Named getters, declarative validators, virtual templates and output
//! transforms used by schema files.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::{Compute, FieldValidator, Getter, Transform};
use crate::document::Document;

/// Resolves a getter by name: `uppercase`, `lowercase` or `trim`.
///
/// Non-string values pass through unchanged.
pub fn named_getter(name: &str) -> Option<Getter> {
    let f: fn(&str) -> String = match name {
        "uppercase" => str::to_uppercase,
        "lowercase" => str::to_lowercase,
        "trim" => |s: &str| s.trim().to_string(),
        _ => return None,
    };
    Some(Arc::new(move |value: &Value| match value {
        Value::String(s) => Value::String(f(s)),
        other => other.clone(),
    }))
}

/// Declarative validation rules. Every configured rule must pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidatorDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Minimum length of a string (in characters) or array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    /// Replaces the generated reason on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidatorDecl {
    /// Compiles the rules into a validator for `field`.
    ///
    /// # Errors
    ///
    /// Returns `DOC_SCHEMA_DEFINITION_INVALID` for an invalid regex pattern or
    /// when `min` exceeds `max`.
    pub fn build(&self, field: &str) -> SchemaResult<FieldValidator> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(SchemaError::invalid_validator(
                    field,
                    format!("min {} exceeds max {}", min, max),
                ));
            }
        }

        let pattern = self
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| SchemaError::invalid_validator(field, e))?;

        let rules = self.clone();
        Ok(Arc::new(move |value: &Value| {
            rules
                .check(value, pattern.as_ref())
                .map_err(|reason| rules.message.clone().unwrap_or(reason))
        }))
    }

    fn check(&self, value: &Value, pattern: Option<&Regex>) -> Result<(), String> {
        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return Err(format!("{} is less than minimum {}", n, min));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Err(format!("{} is greater than maximum {}", n, max));
                }
            }
        }

        let length = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        if let Some(len) = length {
            if let Some(min) = self.min_length {
                if len < min {
                    return Err(format!("length {} is shorter than {}", len, min));
                }
            }
            if let Some(max) = self.max_length {
                if len > max {
                    return Err(format!("length {} is longer than {}", len, max));
                }
            }
        }

        if let (Some(re), Value::String(s)) = (pattern, value) {
            if !re.is_match(s) {
                return Err(format!("'{}' does not match pattern '{}'", s, re.as_str()));
            }
        }

        if let Some(allowed) = &self.one_of {
            if !allowed.contains(value) {
                return Err(format!("{} is not one of the allowed values", value));
            }
        }

        Ok(())
    }
}

/// Builds a virtual that renders `{field}` placeholders from the stored
/// record. Missing or null fields render as empty text.
pub fn template_virtual(template: &str) -> Compute {
    let template = template.to_string();
    Arc::new(move |record: &Document| Value::String(render_template(&template, record)))
}

fn render_template(template: &str, record: &Document) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let field = &after[..end];
                match record.get(field) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(Value::Null) | None => {}
                    Some(other) => out.push_str(&other.to_string()),
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated placeholder is literal text
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Output rewrite: remove keys, then rename keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformDecl {
    #[serde(default)]
    pub remove: Vec<String>,
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

impl TransformDecl {
    pub fn build(&self) -> Transform {
        let decl = self.clone();
        Arc::new(move |_record: &Document, mut output: Document| {
            for key in &decl.remove {
                output.remove(key);
            }
            for (from, to) in &decl.rename {
                if let Some(value) = output.remove(from) {
                    output.insert(to.clone(), value);
                }
            }
            output
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_named_getters() {
        let upper = named_getter("uppercase").unwrap();
        assert_eq!(upper(&json!("alice")), json!("ALICE"));
        assert_eq!(upper(&json!(3)), json!(3));

        let trim = named_getter("trim").unwrap();
        assert_eq!(trim(&json!("  bob ")), json!("bob"));

        assert!(named_getter("reverse").is_none());
    }

    #[test]
    fn test_min_validator_with_message() {
        let decl = ValidatorDecl {
            min: Some(18.0),
            message: Some("Age validation failed! You are underage!".into()),
            ..Default::default()
        };
        let validator = decl.build("age").unwrap();
        assert!(validator(&json!(20)).is_ok());
        assert_eq!(
            validator(&json!(17)).unwrap_err(),
            "Age validation failed! You are underage!"
        );
    }

    #[test]
    fn test_length_and_pattern_validators() {
        let decl = ValidatorDecl {
            min_length: Some(3),
            pattern: Some("^[a-z]+@[a-z]+\\.com$".into()),
            ..Default::default()
        };
        let validator = decl.build("email").unwrap();
        assert!(validator(&json!("a@b.com")).is_ok());
        assert!(validator(&json!("ab")).unwrap_err().contains("shorter"));
        assert!(validator(&json!("not-an-email")).unwrap_err().contains("pattern"));
    }

    #[test]
    fn test_one_of_validator() {
        let decl = ValidatorDecl {
            one_of: Some(vec![json!("admin"), json!("user")]),
            ..Default::default()
        };
        let validator = decl.build("type").unwrap();
        assert!(validator(&json!("admin")).is_ok());
        assert!(validator(&json!("root")).is_err());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let decl = ValidatorDecl {
            pattern: Some("(unclosed".into()),
            ..Default::default()
        };
        let err = decl.build("name").err().unwrap();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_min_above_max_rejected() {
        let decl = ValidatorDecl {
            min: Some(10.0),
            max: Some(1.0),
            ..Default::default()
        };
        assert!(decl.build("age").is_err());
    }

    #[test]
    fn test_template_virtual() {
        let compute = template_virtual("I am {name} and my role is {type}");
        let record = doc(json!({"name": "Sounak", "type": "admin"}));
        assert_eq!(compute(&record), json!("I am Sounak and my role is admin"));

        let partial = doc(json!({"name": "Bob"}));
        assert_eq!(compute(&partial), json!("I am Bob and my role is "));
    }

    #[test]
    fn test_template_renders_non_strings_and_literals() {
        let compute = template_virtual("{age} years {oops");
        let record = doc(json!({"age": 20}));
        assert_eq!(compute(&record), json!("20 years {oops"));
    }

    #[test]
    fn test_transform_remove_and_rename() {
        let decl = TransformDecl {
            remove: vec!["_id".into(), "__v".into()],
            rename: [("name".to_string(), "displayName".to_string())].into_iter().collect(),
        };
        let transform = decl.build();
        let record = doc(json!({"_id": "1", "__v": 0, "name": "A"}));
        let out = transform(&record, record.clone());
        assert_eq!(out.into_value(), json!({"displayName": "A"}));
    }
}
