//! Schema descriptors and the structural walk.

use serde_json::Value;

use crate::gate::Violation;

/// Declarative shape of an expected value.
#[derive(Debug, Clone)]
pub enum Schema {
    Object(Vec<Field>),
    Array(Box<Schema>),
    /// Exactly-two-element tuple, e.g. a genre cross-affinity pair.
    Pair(Box<Schema>, Box<Schema>),
    Text,
    Number,
    /// Non-negative whole number (counts, sizes).
    Integer,
    Bool,
    Enum(&'static [&'static str]),
    Nullable(Box<Schema>),
    Any,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, schema: Schema) -> Self {
        Self { name, schema, required: true }
    }

    pub fn optional(name: &'static str, schema: Schema) -> Self {
        Self { name, schema, required: false }
    }
}

impl Schema {
    /// Short human-readable description, used in `Violation::expected`.
    pub fn describe(&self) -> String {
        match self {
            Schema::Object(_) => "object".to_string(),
            Schema::Array(inner) => format!("array of {}", inner.describe()),
            Schema::Pair(a, b) => format!("[{}, {}]", a.describe(), b.describe()),
            Schema::Text => "string".to_string(),
            Schema::Number => "number".to_string(),
            Schema::Integer => "non-negative integer".to_string(),
            Schema::Bool => "boolean".to_string(),
            Schema::Enum(options) => format!("one of {:?}", options),
            Schema::Nullable(inner) => format!("{} or null", inner.describe()),
            Schema::Any => "any".to_string(),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

/// Walk `value` against `schema`, appending a violation for every
/// mismatch. Siblings are always visited; this never stops at the
/// first error.
pub fn check_value(value: &Value, schema: &Schema, path: &str, out: &mut Vec<Violation>) {
    match schema {
        Schema::Any => {}
        Schema::Nullable(inner) => {
            if !value.is_null() {
                check_value(value, inner, path, out);
            }
        }
        Schema::Object(fields) => match value.as_object() {
            Some(map) => {
                for field in fields {
                    let fpath = child_path(path, field.name);
                    match map.get(field.name) {
                        Some(child) => check_value(child, &field.schema, &fpath, out),
                        None if field.required => out.push(Violation {
                            path: fpath,
                            expected: field.schema.describe(),
                            actual: "missing".to_string(),
                        }),
                        None => {}
                    }
                }
            }
            None => out.push(Violation {
                path: path.to_string(),
                expected: "object".to_string(),
                actual: type_name(value).to_string(),
            }),
        },
        Schema::Array(inner) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_value(item, inner, &format!("{path}[{i}]"), out);
                }
            }
            None => out.push(Violation {
                path: path.to_string(),
                expected: schema.describe(),
                actual: type_name(value).to_string(),
            }),
        },
        Schema::Pair(first, second) => match value.as_array() {
            Some(items) if items.len() == 2 => {
                check_value(&items[0], first, &format!("{path}[0]"), out);
                check_value(&items[1], second, &format!("{path}[1]"), out);
            }
            Some(items) => out.push(Violation {
                path: path.to_string(),
                expected: schema.describe(),
                actual: format!("array of {} elements", items.len()),
            }),
            None => out.push(Violation {
                path: path.to_string(),
                expected: schema.describe(),
                actual: type_name(value).to_string(),
            }),
        },
        Schema::Text => {
            if !value.is_string() {
                out.push(Violation {
                    path: path.to_string(),
                    expected: "string".to_string(),
                    actual: type_name(value).to_string(),
                });
            }
        }
        Schema::Number => {
            if !value.is_number() {
                out.push(Violation {
                    path: path.to_string(),
                    expected: "number".to_string(),
                    actual: type_name(value).to_string(),
                });
            }
        }
        Schema::Integer => {
            if value.as_u64().is_none() {
                out.push(Violation {
                    path: path.to_string(),
                    expected: schema.describe(),
                    actual: match value {
                        Value::Number(n) => n.to_string(),
                        other => type_name(other).to_string(),
                    },
                });
            }
        }
        Schema::Bool => {
            if !value.is_boolean() {
                out.push(Violation {
                    path: path.to_string(),
                    expected: "boolean".to_string(),
                    actual: type_name(value).to_string(),
                });
            }
        }
        Schema::Enum(options) => match value.as_str() {
            Some(s) if options.contains(&s) => {}
            Some(s) => out.push(Violation {
                path: path.to_string(),
                expected: schema.describe(),
                actual: format!("\"{s}\""),
            }),
            None => out.push(Violation {
                path: path.to_string(),
                expected: schema.describe(),
                actual: type_name(value).to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(value: &Value, schema: &Schema) -> Vec<Violation> {
        let mut out = Vec::new();
        check_value(value, schema, "", &mut out);
        out
    }

    #[test]
    fn collects_all_missing_fields() {
        let schema = Schema::Object(vec![
            Field::required("a", Schema::Text),
            Field::required("b", Schema::Number),
            Field::optional("c", Schema::Bool),
        ]);
        let violations = check(&json!({}), &schema);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path, "a");
        assert_eq!(violations[1].path, "b");
        assert_eq!(violations[1].actual, "missing");
    }

    #[test]
    fn keeps_walking_after_first_error() {
        let schema = Schema::Object(vec![
            Field::required("a", Schema::Number),
            Field::required("b", Schema::Number),
        ]);
        let violations = check(&json!({"a": "x", "b": "y"}), &schema);
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn enum_membership() {
        let schema = Schema::Enum(&["none", "monthly", "weekly", "event_driven"]);
        assert!(check(&json!("weekly"), &schema).is_empty());
        let violations = check(&json!("yearly"), &schema);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].actual, "\"yearly\"");
    }

    #[test]
    fn pair_arity() {
        let schema = Schema::Pair(Box::new(Schema::Text), Box::new(Schema::Text));
        assert!(check(&json!(["rock", "samba"]), &schema).is_empty());
        let violations = check(&json!(["rock"]), &schema);
        assert_eq!(violations[0].actual, "array of 1 elements");
    }

    #[test]
    fn nullable_accepts_null_but_not_wrong_type() {
        let schema = Schema::Nullable(Box::new(Schema::Number));
        assert!(check(&json!(null), &schema).is_empty());
        assert!(check(&json!(1.5), &schema).is_empty());
        assert_eq!(check(&json!("x"), &schema).len(), 1);
    }

    #[test]
    fn integer_rejects_negative_and_fractional() {
        assert!(check(&json!(3), &Schema::Integer).is_empty());
        assert_eq!(check(&json!(-1), &Schema::Integer).len(), 1);
        assert_eq!(check(&json!(2.5), &Schema::Integer).len(), 1);
    }

    #[test]
    fn indexed_paths_inside_arrays() {
        let schema = Schema::Array(Box::new(Schema::Object(vec![Field::required(
            "size",
            Schema::Integer,
        )])));
        let violations = check(&json!([{"size": 1}, {}]), &schema);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "[1].size");
    }
}
