// SPDX-License-Identifier: Apache-2.0

//! Keyword checks for the JSON-Schema subset used by the embedded schemas.

use chrono::DateTime;
use regex::Regex;
use serde_json::{Map, Value};

use super::SchemaError;

/// Walks `instance` against `schema`, appending one error per violation.
///
/// `root` resolves local `$ref`s. A type mismatch stops descent into that
/// node, so nested errors are only reported under well-typed parents.
pub(super) fn check(
    root: &Value,
    schema: &Value,
    instance: &Value,
    path: &str,
    errors: &mut Vec<SchemaError>,
) {
    let Some(schema) = follow_refs(root, schema, path, errors) else {
        return;
    };
    let Some(schema) = schema.as_object() else {
        // `true`/`{}` accept everything; `false` rejects.
        if schema == &Value::Bool(false) {
            errors.push(SchemaError::new(path, "value not allowed"));
        }
        return;
    };

    if let Some(expected) = schema.get("type")
        && !type_matches(expected, instance)
    {
        errors.push(SchemaError::new(
            path,
            format!(
                "expected type {}, found {}",
                describe_type(expected),
                type_name(instance)
            ),
        ));
        return;
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array)
        && !allowed.contains(instance)
    {
        errors.push(SchemaError::new(
            path,
            format!("value {instance} is not one of {}", Value::Array(allowed.clone())),
        ));
    }
    if let Some(expected) = schema.get("const")
        && expected != instance
    {
        errors.push(SchemaError::new(path, format!("value must be {expected}")));
    }

    match instance {
        Value::String(s) => check_string(schema, s, path, errors),
        Value::Number(_) => check_number(schema, instance, path, errors),
        Value::Object(map) => check_object(root, schema, map, path, errors),
        Value::Array(items) => check_array(root, schema, items, path, errors),
        Value::Null | Value::Bool(_) => {}
    }
}

fn check_string(schema: &Map<String, Value>, s: &str, path: &str, errors: &mut Vec<SchemaError>) {
    if let Some(min) = schema.get("minLength").and_then(Value::as_u64)
        && (s.chars().count() as u64) < min
    {
        errors.push(SchemaError::new(
            path,
            format!("string shorter than {min} characters"),
        ));
    }
    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(s) => {}
            Ok(_) => errors.push(SchemaError::new(
                path,
                format!("'{s}' does not match pattern {pattern}"),
            )),
            Err(e) => errors.push(SchemaError::new(
                path,
                format!("invalid pattern {pattern}: {e}"),
            )),
        }
    }
    if schema.get("format").and_then(Value::as_str) == Some("date-time")
        && DateTime::parse_from_rfc3339(s).is_err()
    {
        errors.push(SchemaError::new(
            path,
            format!("'{s}' is not an RFC 3339 date-time"),
        ));
    }
}

fn check_number(
    schema: &Map<String, Value>,
    instance: &Value,
    path: &str,
    errors: &mut Vec<SchemaError>,
) {
    let Some(n) = instance.as_f64() else {
        return;
    };
    if let Some(min) = schema.get("minimum").and_then(Value::as_f64)
        && n < min
    {
        errors.push(SchemaError::new(path, format!("{instance} is below minimum {min}")));
    }
    if let Some(max) = schema.get("maximum").and_then(Value::as_f64)
        && n > max
    {
        errors.push(SchemaError::new(path, format!("{instance} is above maximum {max}")));
    }
}

fn check_object(
    root: &Value,
    schema: &Map<String, Value>,
    map: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<SchemaError>,
) {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !map.contains_key(field) {
                errors.push(SchemaError::new(
                    &child_path(path, field),
                    format!("required field '{field}' missing"),
                ));
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    if let Some(properties) = properties {
        for (name, sub) in properties {
            if let Some(value) = map.get(name) {
                check(root, sub, value, &child_path(path, name), errors);
            }
        }
    }

    match schema.get("additionalProperties") {
        None | Some(Value::Bool(true)) => {}
        Some(extra) => {
            for (name, value) in map {
                if properties.is_some_and(|p| p.contains_key(name)) {
                    continue;
                }
                let child = child_path(path, name);
                if extra == &Value::Bool(false) {
                    errors.push(SchemaError::new(
                        &child,
                        format!("additional property '{name}' not allowed"),
                    ));
                } else {
                    check(root, extra, value, &child, errors);
                }
            }
        }
    }
}

fn check_array(
    root: &Value,
    schema: &Map<String, Value>,
    items: &[Value],
    path: &str,
    errors: &mut Vec<SchemaError>,
) {
    if let Some(min) = schema.get("minItems").and_then(Value::as_u64)
        && (items.len() as u64) < min
    {
        errors.push(SchemaError::new(path, format!("fewer than {min} items")));
    }
    if let Some(item_schema) = schema.get("items") {
        for (idx, item) in items.iter().enumerate() {
            check(root, item_schema, item, &format!("{path}/{idx}"), errors);
        }
    }
}

/// Resolves a chain of `$ref`s to the first schema that is not a reference.
///
/// Returns `None` after recording an error when a reference dangles or the
/// chain loops back on itself.
fn follow_refs<'a>(
    root: &'a Value,
    mut schema: &'a Value,
    path: &str,
    errors: &mut Vec<SchemaError>,
) -> Option<&'a Value> {
    let mut seen: Vec<&str> = Vec::new();
    while let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        if seen.contains(&reference) {
            errors.push(SchemaError::new(
                path,
                format!("cyclic reference '{reference}'"),
            ));
            return None;
        }
        seen.push(reference);
        let Some(target) = resolve(root, reference) else {
            errors.push(SchemaError::new(
                path,
                format!("unresolvable reference '{reference}'"),
            ));
            return None;
        };
        schema = target;
    }
    Some(schema)
}

fn resolve<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    reference.strip_prefix('#').and_then(|ptr| root.pointer(ptr))
}

fn type_matches(expected: &Value, instance: &Value) -> bool {
    match expected {
        Value::String(name) => is_type(name, instance),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| is_type(name, instance)),
        _ => true,
    }
}

fn is_type(name: &str, instance: &Value) -> bool {
    match name {
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "boolean" => instance.is_boolean(),
        "null" => instance.is_null(),
        "number" => instance.is_number(),
        "integer" => {
            instance.is_i64()
                || instance.is_u64()
                || instance.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn describe_type(expected: &Value) -> String {
    match expected {
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Appends an escaped JSON-pointer segment.
fn child_path(path: &str, segment: &str) -> String {
    format!("{path}/{}", segment.replace('~', "~0").replace('/', "~1"))
}
