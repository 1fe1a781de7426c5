// SPDX-License-Identifier: Apache-2.0

//! Schema validation for envelopes and messages.
//!
//! Schemas are embedded at compile time and may be overridden by files in a
//! configured directory. Each schema is read at most once per validator; the
//! cache uses one slot per name so a slow first load of one schema never
//! blocks lookups of another.

mod validate;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::WardenError;

/// Envelope schema name.
pub const AGENT_OUTPUT_SCHEMA: &str = "agent-output-schema";
/// Message schema name.
pub const MESSAGE_SCHEMA: &str = "inter-agent-message-schema";

const EMBEDDED: [(&str, &str); 3] = [
    (
        AGENT_OUTPUT_SCHEMA,
        include_str!("schemas/agent-output-schema.json"),
    ),
    (
        MESSAGE_SCHEMA,
        include_str!("schemas/inter-agent-message-schema.json"),
    ),
    (
        "security-output-schema",
        include_str!("schemas/security-output-schema.json"),
    ),
];

static GLOBAL: LazyLock<SchemaValidator> = LazyLock::new(SchemaValidator::embedded);

/// A parsed schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    document: Value,
}

impl Schema {
    /// Schema name without the `.json` suffix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `version` field, if present.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.document.get("version").and_then(Value::as_str)
    }

    /// The `title` field, if present.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.document.get("title").and_then(Value::as_str)
    }

    /// The raw schema document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Validates `instance` against this schema.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        validate::check(&self.document, &self.document, instance, "", &mut errors);
        ValidationReport {
            ok: errors.is_empty(),
            errors,
        }
    }
}

/// One violation, located by JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaError {
    /// JSON pointer of the offending node; empty for the document root.
    pub path: String,
    /// What is wrong.
    pub message: String,
}

impl SchemaError {
    pub(crate) fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Outcome of one validation. `errors` is empty iff `ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Whether the document conforms.
    pub ok: bool,
    /// Violations in schema order.
    pub errors: Vec<SchemaError>,
}

impl ValidationReport {
    /// All errors joined into one line.
    #[must_use]
    pub fn joined(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn merge(&mut self, other: ValidationReport) {
        self.ok &= other.ok;
        self.errors.extend(other.errors);
    }
}

type Slot = Arc<Mutex<Option<Arc<Schema>>>>;

/// Loads, caches and applies schemas.
#[derive(Debug, Default)]
pub struct SchemaValidator {
    dir: Option<PathBuf>,
    cache: Mutex<HashMap<String, Slot>>,
}

impl SchemaValidator {
    /// Validator serving only the embedded schemas.
    #[must_use]
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Validator that prefers `<dir>/<name>.json` over the embedded schemas.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            cache: Mutex::default(),
        }
    }

    /// Process-wide validator over the embedded schemas.
    pub fn global() -> &'static SchemaValidator {
        &GLOBAL
    }

    /// Override directory, if any.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Loads a schema by name, with or without the `.json` suffix.
    ///
    /// Repeated calls return the cached schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaNotFound` when no file or embedded schema has that name,
    /// or `Json` when an override file is not valid JSON.
    pub fn load_schema(&self, name: &str) -> Result<Arc<Schema>, WardenError> {
        let key = name.strip_suffix(".json").unwrap_or(name);

        let slot: Slot = {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cache.entry(key.to_string()).or_default())
        };

        let mut loaded = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(schema) = loaded.as_ref() {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.read_schema(key)?);
        debug!(
            schema = key,
            version = schema.version().unwrap_or("unversioned"),
            "Loaded schema"
        );
        *loaded = Some(Arc::clone(&schema));
        Ok(schema)
    }

    fn read_schema(&self, key: &str) -> Result<Schema, WardenError> {
        let document: Value = if let Some(path) = self
            .dir
            .as_ref()
            .map(|d| d.join(format!("{key}.json")))
            .filter(|p| p.is_file())
        {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            let text = EMBEDDED
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, text)| *text)
                .ok_or_else(|| WardenError::SchemaNotFound {
                    name: key.to_string(),
                })?;
            serde_json::from_str(text)?
        };
        Ok(Schema {
            name: key.to_string(),
            document,
        })
    }

    /// Validates `document` against the named schema.
    ///
    /// # Errors
    ///
    /// Fails only if the schema cannot be loaded; violations are reported in
    /// the returned [`ValidationReport`].
    pub fn validate(&self, document: &Value, schema: &str) -> Result<ValidationReport, WardenError> {
        Ok(self.load_schema(schema)?.validate(document))
    }

    /// Validates and fails with every violation concatenated.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidation` when the document does not conform.
    pub fn validate_and_raise(&self, document: &Value, schema: &str) -> Result<(), WardenError> {
        let report = self.validate(document, schema)?;
        if report.ok {
            Ok(())
        } else {
            Err(WardenError::SchemaValidation {
                schema: schema.to_string(),
                errors: report.joined(),
            })
        }
    }

    /// Validates an envelope against the base schema and, when a schema named
    /// `<agent.category>-output-schema` exists, checks `results.data` against it.
    ///
    /// # Errors
    ///
    /// Fails if the base schema cannot be loaded.
    pub fn validate_envelope(&self, envelope: &Value) -> Result<ValidationReport, WardenError> {
        let mut report = self.validate(envelope, AGENT_OUTPUT_SCHEMA)?;

        let category = envelope.pointer("/agent/category").and_then(Value::as_str);
        let data = envelope.pointer("/results/data");
        if let (Some(category), Some(data)) = (category, data) {
            match self.load_schema(&format!("{category}-output-schema")) {
                Ok(extension) => {
                    let mut ext = extension.validate(data);
                    for error in &mut ext.errors {
                        error.path = format!("/results/data{}", error.path);
                    }
                    report.merge(ext);
                }
                Err(WardenError::SchemaNotFound { .. }) => {}
                Err(e) => warn!(category, error = %e, "Category schema unusable"),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope() -> Value {
        json!({
            "schemaVersion": "1.0.0",
            "agent": {"name": "Test Agent", "version": "1.0.0", "category": "security"},
            "execution": {"timestamp": "2025-11-01T10:30:00Z", "status": "success"},
            "results": {"data": {}}
        })
    }

    #[test]
    fn test_embedded_schemas_load() {
        let validator = SchemaValidator::embedded();
        for name in [
            AGENT_OUTPUT_SCHEMA,
            MESSAGE_SCHEMA,
            "security-output-schema.json",
        ] {
            let schema = validator.load_schema(name).unwrap();
            assert_eq!(schema.version(), Some("1.0.0"));
            assert_eq!(
                schema.document()["$schema"],
                "http://json-schema.org/draft-07/schema#"
            );
        }
        assert_eq!(
            validator.load_schema(AGENT_OUTPUT_SCHEMA).unwrap().title(),
            Some("Agent Output Schema")
        );
    }

    #[test]
    fn test_load_schema_is_cached() {
        let validator = SchemaValidator::embedded();
        let first = validator.load_schema(AGENT_OUTPUT_SCHEMA).unwrap();
        let second = validator
            .load_schema("agent-output-schema.json")
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_unknown_schema() {
        let err = SchemaValidator::embedded()
            .validate(&json!({}), "non-existent-schema")
            .expect_err("missing");
        assert!(matches!(err, WardenError::SchemaNotFound { name } if name == "non-existent-schema"));
    }

    #[test]
    fn test_empty_document_fails_cleanly() {
        let report = SchemaValidator::embedded()
            .validate(&json!({}), AGENT_OUTPUT_SCHEMA)
            .unwrap();
        assert!(!report.ok);
        assert_eq!(
            report.errors[0].to_string(),
            "/schemaVersion: required field 'schemaVersion' missing"
        );
        assert_eq!(report.errors.len(), 4);
    }

    #[test]
    fn test_minimal_envelope_and_extra_fields_pass() {
        let validator = SchemaValidator::embedded();
        let mut doc = envelope();
        assert!(validator.validate(&doc, AGENT_OUTPUT_SCHEMA).unwrap().ok);

        doc["unexpected"] = json!({"anything": true});
        let report = validator.validate(&doc, AGENT_OUTPUT_SCHEMA).unwrap();
        assert!(report.ok);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_wrong_type_enum_and_pattern() {
        let validator = SchemaValidator::embedded();
        for (pointer, bad) in [
            ("/schemaVersion", json!(123)),
            ("/schemaVersion", json!("invalid-version")),
            ("/agent/category", json!("invalid_category")),
            ("/execution/status", json!("done")),
        ] {
            let mut doc = envelope();
            *doc.pointer_mut(pointer).unwrap() = bad;
            let report = validator.validate(&doc, AGENT_OUTPUT_SCHEMA).unwrap();
            assert!(!report.ok, "{pointer} should fail");
            assert_eq!(report.errors[0].path, pointer);
        }
    }

    #[test]
    fn test_validate_and_raise_concatenates() {
        let err = SchemaValidator::embedded()
            .validate_and_raise(&json!({"schemaVersion": "1.0.0"}), AGENT_OUTPUT_SCHEMA)
            .expect_err("invalid");
        let WardenError::SchemaValidation { schema, errors } = err else {
            panic!("unexpected error");
        };
        assert_eq!(schema, AGENT_OUTPUT_SCHEMA);
        assert!(errors.contains("/agent"));
        assert!(errors.contains("/execution"));
        assert!(errors.contains("/results"));
    }

    #[test]
    fn test_envelope_checks_category_extension() {
        let validator = SchemaValidator::embedded();
        let mut doc = envelope();
        doc["results"]["data"] = json!({"score": 120});
        let report = validator.validate_envelope(&doc).unwrap();
        assert!(!report.ok);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/results/data/severityCounts", "/results/data/score"]
        );

        doc["agent"]["category"] = json!("quality");
        assert!(validator.validate_envelope(&doc).unwrap().ok);
    }

    #[test]
    fn test_directory_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("agent-output-schema.json"),
            r#"{"version": "2.0.0", "type": "object", "required": ["custom"]}"#,
        )
        .unwrap();
        let validator = SchemaValidator::with_dir(dir.path());

        let schema = validator.load_schema(AGENT_OUTPUT_SCHEMA).unwrap();
        assert_eq!(schema.version(), Some("2.0.0"));
        assert!(!validator.validate(&envelope(), AGENT_OUTPUT_SCHEMA).unwrap().ok);
        assert!(validator.load_schema(MESSAGE_SCHEMA).is_ok());
    }

    #[test]
    fn test_cyclic_override_schema_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("loop.json"), r##"{"$ref": "#"}"##).unwrap();
        let validator = SchemaValidator::with_dir(dir.path());

        let report = validator.validate(&json!({}), "loop").unwrap();
        assert!(!report.ok);
        assert!(report.errors[0].message.contains("cyclic reference"));
    }

    #[test]
    fn test_concurrent_first_load() {
        let validator = Arc::new(SchemaValidator::embedded());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let v = Arc::clone(&validator);
                std::thread::spawn(move || v.load_schema(MESSAGE_SCHEMA).unwrap())
            })
            .collect();
        let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(schemas.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
