// SPDX-License-Identifier: Apache-2.0

//! Validate a document command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use warden_core::{AppConfig, validate_document};

use super::types::ValidateResult;

/// Validates the JSON document at `file`.
///
/// Without `schema` the document is checked as an envelope.
pub fn run(config: &AppConfig, file: &Path, schema: Option<&str>) -> Result<ValidateResult> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let report = validate_document(config, &document, schema)?;
    Ok(ValidateResult {
        file: file.display().to_string(),
        schema: schema.unwrap_or("envelope").to_string(),
        ok: report.ok,
        errors: report.errors.iter().map(ToString::to_string).collect(),
    })
}
