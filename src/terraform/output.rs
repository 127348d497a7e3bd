//! Parsing of the tool's JSON output

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Named output values of an applied module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSet {
    values: BTreeMap<String, String>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Like [`OutputSet::get`] but reports an undeclared output as an error.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| Error::MissingOutput {
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OutputSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct OutputEntry {
    value: Value,
}

#[derive(Deserialize)]
struct VersionInfo {
    terraform_version: String,
}

/// Parse `output -json` (all outputs) into an [`OutputSet`].
pub fn parse_outputs(json: &str) -> Result<OutputSet> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(OutputSet::new());
    }
    let entries: BTreeMap<String, OutputEntry> =
        serde_json::from_str(trimmed).map_err(|e| Error::MalformedOutput {
            reason: format!("cannot parse outputs JSON: {e}"),
        })?;
    Ok(entries
        .into_iter()
        .map(|(name, entry)| (name, render_value(&entry.value)))
        .collect())
}

/// Parse `output -json NAME` (a bare JSON value).
pub fn parse_single_output(json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json.trim()).map_err(|e| Error::MalformedOutput {
        reason: format!("cannot parse output value: {e}"),
    })?;
    Ok(render_value(&value))
}

/// Extract the version from `version -json`.
pub fn parse_version(json: &str) -> Result<semver::Version> {
    let info: VersionInfo = serde_json::from_str(json.trim()).map_err(|e| Error::MalformedOutput {
        reason: format!("cannot parse version JSON: {e}"),
    })?;
    semver::Version::parse(info.terraform_version.trim_start_matches('v')).map_err(|e| {
        Error::MalformedOutput {
            reason: format!("invalid version '{}': {e}", info.terraform_version),
        }
    })
}

/// Strings as-is, null as empty, everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Whether stderr of a failed `output NAME` means the output does not exist.
pub(crate) fn is_missing_output(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("output") && (lower.contains("not found") || lower.contains("no outputs found"))
}
