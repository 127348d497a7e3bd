//! Module configuration passed to every provisioning-tool invocation

use glob::{glob, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Value of a module input variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Bool(b) => write!(f, "{b}"),
            VarValue::Integer(i) => write!(f, "{i}"),
            VarValue::Float(x) => write!(f, "{x}"),
            VarValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        VarValue::String(s.to_string())
    }
}

impl From<String> for VarValue {
    fn from(s: String) -> Self {
        VarValue::String(s)
    }
}

impl From<bool> for VarValue {
    fn from(b: bool) -> Self {
        VarValue::Bool(b)
    }
}

impl From<i64> for VarValue {
    fn from(i: i64) -> Self {
        VarValue::Integer(i)
    }
}

impl From<f64> for VarValue {
    fn from(x: f64) -> Self {
        VarValue::Float(x)
    }
}

/// A module directory plus the inputs it is provisioned with.
///
/// Built once per case with the `with_*` methods and then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConfig {
    directory: PathBuf,
    vars: BTreeMap<String, VarValue>,
    color: bool,
}

impl ModuleConfig {
    /// Colorized tool output is off by default so captured logs stay readable.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            vars: BTreeMap::new(),
            color: false,
        }
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_vars(mut self, vars: impl IntoIterator<Item = (String, VarValue)>) -> Self {
        self.vars.extend(vars);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn vars(&self) -> &BTreeMap<String, VarValue> {
        &self.vars
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Same inputs, different directory. Used when a case works on a copy.
    pub fn relocated(&self, directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..self.clone()
        }
    }

    /// `-var name=value` pairs in name order.
    pub fn var_args(&self) -> Vec<String> {
        self.vars
            .iter()
            .flat_map(|(name, value)| ["-var".to_string(), format!("{name}={value}")])
            .collect()
    }

    /// The directory must exist and hold at least one `*.tf` file.
    pub fn validate(&self) -> Result<()> {
        if !self.directory.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "module directory does not exist: {}",
                self.directory.display()
            )));
        }

        // The directory is literal; only the file name is a pattern
        let pattern_str = format!(
            "{}/*.tf",
            Pattern::escape(&self.directory.to_string_lossy())
        );
        let has_tf = glob(&pattern_str)
            .map_err(|e| Error::InvalidConfig(format!("invalid module path '{pattern_str}': {e}")))?
            .filter_map(|entry| entry.ok())
            .next()
            .is_some();

        if !has_tf {
            return Err(Error::InvalidConfig(format!(
                "no *.tf files in module directory: {}",
                self.directory.display()
            )));
        }
        Ok(())
    }
}

/// Parse a `name=value` pair as given on the command line.
///
/// Values stay strings; the tool converts them to the declared variable type.
pub fn parse_var(raw: &str) -> std::result::Result<(String, VarValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("variable name is empty in '{raw}'"));
    }
    Ok((name.to_string(), VarValue::String(value.to_string())))
}
