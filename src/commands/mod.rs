//! CLI command implementations. Each `execute` prints its own results and
//! returns an error when the command's checks fail.

pub mod apply;
pub mod doctor;
pub mod plan;
pub mod print;
pub mod probe;
pub mod run;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{SuiteConfig, VarValue};

/// Settings shared by the single-module commands (`apply`, `plan`).
#[derive(Debug, Clone, Default)]
pub struct ModuleArgs {
    pub directory: PathBuf,
    pub vars: Vec<(String, VarValue)>,
    pub color: bool,
    pub in_place: bool,
    pub config: Option<PathBuf>,
}

impl ModuleArgs {
    /// Suite config with the module directory and inputs from the command line.
    /// Command-line vars are added on top of the configured ones.
    pub(crate) fn suite_config(&self) -> Result<SuiteConfig> {
        let mut config = SuiteConfig::discover(self.config.as_deref())
            .context("Failed to load configuration")?;
        config.module.directory = absolute(&self.directory)?;
        config.module.color = self.color;
        if self.in_place {
            config.module.isolate = false;
        }
        for (name, value) in &self.vars {
            config.cases.basic.vars.insert(name.clone(), value.clone());
            config.cases.plan.vars.insert(name.clone(), value.clone());
        }
        Ok(config)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(path))
}
