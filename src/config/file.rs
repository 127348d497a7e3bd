//! Suite configuration file (`infracheck.toml`)

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::module::{ModuleConfig, VarValue};
use crate::checks::DEFAULT_PLAN_RESOURCES;
use crate::error::{Error, Result};
use crate::probe::{ProbePolicy, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS};
use crate::terraform::{ToolOptions, DEFAULT_COMMAND_TIMEOUT};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "infracheck.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    pub module: ModuleSection,
    pub tool: ToolSection,
    pub probe: ProbeSection,
    pub cases: CasesSection,

    /// Directory relative module paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleSection {
    pub directory: PathBuf,
    pub color: bool,
    /// Give each case its own copy of the module directory.
    pub isolate: bool,
    /// Tree copied along with the module when it uses relative sources.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSection {
    pub binary: Option<PathBuf>,
    pub command_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSection {
    pub max_attempts: u32,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CasesSection {
    pub basic: BasicCase,
    pub plan: PlanCase,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasicCase {
    pub vars: BTreeMap<String, VarValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanCase {
    pub vars: BTreeMap<String, VarValue>,
    pub expect_resources: Vec<String>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            module: ModuleSection::default(),
            tool: ToolSection::default(),
            probe: ProbeSection::default(),
            cases: CasesSection::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Default for ModuleSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("examples/basic"),
            color: false,
            isolate: true,
            root: None,
        }
    }
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval_secs: DEFAULT_INTERVAL.as_secs(),
        }
    }
}

impl Default for BasicCase {
    fn default() -> Self {
        Self {
            vars: BTreeMap::from([("environment".to_string(), VarValue::from("test"))]),
        }
    }
}

impl Default for PlanCase {
    fn default() -> Self {
        Self {
            vars: BTreeMap::from([("environment".to_string(), VarValue::from("plan-test"))]),
            expect_resources: DEFAULT_PLAN_RESOURCES
                .iter()
                .map(|r| r.to_string())
                .collect(),
        }
    }
}

impl SuiteConfig {
    /// Load a config file. Relative paths inside it resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::parse(&content).map_err(|source| Error::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        // Absolute, so resolved paths compare equal to absolute CLI paths
        config.base_dir = if parent.is_absolute() {
            parent.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| Error::io(parent, e))?
                .join(parent)
        };
        Ok(config)
    }

    /// Load `path` if given, else `infracheck.toml` if present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn module_directory(&self) -> PathBuf {
        self.resolve(&self.module.directory)
    }

    pub fn module_root(&self) -> Option<PathBuf> {
        self.module.root.as_ref().map(|root| self.resolve(root))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn basic_module(&self) -> ModuleConfig {
        ModuleConfig::new(self.module_directory())
            .with_color(self.module.color)
            .with_vars(self.cases.basic.vars.clone())
    }

    pub fn plan_module(&self) -> ModuleConfig {
        ModuleConfig::new(self.module_directory())
            .with_color(self.module.color)
            .with_vars(self.cases.plan.vars.clone())
    }

    pub fn probe_policy(&self) -> Result<ProbePolicy> {
        ProbePolicy::new(
            self.probe.max_attempts,
            Duration::from_secs(self.probe.interval_secs),
        )
    }

    pub fn tool_options(&self) -> ToolOptions {
        ToolOptions {
            binary: self.tool.binary.clone(),
            command_timeout: self
                .tool
                .command_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT),
        }
    }
}
