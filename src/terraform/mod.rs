//! Provisioning lifecycle: init, plan, apply, output and destroy.
//!
//! The external tool does all of the actual work. This module only builds
//! its command lines, runs it in the module directory, and turns its exit
//! status and JSON output into typed results. There is no retry or rollback
//! here; a failed apply is fatal to the case that ran it.
//!
//! Terraform and OpenTofu share the command surface used here, so either
//! binary works.

mod command;
mod output;

pub use command::{render_command, run_tool, ToolOutput};
pub use output::{parse_outputs, parse_single_output, parse_version, OutputSet};

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ModuleConfig;
use crate::error::{Error, Result};

/// Environment variable naming the tool binary explicitly.
pub const TOOL_ENV_VAR: &str = "INFRACHECK_TERRAFORM";

/// Binaries looked up on `PATH`, in order.
pub const TOOL_CANDIDATES: &[&str] = &["terraform", "tofu"];

/// Default per-command timeout (60 minutes). Web app creation is slow.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Operations the lifecycle harness needs from a provisioning tool.
pub trait Provisioner {
    fn init(&self, config: &ModuleConfig) -> Result<()>;

    /// Returns the rendered plan text.
    fn plan(&self, config: &ModuleConfig) -> Result<String>;

    /// Applies the module and returns all of its outputs.
    fn apply(&self, config: &ModuleConfig) -> Result<OutputSet>;

    fn destroy(&self, config: &ModuleConfig) -> Result<()>;

    fn output(&self, config: &ModuleConfig, name: &str) -> Result<String>;

    fn init_and_apply(&self, config: &ModuleConfig) -> Result<OutputSet> {
        self.init(config)?;
        self.apply(config)
    }
}

/// How to find and run the tool.
#[derive(Debug, Clone)]
pub struct ToolOptions {
    pub binary: Option<PathBuf>,
    pub command_timeout: Duration,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            binary: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// [`Provisioner`] backed by the `terraform` (or `tofu`) binary.
#[derive(Debug, Clone)]
pub struct Terraform {
    binary: PathBuf,
    command_timeout: Duration,
}

impl Terraform {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Resolve the binary: explicit option, then `INFRACHECK_TERRAFORM`, then `PATH`.
    pub fn locate(options: &ToolOptions) -> Result<Self> {
        let binary = match &options.binary {
            Some(binary) => binary.clone(),
            None => match env::var_os(TOOL_ENV_VAR).filter(|v| !v.is_empty()) {
                Some(from_env) => PathBuf::from(from_env),
                None => TOOL_CANDIDATES
                    .iter()
                    .find_map(|name| which::which(name).ok())
                    .ok_or_else(|| Error::ToolNotFound {
                        searched: format!("{TOOL_ENV_VAR}, {}", TOOL_CANDIDATES.join(", ")),
                    })?,
            },
        };
        tracing::debug!(binary = %binary.display(), "using provisioning tool");
        Ok(Self::new(binary).with_timeout(options.command_timeout))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn version(&self) -> Result<semver::Version> {
        let out = self.run(Path::new("."), &["version".to_string(), "-json".to_string()])?;
        parse_version(&out.stdout)
    }

    fn run(&self, dir: &Path, args: &[String]) -> Result<ToolOutput> {
        run_tool(&self.binary, args, dir, self.command_timeout)?.into_checked()
    }

    pub(crate) fn init_args(config: &ModuleConfig) -> Vec<String> {
        let mut args = vec![
            "init".to_string(),
            "-upgrade=false".to_string(),
            "-input=false".to_string(),
        ];
        push_color(&mut args, config);
        args
    }

    pub(crate) fn plan_args(config: &ModuleConfig) -> Vec<String> {
        let mut args = vec![
            "plan".to_string(),
            "-input=false".to_string(),
            "-lock=false".to_string(),
        ];
        push_color(&mut args, config);
        args.extend(config.var_args());
        args
    }

    pub(crate) fn apply_args(config: &ModuleConfig) -> Vec<String> {
        let mut args = vec![
            "apply".to_string(),
            "-input=false".to_string(),
            "-auto-approve".to_string(),
            "-lock=false".to_string(),
        ];
        push_color(&mut args, config);
        args.extend(config.var_args());
        args
    }

    pub(crate) fn destroy_args(config: &ModuleConfig) -> Vec<String> {
        let mut args = vec![
            "destroy".to_string(),
            "-input=false".to_string(),
            "-auto-approve".to_string(),
            "-lock=false".to_string(),
        ];
        push_color(&mut args, config);
        args.extend(config.var_args());
        args
    }

    pub(crate) fn output_args(config: &ModuleConfig, name: Option<&str>) -> Vec<String> {
        let mut args = vec!["output".to_string(), "-json".to_string()];
        push_color(&mut args, config);
        if let Some(name) = name {
            args.push(name.to_string());
        }
        args
    }
}

fn push_color(args: &mut Vec<String>, config: &ModuleConfig) {
    if !config.color() {
        args.push("-no-color".to_string());
    }
}

impl Provisioner for Terraform {
    fn init(&self, config: &ModuleConfig) -> Result<()> {
        self.run(config.directory(), &Self::init_args(config))?;
        Ok(())
    }

    fn plan(&self, config: &ModuleConfig) -> Result<String> {
        let out = self.run(config.directory(), &Self::plan_args(config))?;
        Ok(out.stdout)
    }

    fn apply(&self, config: &ModuleConfig) -> Result<OutputSet> {
        self.run(config.directory(), &Self::apply_args(config))?;
        let out = self.run(config.directory(), &Self::output_args(config, None))?;
        let outputs = parse_outputs(&out.stdout)?;
        tracing::info!(
            count = outputs.len(),
            "apply finished in {}",
            config.directory().display()
        );
        Ok(outputs)
    }

    fn destroy(&self, config: &ModuleConfig) -> Result<()> {
        self.run(config.directory(), &Self::destroy_args(config))?;
        Ok(())
    }

    fn output(&self, config: &ModuleConfig, name: &str) -> Result<String> {
        let out = run_tool(
            &self.binary,
            &Self::output_args(config, Some(name)),
            config.directory(),
            self.command_timeout,
        )?;
        if !out.success() && output::is_missing_output(&out.stderr) {
            return Err(Error::MissingOutput {
                name: name.to_string(),
            });
        }
        let out = out.into_checked()?;
        parse_single_output(&out.stdout)
    }
}
