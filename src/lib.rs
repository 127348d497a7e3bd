pub mod checks;
pub mod commands;
pub mod config;
pub mod deployment;
pub mod error;
pub mod probe;
pub mod suite;
pub mod terraform;

pub use config::{ModuleConfig, SuiteConfig, VarValue};
pub use deployment::Deployment;
pub use error::{Error, Result};
pub use probe::{ProbePolicy, ProbeResult, Prober};
pub use suite::{CaseKind, CaseReport, SuiteReport};
pub use terraform::{OutputSet, Provisioner, Terraform};
