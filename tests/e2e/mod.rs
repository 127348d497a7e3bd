//! End-to-end tests for infracheck
//!
//! The provisioning tool is replaced either by an in-memory recorder or by a
//! fake `terraform` shell script, and probes go to a local HTTP server, so
//! nothing here touches a cloud account.

pub mod config_file;
pub mod probe_http;
#[cfg(unix)]
pub mod terraform_cli;

pub use helpers::*;
