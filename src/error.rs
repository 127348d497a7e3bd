//! Library error type.
//!
//! Failures of the provisioning tool are fatal to the case that hit them.
//! Assertion failures and probe exhaustion are not errors; they are reported
//! through [`crate::checks::CheckReport`] instead.

use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No provisioning binary could be located.
    #[error("no provisioning tool found (looked for: {searched})")]
    ToolNotFound { searched: String },

    /// The tool exited non-zero, could not be spawned, or timed out.
    #[error("`{command}` failed (exit code: {}):\n{stderr}", display_code(.exit_code))]
    ToolInvocation {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("output `{name}` is not declared by the module")]
    MissingOutput { name: String },

    #[error("malformed tool output: {reason}")]
    MalformedOutput { reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid probe policy: {0}")]
    InvalidPolicy(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the external tool itself.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            Error::ToolInvocation { .. } | Error::ToolNotFound { .. }
        )
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}
