//! CLI error types with exit code handling
//!
//! Library errors are folded into [`CliError`] at the command boundary so
//! that `main` has one place mapping failures to exit codes.

use miette::Diagnostic;
use thiserror::Error;

use krmwave_core::CoreError;
use krmwave_kube::KubeError;

use crate::exit_codes;

pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Missing or invalid configuration
    #[error("{message}")]
    #[diagnostic(code(krmwave::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid wave manifest, malformed hook, missing manifest root
    #[error("{message}")]
    #[diagnostic(code(krmwave::cli::manifest))]
    Manifest {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// kubectl or k3d failed
    #[error("{message}")]
    #[diagnostic(code(krmwave::cli::tool))]
    Tool {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A hook condition did not hold within the wait budget
    #[error("{message}")]
    #[diagnostic(
        code(krmwave::cli::timeout),
        help("Check the workload in the cluster, or raise the budget with --wait-budget")
    )]
    Timeout { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("{message}")]
    #[diagnostic(code(krmwave::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(krmwave::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Manifest { .. } => exit_codes::MANIFEST_ERROR,
            CliError::Tool { .. } => exit_codes::TOOL_ERROR,
            CliError::Timeout { .. } => exit_codes::TIMEOUT,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    fn manifest(message: String) -> Self {
        Self::Manifest {
            message,
            help: None,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ClusterRootNotFound { .. } => CliError::Manifest {
                message,
                help: Some(
                    "Each cluster needs a directory under the clusters dir (see --clusters-dir)"
                        .to_string(),
                ),
            },
            CoreError::InvalidWaveManifest { .. } | CoreError::MalformedHook { .. } => {
                CliError::manifest(message)
            }
            CoreError::InvalidConfig { .. } => CliError::Config {
                message,
                help: None,
            },
            CoreError::Io(_) => CliError::Io { message },
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        let message = describe(&err);

        if err.is_timeout() {
            return CliError::Timeout { message };
        }

        match err.root_cause() {
            KubeError::ToolInvocation { program, .. } => CliError::Tool {
                help: Some(format!(
                    "Make sure '{}' is installed, or point krmwave at it with --kubectl / --k3d",
                    program
                )),
                message,
            },
            KubeError::Core(CoreError::InvalidConfig { .. }) => CliError::Config {
                message,
                help: None,
            },
            KubeError::Core(CoreError::Io(_)) => CliError::Io { message },
            KubeError::Core(_) if err.is_malformed_hook() => CliError::Manifest {
                message,
                help: Some("Rollout hooks take the form <namespace>/<deployment>".to_string()),
            },
            KubeError::Core(_) => CliError::manifest(message),
            _ if err.is_tool_failure() => CliError::Tool {
                message,
                help: None,
            },
            _ => CliError::Other { message },
        }
    }
}

/// Hook failures carry the wave context outside and the cause inside
fn describe(err: &KubeError) -> String {
    match err {
        KubeError::HookFailed { source, .. } => format!("{}: {}", err, describe(source)),
        other => other.to_string(),
    }
}
