//! Error types for krmwave-kube

use std::path::PathBuf;
use std::time::Duration;

use krmwave_core::{CoreError, HookType, Wave};
use thiserror::Error;

/// Result type for krmwave-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while driving a cluster
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// An external tool could not be run at all
    #[error("failed to run '{program}': {message}")]
    ToolInvocation { program: String, message: String },

    /// An external tool ran and reported failure
    #[error("`{command}` failed:\n{output}")]
    ToolFailed { command: String, output: String },

    /// Applying a directory of manifests failed
    #[error("failed to apply manifests in {}:\n{output}", path.display())]
    ApplyFailed { path: PathBuf, output: String },

    /// A CRD exists but did not reach the Established condition
    #[error("CRD '{name}' did not become established:\n{output}")]
    CrdNotEstablished { name: String, output: String },

    /// A deployment rollout did not complete
    #[error("rollout of deployment '{name}' in namespace '{namespace}' did not complete:\n{output}")]
    RolloutFailed {
        namespace: String,
        name: String,
        output: String,
    },

    /// A wait condition ran out of budget
    #[error("timed out waiting for {what} (budget {})", humantime::format_duration(*budget))]
    Timeout { what: String, budget: Duration },

    /// A hook run failed; the cause is in `source`
    #[error("{hook_type} hooks failed for wave {}", wave.display())]
    HookFailed {
        wave: PathBuf,
        hook_type: HookType,
        #[source]
        source: Box<KubeError>,
    },

    /// Tool output could not be parsed
    #[error("failed to parse output of '{command}': {message}")]
    UnexpectedOutput { command: String, message: String },

    /// Manifest, discovery or configuration error
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl KubeError {
    /// Attach wave and hook type context to a hook failure
    pub fn hook_failed(wave: &Wave, hook_type: HookType, source: KubeError) -> Self {
        KubeError::HookFailed {
            wave: wave.path.clone(),
            hook_type,
            source: Box::new(source),
        }
    }

    /// Innermost error, looking through hook context
    pub fn root_cause(&self) -> &KubeError {
        match self {
            KubeError::HookFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check if a wait condition ran out of budget
    pub fn is_timeout(&self) -> bool {
        matches!(self.root_cause(), KubeError::Timeout { .. })
    }

    /// Check if a hook declaration was structurally invalid
    pub fn is_malformed_hook(&self) -> bool {
        matches!(
            self.root_cause(),
            KubeError::Core(CoreError::MalformedHook { .. })
        )
    }

    /// Check if an external tool failed or could not be run
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self.root_cause(),
            KubeError::ToolInvocation { .. }
                | KubeError::ToolFailed { .. }
                | KubeError::ApplyFailed { .. }
                | KubeError::CrdNotEstablished { .. }
                | KubeError::RolloutFailed { .. }
                | KubeError::UnexpectedOutput { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> KubeError {
        KubeError::Timeout {
            what: "CRD widgets.example.com to exist".to_string(),
            budget: Duration::from_secs(180),
        }
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(
            timeout().to_string(),
            "timed out waiting for CRD widgets.example.com to exist (budget 3m)"
        );
    }

    #[test]
    fn test_predicates_see_through_hook_context() {
        let err = KubeError::HookFailed {
            wave: PathBuf::from("config/clusters/dev/wave0"),
            hook_type: HookType::PostApply,
            source: Box::new(timeout()),
        };

        assert!(err.is_timeout());
        assert!(!err.is_malformed_hook());
        assert!(!err.is_tool_failure());
        assert_eq!(
            err.to_string(),
            "postApply hooks failed for wave config/clusters/dev/wave0"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_malformed_hook_predicate() {
        let err = KubeError::HookFailed {
            wave: PathBuf::from("wave1"),
            hook_type: HookType::PreApply,
            source: Box::new(KubeError::Core(CoreError::MalformedHook {
                message: "invalid rollout 'dep'".to_string(),
            })),
        };

        assert!(err.is_malformed_hook());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_tool_failure_predicate() {
        let err = KubeError::RolloutFailed {
            namespace: "ns".to_string(),
            name: "dep".to_string(),
            output: "error: deployment \"dep\" exceeded its progress deadline".to_string(),
        };
        assert!(err.is_tool_failure());
        assert!(err.to_string().contains("namespace 'ns'"));
        assert!(err.to_string().contains("exceeded its progress deadline"));
    }
}
