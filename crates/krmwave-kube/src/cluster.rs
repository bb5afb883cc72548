//! Cluster collaborator trait
//!
//! Everything the orchestrator needs from a cluster goes through
//! [`ClusterOps`]. The production implementation shells out to `kubectl`
//! ([`crate::Kubectl`]); tests use [`crate::MockCluster`].

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use krmwave_core::RolloutRef;

use crate::error::Result;
use crate::tool::ToolOutput;

/// Operations the orchestrator performs against a cluster.
///
/// Each call returns the tool's exit status and diagnostic text. An `Err` means
/// the call could not be made at all.
#[async_trait]
pub trait ClusterOps: Send + Sync {
    /// Server-side apply every resource under `dir` (kustomize layout)
    async fn apply(&self, dir: &Path) -> Result<ToolOutput>;

    /// Query whether the named CRD exists; success means it does
    async fn crd_exists(&self, name: &str) -> Result<ToolOutput>;

    /// Block until the CRD is Established or `timeout` elapses
    async fn wait_crd_established(&self, name: &str, timeout: Duration) -> Result<ToolOutput>;

    /// Block until the deployment rollout completes or `timeout` elapses
    async fn wait_rollout(&self, rollout: &RolloutRef, timeout: Duration) -> Result<ToolOutput>;
}

#[async_trait]
impl<T: ClusterOps + ?Sized> ClusterOps for &T {
    async fn apply(&self, dir: &Path) -> Result<ToolOutput> {
        (**self).apply(dir).await
    }

    async fn crd_exists(&self, name: &str) -> Result<ToolOutput> {
        (**self).crd_exists(name).await
    }

    async fn wait_crd_established(&self, name: &str, timeout: Duration) -> Result<ToolOutput> {
        (**self).wait_crd_established(name, timeout).await
    }

    async fn wait_rollout(&self, rollout: &RolloutRef, timeout: Duration) -> Result<ToolOutput> {
        (**self).wait_rollout(rollout, timeout).await
    }
}
