//! krmwave Kube - cluster integration for krmwave
//!
//! This crate provides:
//! - **Cluster collaborators**: the `ClusterOps` trait with a `kubectl`-backed
//!   implementation and an in-memory `MockCluster` for tests
//! - **Deadlines**: one absolute wait budget per hook run
//! - **Waiters**: wait for a CRD to be Established, wait for a rollout
//! - **Hooks**: run a wave's `preApply` / `postApply` conditions in order
//! - **Orchestration**: apply a cluster's waves strictly in sequence
//! - **Cluster lifecycle**: local k3d clusters and image registry
//! - **Progress Reporting**: human-readable feedback on stderr

pub mod cluster;
pub mod deadline;
pub mod error;
pub mod hooks;
pub mod k3d;
pub mod kubectl;
pub mod mock;
pub mod orchestrator;
pub mod progress;
pub mod tool;
pub mod wait;

pub use cluster::ClusterOps;
pub use deadline::Deadline;
pub use error::{KubeError, Result};
pub use hooks::{HookExecutor, WaitOptions};
pub use k3d::{K3d, K3dCluster, K3dNode, K3dRegistry};
pub use kubectl::Kubectl;
pub use mock::{ClusterCall, MockCluster};
pub use orchestrator::{ApplyOrchestrator, ApplyReport, OrchestratorState};
pub use progress::ProgressReporter;
pub use tool::{ToolOutput, format_timeout, run_tool};
pub use wait::{wait_for_crd, wait_for_rollout};
