//! In-memory cluster for testing
//!
//! [`MockCluster`] records every call made through [`ClusterOps`] and answers
//! from scripted behaviour, so orchestration can be tested without a cluster
//! or a `kubectl` binary. Waits that "take time" sleep on the tokio clock,
//! which makes them instant under a paused test runtime.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use krmwave_core::RolloutRef;

use crate::cluster::ClusterOps;
use crate::error::Result;
use crate::tool::ToolOutput;

/// A call recorded by [`MockCluster`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    Apply {
        dir: PathBuf,
    },
    CrdExists {
        name: String,
    },
    WaitCrdEstablished {
        name: String,
        timeout: Duration,
    },
    WaitRollout {
        namespace: String,
        name: String,
        timeout: Duration,
    },
}

impl ClusterCall {
    /// Whether this call waits on or queries cluster state (anything but apply)
    pub fn is_wait(&self) -> bool {
        !matches!(self, ClusterCall::Apply { .. })
    }
}

#[derive(Debug, Default, Clone)]
struct CrdBehavior {
    /// Existence queries answered "not found" before the CRD shows up
    hidden_for: usize,
    /// Existence queries seen so far
    queries: usize,
    establish_takes: Duration,
    never_established: bool,
}

#[derive(Debug, Default, Clone)]
struct RolloutBehavior {
    takes: Duration,
    fails: bool,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<ClusterCall>,
    crds: HashMap<String, CrdBehavior>,
    rollouts: HashMap<String, RolloutBehavior>,
    failing_applies: HashSet<PathBuf>,
}

/// Scripted in-memory cluster.
///
/// Unknown CRDs never exist. Unknown rollouts complete immediately.
#[derive(Debug, Clone, Default)]
pub struct MockCluster {
    state: Arc<RwLock<MockState>>,
}

impl MockCluster {
    /// Create a new mock cluster with no CRDs
    pub fn new() -> Self {
        Self::default()
    }

    /// A CRD that exists and is Established immediately
    pub fn with_crd(self, name: &str) -> Self {
        self.with_crd_behavior(name, CrdBehavior::default())
    }

    /// A CRD that only shows up after `queries` existence checks
    pub fn with_crd_after(self, name: &str, queries: usize) -> Self {
        self.with_crd_behavior(
            name,
            CrdBehavior {
                hidden_for: queries,
                ..CrdBehavior::default()
            },
        )
    }

    /// A CRD that exists but takes `takes` to become Established
    pub fn with_slow_crd(self, name: &str, takes: Duration) -> Self {
        self.with_crd_behavior(
            name,
            CrdBehavior {
                establish_takes: takes,
                ..CrdBehavior::default()
            },
        )
    }

    /// A CRD that exists but whose Established wait fails
    pub fn with_unestablished_crd(self, name: &str) -> Self {
        self.with_crd_behavior(
            name,
            CrdBehavior {
                never_established: true,
                ..CrdBehavior::default()
            },
        )
    }

    /// A rollout that takes `takes` to complete
    pub fn with_slow_rollout(self, rollout: &str, takes: Duration) -> Self {
        self.with_rollout_behavior(
            rollout,
            RolloutBehavior {
                takes,
                fails: false,
            },
        )
    }

    /// A rollout that fails
    pub fn with_failing_rollout(self, rollout: &str) -> Self {
        self.with_rollout_behavior(
            rollout,
            RolloutBehavior {
                takes: Duration::ZERO,
                fails: true,
            },
        )
    }

    /// Applying `dir` fails
    pub fn with_failing_apply(self, dir: impl Into<PathBuf>) -> Self {
        self.state.write().unwrap().failing_applies.insert(dir.into());
        self
    }

    fn with_crd_behavior(self, name: &str, behavior: CrdBehavior) -> Self {
        self.state
            .write()
            .unwrap()
            .crds
            .insert(name.to_string(), behavior);
        self
    }

    fn with_rollout_behavior(self, rollout: &str, behavior: RolloutBehavior) -> Self {
        self.state
            .write()
            .unwrap()
            .rollouts
            .insert(rollout.to_string(), behavior);
        self
    }

    fn record(&self, call: ClusterCall) {
        self.state.write().unwrap().calls.push(call);
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.state.read().unwrap().calls.clone()
    }

    /// Directories applied so far, in order
    pub fn applied_dirs(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ClusterCall::Apply { dir } => Some(dir),
                _ => None,
            })
            .collect()
    }

    /// Number of existence queries made for a CRD
    pub fn crd_queries(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ClusterCall::CrdExists { name: n } if n == name))
            .count()
    }

    /// Forget recorded calls, keeping scripted behaviour
    pub fn reset_calls(&self) {
        let mut state = self.state.write().unwrap();
        state.calls.clear();
        for crd in state.crds.values_mut() {
            crd.queries = 0;
        }
    }
}

/// Sleep for `takes`, or fail once `timeout` elapses first
async fn simulate_wait(takes: Duration, timeout: Duration, what: &str) -> ToolOutput {
    if takes > timeout {
        tokio::time::sleep(timeout).await;
        ToolOutput::failed(1, format!("error: timed out waiting for the condition on {}", what))
    } else {
        tokio::time::sleep(takes).await;
        ToolOutput::ok(format!("{} condition met", what))
    }
}

#[async_trait]
impl ClusterOps for MockCluster {
    async fn apply(&self, dir: &Path) -> Result<ToolOutput> {
        self.record(ClusterCall::Apply {
            dir: dir.to_path_buf(),
        });

        let fails = self.state.read().unwrap().failing_applies.contains(dir);
        if fails {
            Ok(ToolOutput::failed(
                1,
                format!("error: unable to apply {}", dir.display()),
            ))
        } else {
            Ok(ToolOutput::ok("serverside-applied"))
        }
    }

    async fn crd_exists(&self, name: &str) -> Result<ToolOutput> {
        self.record(ClusterCall::CrdExists {
            name: name.to_string(),
        });

        let mut state = self.state.write().unwrap();
        let exists = match state.crds.get_mut(name) {
            Some(crd) => {
                crd.queries += 1;
                crd.queries > crd.hidden_for
            }
            None => false,
        };

        if exists {
            Ok(ToolOutput::ok(name))
        } else {
            Ok(ToolOutput::failed(
                1,
                format!(
                    "Error from server (NotFound): customresourcedefinitions.apiextensions.k8s.io \"{}\" not found",
                    name
                ),
            ))
        }
    }

    async fn wait_crd_established(&self, name: &str, timeout: Duration) -> Result<ToolOutput> {
        self.record(ClusterCall::WaitCrdEstablished {
            name: name.to_string(),
            timeout,
        });

        let behavior = self.state.read().unwrap().crds.get(name).cloned();
        match behavior {
            Some(crd) if !crd.never_established => {
                Ok(simulate_wait(crd.establish_takes, timeout, &format!("crd/{}", name)).await)
            }
            _ => Ok(ToolOutput::failed(
                1,
                format!("error: condition established not met for crd/{}", name),
            )),
        }
    }

    async fn wait_rollout(&self, rollout: &RolloutRef, timeout: Duration) -> Result<ToolOutput> {
        self.record(ClusterCall::WaitRollout {
            namespace: rollout.namespace.clone(),
            name: rollout.name.clone(),
            timeout,
        });

        let behavior = self
            .state
            .read()
            .unwrap()
            .rollouts
            .get(&rollout.to_string())
            .cloned()
            .unwrap_or_default();

        if behavior.fails {
            return Ok(ToolOutput::failed(
                1,
                format!(
                    "error: deployment \"{}\" exceeded its progress deadline",
                    rollout.name
                ),
            ));
        }

        Ok(simulate_wait(behavior.takes, timeout, &format!("deployment/{}", rollout.name)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_crd_never_exists() {
        let mock = MockCluster::new();
        assert!(!mock.crd_exists("absent.example.com").await.unwrap().success());
        assert!(!mock.crd_exists("absent.example.com").await.unwrap().success());
        assert_eq!(mock.crd_queries("absent.example.com"), 2);
    }

    #[tokio::test]
    async fn test_crd_appears_after_queries() {
        let mock = MockCluster::new().with_crd_after("late.example.com", 2);
        assert!(!mock.crd_exists("late.example.com").await.unwrap().success());
        assert!(!mock.crd_exists("late.example.com").await.unwrap().success());
        assert!(mock.crd_exists("late.example.com").await.unwrap().success());
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let mock = MockCluster::new().with_crd("a.example.com");
        mock.apply(Path::new("wave0")).await.unwrap();
        mock.crd_exists("a.example.com").await.unwrap();
        mock.wait_crd_established("a.example.com", Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                ClusterCall::Apply {
                    dir: PathBuf::from("wave0")
                },
                ClusterCall::CrdExists {
                    name: "a.example.com".to_string()
                },
                ClusterCall::WaitCrdEstablished {
                    name: "a.example.com".to_string(),
                    timeout: Duration::from_secs(10)
                },
            ]
        );
        assert_eq!(mock.applied_dirs(), vec![PathBuf::from("wave0")]);

        mock.reset_calls();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_rollout_respects_timeout() {
        let mock = MockCluster::new().with_slow_rollout("ns/dep", Duration::from_secs(30));
        let rollout = RolloutRef::new("ns", "dep");

        assert!(!mock.wait_rollout(&rollout, Duration::from_secs(10)).await.unwrap().success());
        assert!(mock.wait_rollout(&rollout, Duration::from_secs(60)).await.unwrap().success());
    }

    #[tokio::test]
    async fn test_failing_apply() {
        let mock = MockCluster::new().with_failing_apply("wave1");
        assert!(mock.apply(Path::new("wave0")).await.unwrap().success());
        assert!(!mock.apply(Path::new("wave1")).await.unwrap().success());
    }
}
