//! Invocation configuration
//!
//! Configuration is built once at startup (file, then command-line/env
//! overrides) and passed down explicitly. Nothing below the CLI reads the
//! process environment.
//!
//! ```yaml
//! cluster: dev
//! kubectl: /usr/local/bin/kubectl
//! clustersDir: config/clusters
//! waitBudget: 3m
//! pollInterval: 1s
//! registry:
//!   name: local-registry
//!   port: 5555
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CoreError, Result};

/// Full krmwave configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Target cluster name
    #[serde(default)]
    pub cluster: String,

    /// kubectl binary
    #[serde(default = "default_kubectl")]
    pub kubectl: PathBuf,

    /// k3d binary
    #[serde(default = "default_k3d")]
    pub k3d: PathBuf,

    /// k3d cluster config file passed on cluster creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k3d_config: Option<PathBuf>,

    /// kubeconfig context passed to every kubectl call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_context: Option<String>,

    /// Directory holding one manifest root per cluster
    #[serde(default = "default_clusters_dir")]
    pub clusters_dir: PathBuf,

    /// Total wait budget for one hook run
    #[serde(default = "default_wait_budget", with = "humantime_serde")]
    pub wait_budget: Duration,

    /// Delay between CRD existence checks
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Local image registry
    #[serde(default)]
    pub registry: RegistryConfig,

    /// `KEY=VALUE` env entry marking k3d nodes created by krmwave
    #[serde(default = "default_managed_label")]
    pub managed_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster: String::new(),
            kubectl: default_kubectl(),
            k3d: default_k3d(),
            k3d_config: None,
            kube_context: None,
            clusters_dir: default_clusters_dir(),
            wait_budget: default_wait_budget(),
            poll_interval: default_poll_interval(),
            registry: RegistryConfig::default(),
            managed_label: default_managed_label(),
        }
    }
}

fn default_kubectl() -> PathBuf {
    PathBuf::from("kubectl")
}

fn default_k3d() -> PathBuf {
    PathBuf::from("k3d")
}

fn default_clusters_dir() -> PathBuf {
    PathBuf::from("config/clusters")
}

fn default_wait_budget() -> Duration {
    Duration::from_secs(180)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_managed_label() -> String {
    "KRMWAVE_MANAGED=1".to_string()
}

/// Local image registry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    #[serde(default = "default_registry_name")]
    pub name: String,

    #[serde(default = "default_registry_port")]
    pub port: u16,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: default_registry_name(),
            port: default_registry_port(),
        }
    }
}

fn default_registry_name() -> String {
    "local-registry".to_string()
}

fn default_registry_port() -> u16 {
    5555
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| CoreError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(config)
    }

    /// Check values that cannot be expressed by types alone
    pub fn validate(&self) -> Result<()> {
        if self.wait_budget.is_zero() {
            return Err(CoreError::InvalidConfig {
                message: "waitBudget must be greater than zero".to_string(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::InvalidConfig {
                message: "pollInterval must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the manifest root of the configured cluster
    pub fn cluster_target(&self) -> Result<ClusterTarget> {
        let name = self.cluster.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "no cluster name configured".to_string(),
            });
        }
        if name.contains('/') || name.contains('\\') || name == ".." {
            return Err(CoreError::InvalidConfig {
                message: format!("invalid cluster name '{}'", name),
            });
        }

        Ok(ClusterTarget::new(name, self.clusters_dir.join(name)))
    }
}

/// The cluster being deployed and its manifest root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterTarget {
    pub name: String,
    pub root: PathBuf,
}

impl ClusterTarget {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}
