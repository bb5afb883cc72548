//! Local cluster and registry lifecycle through `k3d`
//!
//! Only clusters whose nodes carry the configured marker env entry (by
//! default `KRMWAVE_MANAGED=1`) are considered managed by krmwave; listing and
//! bulk deletion never touch other k3d clusters on the machine.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use krmwave_core::{Config, RegistryConfig};
use tracing::info;

use crate::error::{KubeError, Result};
use crate::tool::{ToolOutput, command_line, run_tool};

/// A cluster as reported by `k3d cluster list -o json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct K3dCluster {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<K3dNode>,
}

/// A cluster node as reported by k3d
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct K3dNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub env: Option<Vec<String>>,
}

impl K3dCluster {
    /// Whether any node carries the marker env entry
    pub fn is_managed(&self, marker: &str) -> bool {
        self.nodes
            .iter()
            .any(|n| n.env.as_deref().unwrap_or(&[]).iter().any(|e| e == marker))
    }
}

/// A registry as reported by `k3d registry list -o json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct K3dRegistry {
    pub name: String,
}

/// Wrapper around the `k3d` binary
#[derive(Debug, Clone)]
pub struct K3d {
    binary: PathBuf,
    config: Option<PathBuf>,
    managed_label: String,
    registry: RegistryConfig,
}

impl K3d {
    pub fn from_config(config: &Config) -> Self {
        Self {
            binary: config.k3d.clone(),
            config: config.k3d_config.clone(),
            managed_label: config.managed_label.clone(),
            registry: config.registry.clone(),
        }
    }

    /// Registry name as k3d reports it (k3d prefixes `k3d-`)
    pub fn registry_full_name(&self) -> String {
        format!("k3d-{}", self.registry.name)
    }

    pub fn registry(&self) -> &RegistryConfig {
        &self.registry
    }

    async fn run(&self, args: Vec<String>) -> Result<(String, ToolOutput)> {
        let command = command_line(&self.binary, &args);
        let output = run_tool(&self.binary, &args).await?;
        Ok((command, output))
    }

    /// Run and fail on a non-zero exit
    async fn run_checked(&self, args: Vec<String>) -> Result<ToolOutput> {
        let (command, output) = self.run(args).await?;
        if !output.success() {
            return Err(KubeError::ToolFailed {
                command,
                output: output.output,
            });
        }
        Ok(output)
    }

    /// Run and parse stdout as JSON; k3d logs warnings on stderr
    async fn run_json<T: DeserializeOwned>(&self, args: Vec<String>) -> Result<T> {
        let command = command_line(&self.binary, &args);
        let output = self.run_checked(args).await?;
        parse_json(&command, &output.stdout)
    }

    /// Clusters managed by krmwave
    pub async fn list_clusters(&self) -> Result<Vec<K3dCluster>> {
        let clusters: Vec<K3dCluster> = self
            .run_json(strings(&["cluster", "list", "-o", "json"]))
            .await?;
        Ok(clusters
            .into_iter()
            .filter(|c| c.is_managed(&self.managed_label))
            .collect())
    }

    pub async fn cluster_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_clusters().await?.iter().any(|c| c.name == name))
    }

    fn create_cluster_args(&self, name: &str) -> Vec<String> {
        let mut args = strings(&["cluster", "create", name]);
        if let Some(config) = &self.config {
            args.push("--config".to_string());
            args.push(config.display().to_string());
        }
        args.push("--env".to_string());
        args.push(format!("{}@server:*", self.managed_label));
        args
    }

    /// Create a cluster unless it already exists; returns whether it was created
    pub async fn create_cluster(&self, name: &str) -> Result<bool> {
        if self.cluster_exists(name).await? {
            info!(cluster = name, "cluster already exists");
            return Ok(false);
        }

        self.run_checked(self.create_cluster_args(name)).await?;
        info!(cluster = name, "created cluster");
        Ok(true)
    }

    /// Delete a cluster if it exists; returns whether it was deleted
    pub async fn delete_cluster(&self, name: &str) -> Result<bool> {
        if !self.cluster_exists(name).await? {
            return Ok(false);
        }

        self.delete_cluster_unchecked(name).await?;
        Ok(true)
    }

    async fn delete_cluster_unchecked(&self, name: &str) -> Result<()> {
        self.run_checked(strings(&["cluster", "delete", name]))
            .await?;
        info!(cluster = name, "deleted cluster");
        Ok(())
    }

    /// Delete every managed cluster; returns the deleted names
    pub async fn delete_all_clusters(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for cluster in self.list_clusters().await? {
            self.delete_cluster_unchecked(&cluster.name).await?;
            deleted.push(cluster.name);
        }
        Ok(deleted)
    }

    pub async fn registry_exists(&self) -> Result<bool> {
        let registries: Vec<K3dRegistry> = self
            .run_json(strings(&["registry", "list", "-o", "json"]))
            .await?;
        let full_name = self.registry_full_name();
        Ok(registries.iter().any(|r| r.name == full_name))
    }

    /// Registries managed by krmwave (at most the configured one)
    pub async fn list_registries(&self) -> Result<Vec<String>> {
        if self.registry_exists().await? {
            Ok(vec![self.registry.name.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    fn create_registry_args(&self) -> Vec<String> {
        let port = self.registry.port.to_string();
        strings(&["registry", "create", &self.registry.name, "--port", &port])
    }

    /// Create the registry unless it already exists; returns whether it was created
    pub async fn create_registry(&self) -> Result<bool> {
        if self.registry_exists().await? {
            return Ok(false);
        }

        self.run_checked(self.create_registry_args()).await?;
        info!(
            registry = %self.registry.name,
            port = self.registry.port,
            "created registry"
        );
        Ok(true)
    }

    /// Delete the registry if it exists; returns whether it was deleted
    pub async fn delete_registry(&self) -> Result<bool> {
        if !self.registry_exists().await? {
            return Ok(false);
        }

        self.run_checked(strings(&["registry", "delete", &self.registry.name]))
            .await?;
        info!(registry = %self.registry.name, "deleted registry");
        Ok(true)
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn parse_json<T: DeserializeOwned>(command: &str, text: &str) -> Result<T> {
    // k3d prints nothing at all when there is nothing to list
    let text = if text.trim().is_empty() { "[]" } else { text };
    serde_json::from_str(text).map_err(|e| KubeError::UnexpectedOutput {
        command: command.to_string(),
        message: e.to_string(),
    })
}
