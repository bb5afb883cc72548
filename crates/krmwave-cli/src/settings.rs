//! Global options and configuration resolution
//!
//! Precedence, lowest first: built-in defaults, the config file, then
//! command-line flags (each flag also reads its `KRMWAVE_*` env var).

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use krmwave_core::Config;

use crate::error::{CliError, Result};

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (YAML)
    #[arg(long, global = true, env = "KRMWAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cluster to operate on
    #[arg(short, long, global = true, env = "KRMWAVE_CLUSTER")]
    pub cluster: Option<String>,

    /// Directory holding one manifest root per cluster
    #[arg(long, global = true, env = "KRMWAVE_CLUSTERS_DIR")]
    pub clusters_dir: Option<PathBuf>,

    /// kubectl binary
    #[arg(long, global = true, env = "KRMWAVE_KUBECTL")]
    pub kubectl: Option<PathBuf>,

    /// k3d binary
    #[arg(long, global = true, env = "KRMWAVE_K3D")]
    pub k3d: Option<PathBuf>,

    /// k3d cluster config file used when creating clusters
    #[arg(long, global = true, env = "KRMWAVE_K3D_CONFIG")]
    pub k3d_config: Option<PathBuf>,

    /// kubeconfig context for kubectl calls
    #[arg(long, global = true, env = "KRMWAVE_CONTEXT")]
    pub context: Option<String>,

    /// Wait budget shared by all conditions of one hook run (e.g. 3m, 90s)
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub wait_budget: Option<Duration>,

    /// Delay between CRD existence checks (e.g. 1s, 500ms)
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

impl GlobalArgs {
    /// Build the configuration for this invocation
    pub fn resolve(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::config_with_help(
                        format!("config file not found: {}", path.display()),
                        "Pass an existing file with --config or unset KRMWAVE_CONFIG",
                    ));
                }
                Config::load_from(path)?
            }
            None => Config::default(),
        };

        if let Some(cluster) = &self.cluster {
            config.cluster = cluster.clone();
        }
        if let Some(dir) = &self.clusters_dir {
            config.clusters_dir = dir.clone();
        }
        if let Some(kubectl) = &self.kubectl {
            config.kubectl = kubectl.clone();
        }
        if let Some(k3d) = &self.k3d {
            config.k3d = k3d.clone();
        }
        if let Some(k3d_config) = &self.k3d_config {
            config.k3d_config = Some(k3d_config.clone());
        }
        if let Some(context) = &self.context {
            config.kube_context = Some(context.clone());
        }
        if let Some(budget) = self.wait_budget {
            config.wait_budget = budget;
        }
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval;
        }

        config.validate()?;
        Ok(config)
    }
}
