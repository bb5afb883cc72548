//! `kubectl`-backed cluster operations

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use krmwave_core::{Config, RolloutRef};

use crate::cluster::ClusterOps;
use crate::error::Result;
use crate::tool::{ToolOutput, format_timeout, run_tool};

/// Runs cluster operations through a `kubectl` binary
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
    context: Option<String>,
}

impl Kubectl {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            context: None,
        }
    }

    /// Pass `--context` on every call
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let kubectl = Self::new(&config.kubectl);
        match &config.kube_context {
            Some(context) => kubectl.with_context(context),
            None => kubectl,
        }
    }

    fn args(&self, rest: &[&str]) -> Vec<String> {
        let mut args = Vec::with_capacity(rest.len() + 2);
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        args.extend(rest.iter().map(|s| s.to_string()));
        args
    }

    fn apply_args(&self, dir: &Path) -> Vec<String> {
        let dir = dir.display().to_string();
        self.args(&["apply", "--server-side", "-k", &dir])
    }

    fn crd_exists_args(&self, name: &str) -> Vec<String> {
        self.args(&["get", "crd", name])
    }

    fn wait_crd_args(&self, name: &str, timeout: Duration) -> Vec<String> {
        let timeout = format!("--timeout={}", format_timeout(timeout));
        let target = format!("crd/{}", name);
        self.args(&["wait", "--for=condition=established", &timeout, &target])
    }

    fn rollout_args(&self, rollout: &RolloutRef, timeout: Duration) -> Vec<String> {
        let timeout = format!("--timeout={}", format_timeout(timeout));
        let target = format!("deployment/{}", rollout.name);
        self.args(&[
            "rollout",
            "status",
            &target,
            "-n",
            &rollout.namespace,
            &timeout,
        ])
    }
}

#[async_trait]
impl ClusterOps for Kubectl {
    async fn apply(&self, dir: &Path) -> Result<ToolOutput> {
        run_tool(&self.binary, &self.apply_args(dir)).await
    }

    async fn crd_exists(&self, name: &str) -> Result<ToolOutput> {
        run_tool(&self.binary, &self.crd_exists_args(name)).await
    }

    async fn wait_crd_established(&self, name: &str, timeout: Duration) -> Result<ToolOutput> {
        run_tool(&self.binary, &self.wait_crd_args(name, timeout)).await
    }

    async fn wait_rollout(&self, rollout: &RolloutRef, timeout: Duration) -> Result<ToolOutput> {
        run_tool(&self.binary, &self.rollout_args(rollout, timeout)).await
    }
}
