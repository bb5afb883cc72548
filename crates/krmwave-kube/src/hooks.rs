//! Wave hook execution
//!
//! A hook run evaluates the conditions one wave declares for one hook type:
//! every `waitForCRDs` entry in order, then every `waitForRollouts` entry in
//! order. All of them share a single [`Deadline`] created when the run starts.
//! The first failing condition aborts the run.

use std::time::{Duration, Instant};

use krmwave_core::{Config, HookSet, HookType, Wave, WaveManifest};
use tracing::{debug, info};

use crate::cluster::ClusterOps;
use crate::deadline::Deadline;
use crate::error::{KubeError, Result};
use crate::progress::ProgressReporter;
use crate::wait::{wait_for_crd, wait_for_rollout};

/// Budget and polling settings for hook runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Total budget for one hook run
    pub budget: Duration,
    /// Delay between CRD existence checks
    pub poll_interval: Duration,
}

impl WaitOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            budget: config.wait_budget,
            poll_interval: config.poll_interval,
        }
    }
}

/// Runs a wave's hooks against a cluster
pub struct HookExecutor<'a, C: ClusterOps + ?Sized> {
    cluster: &'a C,
    options: WaitOptions,
    progress: &'a ProgressReporter,
}

impl<'a, C: ClusterOps + ?Sized> HookExecutor<'a, C> {
    pub fn new(cluster: &'a C, options: WaitOptions, progress: &'a ProgressReporter) -> Self {
        Self {
            cluster,
            options,
            progress,
        }
    }

    /// Run the hooks of `hook_type` declared by `wave`.
    ///
    /// Returns the number of conditions satisfied. A wave without a manifest,
    /// or without hooks of this type, succeeds without touching the cluster.
    pub async fn run_hooks(&self, wave: &Wave, hook_type: HookType) -> Result<usize> {
        let manifest = wave
            .load_manifest()
            .map_err(|e| KubeError::hook_failed(wave, hook_type, e.into()))?;
        self.run_declared(wave, &manifest, hook_type).await
    }

    /// Like [`run_hooks`](Self::run_hooks), with the wave's manifest already loaded
    pub async fn run_declared(
        &self,
        wave: &Wave,
        manifest: &WaveManifest,
        hook_type: HookType,
    ) -> Result<usize> {
        self.run(wave, manifest.hook_set(hook_type), hook_type)
            .await
            .map_err(|e| KubeError::hook_failed(wave, hook_type, e))
    }

    async fn run(&self, wave: &Wave, hooks: &HookSet, hook_type: HookType) -> Result<usize> {
        if hooks.is_empty() {
            debug!(wave = %wave.name, %hook_type, "no hooks");
            return Ok(0);
        }

        info!(
            wave = %wave.name,
            %hook_type,
            crds = hooks.crds().len(),
            rollouts = hooks.rollouts().len(),
            "running hooks"
        );

        let deadline = Deadline::after(self.options.budget);

        for crd in hooks.crds() {
            self.progress.wait_start(hook_type, "CRD", crd);
            let started = Instant::now();
            let result =
                wait_for_crd(self.cluster, crd, &deadline, self.options.poll_interval).await;
            self.progress
                .wait_result(crd, result.is_ok(), started.elapsed());
            result?;
        }

        for rollout in hooks.rollouts() {
            self.progress.wait_start(hook_type, "rollout", rollout);
            let started = Instant::now();
            let result = wait_for_rollout(self.cluster, rollout, &deadline).await;
            self.progress
                .wait_result(rollout, result.is_ok(), started.elapsed());
            result?;
        }

        Ok(hooks.len())
    }
}
