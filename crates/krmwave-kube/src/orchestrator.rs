//! Wave orchestration
//!
//! The orchestrator applies a cluster's manifest root:
//!
//! ```text
//! Idle ──► ApplyingWave(0) ──► ApplyingWave(1) ──► ... ──► Done
//!   │            │                   │
//!   └────────────┴───────────────────┴──────────────────► Failed
//! ```
//!
//! Each wave runs its `preApply` hooks, is applied, then runs its `postApply`
//! hooks. Any failure stops the sequence. Waves already applied stay applied.

use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use krmwave_core::{ApplyPlan, ClusterTarget, HookType, Wave, discover};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cluster::ClusterOps;
use crate::error::{KubeError, Result};
use crate::hooks::{HookExecutor, WaitOptions};
use crate::progress::ProgressReporter;

/// Where the orchestrator is in its sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrchestratorState {
    Idle,
    /// Processing the wave at this index
    ApplyingWave(usize),
    Done,
    Failed,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub cluster: String,
    pub strategy: String,
    /// Directories applied, in order
    pub applied: Vec<String>,
    /// Hook conditions satisfied across all waves
    pub conditions_met: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Applies a cluster's waves strictly in sequence
pub struct ApplyOrchestrator<C: ClusterOps> {
    cluster: C,
    options: WaitOptions,
    progress: ProgressReporter,
    state: OrchestratorState,
}

impl<C: ClusterOps> ApplyOrchestrator<C> {
    pub fn new(cluster: C, options: WaitOptions) -> Self {
        Self {
            cluster,
            options,
            progress: ProgressReporter::new(),
            state: OrchestratorState::Idle,
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Discover and apply everything under the target's manifest root.
    ///
    /// Every call starts from `Idle`; nothing is remembered between runs.
    pub async fn run(&mut self, target: &ClusterTarget) -> Result<ApplyReport> {
        self.state = OrchestratorState::Idle;
        let started = Instant::now();

        let mut report = ApplyReport {
            cluster: target.name.clone(),
            strategy: String::new(),
            applied: Vec::new(),
            conditions_met: 0,
            elapsed: Duration::ZERO,
        };

        match self.execute(target, &mut report).await {
            Ok(()) => {
                self.state = OrchestratorState::Done;
                report.elapsed = started.elapsed();
                info!(
                    cluster = %target.name,
                    applied = report.applied.len(),
                    "orchestration complete"
                );
                self.progress.print_summary(
                    &target.name,
                    report.applied.len(),
                    true,
                    report.elapsed,
                );
                Ok(report)
            }
            Err(e) => {
                debug!(
                    cluster = %target.name,
                    state = ?self.state,
                    error = %e,
                    "orchestration failed"
                );
                self.state = OrchestratorState::Failed;
                self.progress.print_summary(
                    &target.name,
                    report.applied.len(),
                    false,
                    started.elapsed(),
                );
                Err(e)
            }
        }
    }

    async fn execute(&mut self, target: &ClusterTarget, report: &mut ApplyReport) -> Result<()> {
        let plan = discover(&target.root)?;
        report.strategy = plan.strategy().to_string();
        self.progress
            .plan_header(&target.name, plan.strategy(), plan.apply_count());

        match plan {
            ApplyPlan::Single { path } => {
                info!(cluster = %target.name, path = %path.display(), "applying single directory");
                self.apply_dir(&path).await?;
                report.applied.push(path.display().to_string());
            }
            ApplyPlan::Waves { waves } => {
                if waves.is_empty() {
                    self.progress.info("No waves found, nothing to apply");
                }
                for wave in &waves {
                    self.state = OrchestratorState::ApplyingWave(wave.index);
                    report.conditions_met += self.apply_wave(wave, waves.len()).await?;
                    report.applied.push(wave.path.display().to_string());
                }
            }
        }

        Ok(())
    }

    async fn apply_wave(&self, wave: &Wave, total: usize) -> Result<usize> {
        info!(wave = %wave.name, index = wave.index, "applying wave");
        self.progress.wave_start(wave, total);

        // Reject malformed hooks of either type before anything is applied
        let manifest = wave.load_manifest()?;
        if manifest.is_empty() {
            debug!(wave = %wave.name, "no hooks declared");
        }
        for hook_type in HookType::all() {
            manifest
                .hook_set(*hook_type)
                .validate()
                .map_err(|e| KubeError::hook_failed(wave, *hook_type, e.into()))?;
        }

        let hooks = HookExecutor::new(&self.cluster, self.options, &self.progress);

        let mut met = hooks
            .run_declared(wave, &manifest, HookType::PreApply)
            .await?;
        self.apply_dir(&wave.path).await?;
        met += hooks
            .run_declared(wave, &manifest, HookType::PostApply)
            .await?;

        Ok(met)
    }

    async fn apply_dir(&self, dir: &Path) -> Result<()> {
        let started = Instant::now();
        let result = self.cluster.apply(dir).await?;

        if !result.success() {
            return Err(KubeError::ApplyFailed {
                path: dir.to_path_buf(),
                output: result.output,
            });
        }

        self.progress
            .applied(&dir.display().to_string(), started.elapsed());
        Ok(())
    }
}
