//! Display formatting for CLI output

use serde::Serialize;
use std::path::PathBuf;

use krmwave_core::{HookSet, HookType};

/// What `apply` would do for a cluster, without touching it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub cluster: String,
    pub root: PathBuf,
    pub strategy: String,
    pub waves: Vec<WaveView>,
}

/// One wave of a plan with its declared hooks
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveView {
    pub name: String,
    pub path: PathBuf,
    /// Whether the wave has a `wave.yaml`
    pub manifest: bool,
    pub pre_apply: HookSet,
    pub post_apply: HookSet,
}

impl WaveView {
    fn hooks(&self, hook_type: HookType) -> &HookSet {
        match hook_type {
            HookType::PreApply => &self.pre_apply,
            HookType::PostApply => &self.post_apply,
        }
    }
}

/// Render a plan as plain text
pub fn render_plan(plan: &PlanView) -> String {
    let mut lines = Vec::new();

    if plan.strategy == "single" {
        lines.push(format!(
            "Cluster {}: single directory {}",
            plan.cluster,
            plan.root.display()
        ));
        lines.push("  applied in one call, wave hooks are not evaluated".to_string());
        return lines.join("\n");
    }

    lines.push(format!(
        "Cluster {}: {} wave{} in {}",
        plan.cluster,
        plan.waves.len(),
        if plan.waves.len() == 1 { "" } else { "s" },
        plan.root.display()
    ));

    for (i, wave) in plan.waves.iter().enumerate() {
        if !wave.manifest {
            lines.push(format!("  {}. {} (no wave.yaml)", i + 1, wave.name));
            continue;
        }

        lines.push(format!("  {}. {}", i + 1, wave.name));
        let mut any = false;
        for hook_type in HookType::all() {
            let hooks = wave.hooks(*hook_type);
            for crd in hooks.crds() {
                lines.push(format!("       {:<9} wait for CRD {}", hook_type.to_string(), crd));
                any = true;
            }
            for rollout in hooks.rollouts() {
                lines.push(format!(
                    "       {:<9} wait for rollout {}",
                    hook_type.to_string(),
                    rollout
                ));
                any = true;
            }
        }
        if !any {
            lines.push("       (no hooks)".to_string());
        }
    }

    lines.join("\n")
}
