//! Plan command - show the waves and hooks `apply` would run

use krmwave_core::{ApplyPlan, Config, HookType, WaveManifest, discover};

use crate::display::{PlanView, WaveView, render_plan};
use crate::error::Result;

pub fn run(config: &Config, json: bool) -> Result<()> {
    let plan = build(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", render_plan(&plan));
    }

    Ok(())
}

/// Discover the cluster's waves and load their manifests.
///
/// Fails on anything `apply` would reject before touching the cluster:
/// a missing root, an invalid `wave.yaml`, a malformed rollout identifier.
pub fn build(config: &Config) -> Result<PlanView> {
    let target = config.cluster_target()?;
    let plan = discover(&target.root)?;
    let strategy = plan.strategy().to_string();

    let waves = match plan {
        ApplyPlan::Single { .. } => Vec::new(),
        ApplyPlan::Waves { waves } => {
            let mut views = Vec::with_capacity(waves.len());
            for wave in waves {
                let manifest = WaveManifest::load_optional(&wave.path)?;
                let (pre_apply, post_apply) = match &manifest {
                    Some(m) => (
                        m.hook_set(HookType::PreApply).clone(),
                        m.hook_set(HookType::PostApply).clone(),
                    ),
                    None => Default::default(),
                };
                pre_apply.validate()?;
                post_apply.validate()?;
                views.push(WaveView {
                    name: wave.name,
                    path: wave.path,
                    manifest: manifest.is_some(),
                    pre_apply,
                    post_apply,
                });
            }
            views
        }
    };

    Ok(PlanView {
        cluster: target.name,
        root: target.root,
        strategy,
        waves,
    })
}
