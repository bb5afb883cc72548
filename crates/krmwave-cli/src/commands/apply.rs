//! Apply command - deploy a cluster's manifest root wave by wave

use console::style;

use krmwave_core::Config;
use krmwave_kube::{ApplyOrchestrator, ApplyReport, Kubectl, ProgressReporter, WaitOptions};

use crate::error::Result;

pub async fn run(config: &Config, progress: ProgressReporter, json: bool) -> Result<()> {
    let report = deploy(config, progress).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} Applied {} ({} directories, {} hook conditions met)",
            style("✓").green().bold(),
            style(&report.cluster).cyan(),
            report.applied.len(),
            report.conditions_met
        );
    }

    Ok(())
}

/// Run the orchestrator for the configured cluster
pub(crate) async fn deploy(config: &Config, progress: ProgressReporter) -> Result<ApplyReport> {
    let target = config.cluster_target()?;
    let kubectl = Kubectl::from_config(config);

    let mut orchestrator =
        ApplyOrchestrator::new(kubectl, WaitOptions::from_config(config)).with_progress(progress);
    let report = orchestrator.run(&target).await?;

    Ok(report)
}
