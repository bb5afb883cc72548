//! Cluster commands - create, list and delete local k3d clusters

use console::style;

use krmwave_core::{Config, discover};
use krmwave_kube::{K3d, ProgressReporter};

use crate::commands::apply;
use crate::error::{CliError, Result};

fn cluster_name(config: &Config) -> Result<String> {
    let name = config.cluster.trim();
    if name.is_empty() {
        return Err(CliError::config_with_help(
            "no cluster name configured",
            "Pass --cluster <name> or set KRMWAVE_CLUSTER",
        ));
    }
    Ok(name.to_string())
}

/// Create the registry and the cluster, then deploy its manifests
pub async fn create(config: &Config, progress: ProgressReporter) -> Result<()> {
    let name = cluster_name(config)?;
    // Nothing is created for a cluster without a usable manifest root
    let target = config.cluster_target()?;
    discover(&target.root)?;

    let k3d = K3d::from_config(config);

    if k3d.create_registry().await? {
        progress.success(&format!(
            "Created registry {} on port {}",
            k3d.registry().name,
            k3d.registry().port
        ));
    } else {
        progress.info(&format!("Registry {} already exists", k3d.registry().name));
    }

    if k3d.create_cluster(&name).await? {
        progress.success(&format!("Created cluster {}", name));
    } else {
        progress.info(&format!("Cluster {} already exists", name));
    }

    let report = apply::deploy(config, progress).await?;

    println!(
        "{} Cluster {} is ready ({} directories applied)",
        style("✓").green().bold(),
        style(&report.cluster).cyan(),
        report.applied.len()
    );
    Ok(())
}

pub async fn list(config: &Config, json: bool) -> Result<()> {
    let k3d = K3d::from_config(config);
    let names: Vec<String> = k3d
        .list_clusters()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    if names.is_empty() {
        println!("No clusters found");
        return Ok(());
    }

    println!("{}", style("CLUSTERS").bold());
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

pub async fn delete(config: &Config) -> Result<()> {
    let name = cluster_name(config)?;
    let k3d = K3d::from_config(config);

    if k3d.delete_cluster(&name).await? {
        println!("{} Deleted cluster {}", style("✓").green().bold(), name);
    } else {
        println!("Cluster {} does not exist", name);
    }
    Ok(())
}

pub async fn delete_all(config: &Config) -> Result<()> {
    let k3d = K3d::from_config(config);
    let deleted = k3d.delete_all_clusters().await?;

    if deleted.is_empty() {
        println!("No clusters to delete");
    }
    for name in deleted {
        println!("{} Deleted cluster {}", style("✓").green().bold(), name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_name_required() {
        let err = cluster_name(&Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::CONFIG_ERROR);

        let config = Config {
            cluster: " dev ".to_string(),
            ..Config::default()
        };
        assert_eq!(cluster_name(&config).unwrap(), "dev");
    }
}
