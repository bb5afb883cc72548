//! Registry commands - manage the local image registry

use console::style;

use krmwave_core::Config;
use krmwave_kube::K3d;

use crate::commands::cluster;
use crate::error::Result;

pub async fn create(config: &Config) -> Result<()> {
    let k3d = K3d::from_config(config);
    let registry = k3d.registry();

    if k3d.create_registry().await? {
        println!(
            "{} Created registry {} on port {}",
            style("✓").green().bold(),
            registry.name,
            registry.port
        );
    } else {
        println!("Registry {} already exists", registry.name);
    }
    Ok(())
}

pub async fn list(config: &Config, json: bool) -> Result<()> {
    let k3d = K3d::from_config(config);
    let names = k3d.list_registries().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else if names.is_empty() {
        println!("No registries found");
    } else {
        println!("{}", style("REGISTRIES").bold());
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

pub async fn delete(config: &Config) -> Result<()> {
    let k3d = K3d::from_config(config);
    let name = &k3d.registry().name;

    if k3d.delete_registry().await? {
        println!("{} Deleted registry {}", style("✓").green().bold(), name);
    } else {
        println!("Registry {} does not exist", name);
    }
    Ok(())
}

/// Delete every managed cluster, then the registry
pub async fn delete_all(config: &Config) -> Result<()> {
    cluster::delete_all(config).await?;
    delete(config).await
}
