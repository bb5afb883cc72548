//! krmwave CLI - apply Kubernetes manifests to local clusters in ordered waves

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;
mod settings;

use error::Result;
use settings::GlobalArgs;

#[derive(Parser)]
#[command(name = "krmwave")]
#[command(author = "krmwave Contributors")]
#[command(version)]
#[command(about = "Apply Kubernetes manifests to local clusters in ordered, hook-gated waves", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the cluster's manifests, wave by wave
    Apply {
        /// Print the apply report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the waves and hooks `apply` would run, without touching the cluster
    Plan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the registry and the cluster, then apply its manifests
    CreateCluster,

    /// List clusters managed by krmwave
    ListClusters {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the cluster
    DeleteCluster,

    /// Delete every cluster managed by krmwave
    DeleteAllClusters,

    /// Create the local image registry
    CreateRegistry,

    /// List the local image registry if it exists
    ListRegistries {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the local image registry
    DeleteRegistry,

    /// Delete every managed cluster and the registry
    DeleteAll,
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.global.debug);

    if let Err(e) = run(cli).await {
        let code = e.exit_code();
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(code);
    }
}

fn init_tracing(debug: bool) {
    // Failures reach the user through the error report, not through logs
    let level = if debug { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.global.resolve()?;
    tracing::debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Apply { json } => {
            commands::apply::run(&config, commands::progress(&cli.global), json).await
        }
        Commands::Plan { json } => commands::plan::run(&config, json),
        Commands::CreateCluster => {
            commands::cluster::create(&config, commands::progress(&cli.global)).await
        }
        Commands::ListClusters { json } => commands::cluster::list(&config, json).await,
        Commands::DeleteCluster => commands::cluster::delete(&config).await,
        Commands::DeleteAllClusters => commands::cluster::delete_all(&config).await,
        Commands::CreateRegistry => commands::registry::create(&config).await,
        Commands::ListRegistries { json } => commands::registry::list(&config, json).await,
        Commands::DeleteRegistry => commands::registry::delete(&config).await,
        Commands::DeleteAll => commands::registry::delete_all(&config).await,
    }
}
