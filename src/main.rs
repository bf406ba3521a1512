//! MountSleuth — path mapping intelligence for Docker hosts.
//!
//! Thin binary entry point. All logic lives in the `mountsleuth-core`
//! and `mountsleuth-server` crates.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mountsleuth",
    version,
    about = "Detects Docker volume-mount conflicts that break hardlink-based instant moves"
)]
struct Args {
    /// Address to serve the HTTP API on.
    #[arg(long, default_value = "0.0.0.0:9900")]
    bind: String,

    /// Analyze a snapshot JSON file and print the result instead of
    /// serving. Needs no Docker daemon.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// With --snapshot, print the conflict table as CSV instead of JSON.
    #[arg(long)]
    csv: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    if let Some(path) = args.snapshot {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let snapshot: mountsleuth_core::model::Snapshot =
            serde_json::from_str(&raw).context("parsing snapshot JSON")?;
        let result = mountsleuth_core::analysis::analyze(&snapshot);
        if args.csv {
            print!("{}", mountsleuth_core::export::conflicts_to_csv(&result)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        return Ok(());
    }

    tracing::info!("MountSleuth starting");

    let docker = mountsleuth_server::docker::DockerManager::connect().await;
    let state = mountsleuth_server::state::AppState::new(docker);
    mountsleuth_server::api::serve(state, &args.bind).await
}
