//! drover - batch-submission adapter for workflow jobs.
//!
//! Loads a job manifest, runs one lifecycle operation against the scheduler
//! through the HTCondor backend, and prints the outcome as JSON.

mod args;

use args::{Args, Operation};
use camino::Utf8Path;
use clap::Parser;
use drover_condor::CondorPlugin;
use drover_core::{BatchPlugin, DroverConfig, JobRecord, StaticSiteDirectory};
use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_json::<DroverConfig>(path)?,
        None => DroverConfig::default(),
    };
    let sites = StaticSiteDirectory::new(config.sites.clone());
    let mut plugin = CondorPlugin::new(config, Box::new(sites), None);

    match &args.operation {
        Operation::Submit { manifest } => {
            let mut jobs: Vec<JobRecord> = load_json(manifest)?;
            tracing::info!("submitting {} jobs", jobs.len());
            let outcome = plugin.submit(&mut jobs).await.into_diagnostic()?;
            print_json(&outcome)?;
        }
        Operation::Track { manifest } => {
            let mut jobs: Vec<JobRecord> = load_json(manifest)?;
            let outcome = plugin.track(&mut jobs).await.into_diagnostic()?;
            print_json(&outcome)?;
        }
        Operation::Complete { manifest } => {
            let jobs: Vec<JobRecord> = load_json(manifest)?;
            plugin.complete(&jobs).await;
        }
        Operation::Kill { manifest } => {
            let jobs: Vec<JobRecord> = load_json(manifest)?;
            plugin.kill(&jobs).await;
        }
    }

    plugin.close().await;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).into_diagnostic()?;
    serde_json::from_str(&raw).into_diagnostic()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
