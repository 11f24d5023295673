//! CLI argument parsing for drover.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "drover")]
#[command(about = "Drive workflow jobs through an HTCondor-style batch scheduler")]
pub struct Args {
    /// JSON configuration file; defaults apply when omitted
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub operation: Operation,
}

#[derive(Subcommand, Debug)]
pub enum Operation {
    /// Submit every job in the manifest to the scheduler
    Submit { manifest: Utf8PathBuf },
    /// Reconcile manifest jobs against live scheduler state
    Track { manifest: Utf8PathBuf },
    /// Check for completion reports, synthesizing any that are missing
    Complete { manifest: Utf8PathBuf },
    /// Remove manifest jobs from the scheduler
    Kill { manifest: Utf8PathBuf },
}
