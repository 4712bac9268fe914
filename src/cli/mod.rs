//! CLI module for BrillPrime Edge
//!
//! - `serve`: install the current generation, then serve traffic
//! - `install`: precache the current generation into the store and exit
//! - `classify`: print how a path would be routed

pub mod classify;
pub mod install;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// BrillPrime Edge - offline-first caching in front of the BrillPrime web app
#[derive(Parser)]
#[command(name = "brillprime-edge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install, activate and serve requests
    Serve,

    /// Precache the current generation and exit
    Install(install::InstallArgs),

    /// Show the strategy and partition chosen for a path
    Classify(classify::ClassifyArgs),
}

/// Loads `.env` and the layered configuration
fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Plain logging for one-shot commands
fn init_logging(config: &AppConfig) {
    logging::init_logging(&(&config.logging).into());
}
