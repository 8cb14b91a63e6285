// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use routix_cli::commands;
use routix_cli::config::CONFIG_FILE;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "routix")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "Incremental route manifest generator", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Quiet mode: only show errors (useful for CI)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the route manifests once
    Build {
        /// Source directory (overrides the configuration)
        dir: Option<String>,
    },
    /// Watch files and rebuild the manifests on change
    Watch {
        /// Source directory (overrides the configuration)
        dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with the specified log level
    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Build { dir } => {
            commands::build::run(&cli.config, dir, cli.quiet).await
        }
        Commands::Watch { dir } => {
            commands::watch::run(&cli.config, dir, cli.quiet).await
        }
    }
}
