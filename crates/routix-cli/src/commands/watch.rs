// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Watch command: keep the manifests in sync with the source directory.

use crate::config::Config;
use console::style;
use routix::Routix;
use std::path::Path;
use tokio::signal;

/// Runs the watcher until Ctrl+C.
pub async fn run(config_path: &Path, dir: Option<String>, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load_from(config_path)?;
    tracing::debug!(config = %config_path.display(), preset = ?config.preset, "Loaded configuration");
    let root = std::env::current_dir()?;
    let mut options = config.to_options(&root).with_watch(true);
    if let Some(dir) = dir {
        options.dir = root.join(dir);
    }

    let routix = Routix::start(options).await?;
    match routix.on_idle(None).await {
        Ok(()) => {
            if !quiet {
                println!(
                    "{} {} page(s)",
                    style("Routes built:").green(),
                    routix.handle().len()
                );
            }
        }
        Err(err) => eprintln!("{} {}", style("Build failed:").red().bold(), err),
    }

    if !quiet {
        println!(
            "Watching for changes in: {}",
            routix.options().dir.display()
        );
        println!("Press Ctrl+C to stop...");
        println!();
    }

    loop {
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                break;
            }
            changed = routix.on_change() => {
                changed?;
                match routix.on_settled().await {
                    Ok(()) => {
                        if !quiet {
                            println!("  {} routes rebuilt", style("↻").cyan());
                        }
                    }
                    Err(err) => eprintln!("{} {}", style("Build failed:").red().bold(), err),
                }
            }
        }
    }

    if !quiet {
        println!("\nStopping file watcher...");
    }
    routix.close();
    Ok(())
}
