// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! One-shot build command: scan, write the manifests, exit.

use crate::config::Config;
use console::style;
use routix::{Options, Routix};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Runs the build command.
pub async fn run(config_path: &Path, dir: Option<String>, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load_from(config_path)?;
    tracing::debug!(config = %config_path.display(), preset = ?config.preset, "Loaded configuration");
    let root = std::env::current_dir()?;
    let mut options = config.to_options(&root);
    if let Some(dir) = dir {
        options.dir = root.join(dir);
    }

    if !quiet {
        println!(
            "{} {}",
            style("Building routes from:").cyan(),
            options.dir.display()
        );
    }

    let start = Instant::now();
    let (files, targets) = build(options).await?;

    if !quiet {
        println!("{} {} page(s)", style("Found").green(), files);
        for target in &targets {
            println!("  {} {}", style("→").dim(), target.display());
        }
        println!(
            "{} in {:.2}s",
            style("Routes built").green().bold(),
            start.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

/// Builds the manifests once. Returns the number of pages and the output
/// files.
pub async fn build(options: Options) -> anyhow::Result<(usize, Vec<PathBuf>)> {
    let routix = Routix::start(options.with_watch(false)).await?;
    routix.on_idle(None).await?;

    let files = routix.handle().len();
    let write = &routix.options().write;
    let targets: Vec<PathBuf> = [&write.routes, &write.tree, &write.extras]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    routix.close();
    Ok((files, targets))
}
