// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! jobflow - production job planner
//!
//! Stage detection, duration estimates and task sequencing from the command line.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobflow::cli::{Cli, Commands};
use jobflow::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // -v raises the default level, RUST_LOG still wins
    let default_filter = if cli.verbose { "jobflow=debug" } else { "jobflow=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    jobflow::utils::apply_color_preference();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let settings = Settings::load(cli.config.as_deref())?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Init {
            name,
            output,
            force,
        } => jobflow::cli::init::run(name, output, force, &settings, cli.verbose).await,
        Commands::Plan {
            job,
            format,
            now,
            write,
        } => jobflow::cli::plan::run(job, format, now, write, &settings, cli.verbose).await,
        Commands::Validate { job } => {
            jobflow::cli::validate::run(job, &settings, cli.verbose).await
        }
        Commands::Graph { job, format } => {
            jobflow::cli::graph::run(job, format, &settings, cli.verbose).await
        }
        Commands::Task { action, job, now } => {
            jobflow::cli::task::run(action, job, now, &settings, cli.verbose).await
        }
        Commands::Watch {
            job,
            debounce,
            tick,
        } => jobflow::cli::watch::run(job, debounce, tick, &settings, cli.verbose).await,
    }
}
