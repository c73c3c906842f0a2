// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Plan command - stage plan, estimate and task statuses

use chrono::{DateTime, Utc};
use miette::Result;
use std::path::PathBuf;

use super::render::print_report;
use super::{job_path, load_job};
use crate::config::{OutputFormat, Settings};
use crate::schedule::Scheduler;
use crate::utils::print_success;

/// Run the plan command
pub async fn run(
    job: Option<PathBuf>,
    format: Option<OutputFormat>,
    now: Option<DateTime<Utc>>,
    write: bool,
    settings: &Settings,
    verbose: bool,
) -> Result<()> {
    let path = job_path(job, settings);
    let snapshot = load_job(&path)?;
    let now = now.unwrap_or_else(Utc::now);

    let (recomputed, report) = Scheduler::recompute(&snapshot, now)?;

    print_report(
        &recomputed,
        &report,
        format.unwrap_or(settings.format),
        verbose,
    )?;

    if write && recomputed != snapshot {
        recomputed.to_file(&path)?;
        if format.unwrap_or(settings.format) == OutputFormat::Text {
            print_success(&format!("Updated {}", path.display()));
        }
    }

    Ok(())
}
