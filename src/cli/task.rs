// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Task command - apply a task action, recompute, write back

use chrono::{DateTime, Utc};
use miette::Result;
use std::path::PathBuf;
use tracing::info;

use super::render::print_report;
use super::{job_path, load_job, TaskAction};
use crate::config::Settings;
use crate::job::JobSnapshot;
use crate::schedule::Scheduler;
use crate::utils::print_success;

/// Run the task command
pub async fn run(
    action: TaskAction,
    job: Option<PathBuf>,
    now: Option<DateTime<Utc>>,
    settings: &Settings,
    verbose: bool,
) -> Result<()> {
    let path = job_path(job, settings);
    let mut snapshot = load_job(&path)?;
    let now = now.unwrap_or_else(Utc::now);

    apply(&mut snapshot, &action, now)?;
    info!(task = action.task(), ?action, "task updated");

    let (recomputed, report) = Scheduler::recompute(&snapshot, now)?;
    recomputed.to_file(&path)?;

    print_success(&format!("Updated {}", path.display()));
    print_report(&recomputed, &report, settings.format, verbose)
}

/// Apply one action to a snapshot
pub fn apply(job: &mut JobSnapshot, action: &TaskAction, now: DateTime<Utc>) -> crate::JobflowResult<()> {
    match action {
        TaskAction::Done { task } => job.mark_done(task, now),
        TaskAction::Pause { task } => job.mark_paused(task),
        TaskAction::Resume { task } => job.mark_running(task, now),
        TaskAction::Deadline { task, minutes } => job.set_deadline(task, *minutes, now),
        TaskAction::Move { task, position } => job.move_task(task, *position),
    }
}
