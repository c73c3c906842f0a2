// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Watch command - re-plan on file changes and deadline ticks

use chrono::Utc;
use colored::Colorize;
use miette::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::Duration;
use tracing::debug;

use super::job_path;
use super::render::print_report;
use crate::config::Settings;
use crate::job::JobSnapshot;
use crate::schedule::Scheduler;

/// Run the watch command
pub async fn run(
    job: Option<PathBuf>,
    debounce_ms: Option<u64>,
    tick_seconds: Option<u64>,
    settings: &Settings,
    verbose: bool,
) -> Result<()> {
    let path = job_path(job, settings);
    if !path.exists() {
        return Err(miette::miette!(
            "Job file not found: {}\n\n\
             Run 'jobflow init' to create a sample job.",
            path.display()
        ));
    }

    let debounce_ms = debounce_ms.unwrap_or(settings.debounce_ms);
    let tick = Duration::from_secs(tick_seconds.unwrap_or(settings.tick_seconds).max(1));

    println!("{}", "Starting watch mode...".bold());
    println!(
        "Watching {} (debounce: {}ms, deadline check every {}s)",
        path.display(),
        debounce_ms,
        tick.as_secs()
    );
    println!("Press {} to exit.", "Ctrl+C".cyan());
    println!();

    let (tx, rx) = channel();

    let mut debouncer = new_debouncer(Duration::from_millis(debounce_ms), tx)
        .map_err(|e| miette::miette!("Failed to create file watcher: {}", e))?;

    let watch_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    debouncer
        .watcher()
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .map_err(|e| miette::miette!("Failed to start watching: {}", e))?;

    let mut last_fingerprint = None;
    replan(&path, &mut last_fingerprint, settings, verbose);

    loop {
        match rx.recv_timeout(tick) {
            Ok(Ok(events)) => {
                let relevant = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .any(|e| e.path.file_name() == path.file_name());

                if relevant {
                    println!("{}", "─".repeat(50).dimmed());
                    println!("{}: {}", "Change detected".yellow(), path.display());
                    replan(&path, &mut last_fingerprint, settings, verbose);
                }
            }
            Ok(Err(e)) => {
                eprintln!("{}: {:?}", "Watch error".red(), e);
            }
            Err(RecvTimeoutError::Timeout) => {
                debug!("deadline tick");
                replan(&path, &mut last_fingerprint, settings, verbose);
            }
            Err(RecvTimeoutError::Disconnected) => {
                eprintln!("{}", "Watcher channel closed".red());
                break;
            }
        }
    }

    Ok(())
}

/// Recompute and print when the result differs from the last one printed
fn replan(path: &Path, last: &mut Option<String>, settings: &Settings, verbose: bool) {
    let job = match JobSnapshot::from_file(path) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("{}: {}", "Failed to load job".red(), e);
            return;
        }
    };

    // Ticks re-plan at the current time; stable_fingerprint drops the time-driven fields
    let report = match Scheduler::plan(&job, Utc::now()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}: {}", "Failed to plan job".red(), e);
            return;
        }
    };

    let fingerprint = match stable_fingerprint(&report) {
        Some(f) => f,
        None => return,
    };
    if last.as_deref() == Some(fingerprint.as_str()) {
        debug!("schedule unchanged");
        return;
    }
    *last = Some(fingerprint);

    if let Err(e) = print_report(&job, &report, settings.format, verbose) {
        eprintln!("{}: {}", "Failed to print report".red(), e);
    }
}

/// Fingerprint that ignores the ticking countdowns and evaluation time
fn stable_fingerprint(report: &crate::schedule::ScheduleReport) -> Option<String> {
    let mut report = report.clone();
    report.computed_at = chrono::DateTime::<Utc>::MIN_UTC;
    report.remaining_duration_minutes = 0;
    for task in &mut report.tasks {
        task.remaining_minutes = None;
        // promotions stamp the current time
        task.started_at = None;
    }
    report.fingerprint().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{NodeSpec, Service, Task};
    use chrono::TimeZone;

    fn job() -> JobSnapshot {
        JobSnapshot {
            name: "w".into(),
            description: None,
            nodes: vec![NodeSpec::service("n", "S", &[])],
            services: vec![Service::new("S", "S", vec![Task::new("t1", 1, 60)])],
        }
    }

    #[test]
    fn test_ticks_without_status_change_keep_fingerprint() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let (started, first) = Scheduler::recompute(&job(), at).unwrap();

        let tick = Scheduler::plan(&started, at + chrono::Duration::minutes(10)).unwrap();
        assert_ne!(first.fingerprint().unwrap(), tick.fingerprint().unwrap());
        assert_eq!(stable_fingerprint(&first), stable_fingerprint(&tick));

        let overdue = Scheduler::plan(&started, at + chrono::Duration::minutes(61)).unwrap();
        assert_ne!(stable_fingerprint(&first), stable_fingerprint(&overdue));
    }
}
