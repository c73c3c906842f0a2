// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Report rendering shared by plan, task and watch

use colored::Colorize;

use crate::config::OutputFormat;
use crate::job::JobSnapshot;
use crate::schedule::ScheduleReport;
use crate::utils::{countdown, minutes, print_header, print_section, print_warning, status};

/// Print a report in the requested format
pub fn print_report(
    job: &JobSnapshot,
    report: &ScheduleReport,
    format: OutputFormat,
    verbose: bool,
) -> miette::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = report
                .to_json()
                .map_err(|e| miette::miette!("Failed to serialize report: {}", e))?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(job, report, verbose),
    }
    Ok(())
}

fn print_text(job: &JobSnapshot, report: &ScheduleReport, verbose: bool) {
    println!();
    print_header(&format!("Job: {}", report.job));

    print_section(&format!("Stages ({})", report.stages.len()));
    for (plan_stage, estimate) in report.plan.stages.iter().zip(&report.estimate.stages) {
        if plan_stage.services.is_empty() && !verbose {
            continue;
        }

        let members = if plan_stage.services.is_empty() {
            plan_stage.nodes.join(" | ").dimmed().to_string()
        } else {
            plan_stage.services.join(" | ")
        };

        print!(
            "  {}. {} {}",
            plan_stage.index + 1,
            members.bold(),
            minutes(estimate.duration_minutes).dimmed()
        );
        if plan_stage.services.len() > 1 {
            if let Some(bottleneck) = &estimate.bottleneck {
                print!(" {}", format!("[bottleneck: {}]", bottleneck).dimmed());
            }
        }
        if plan_stage.orphan {
            print!(" {}", "[unreachable]".yellow());
        }
        println!();
    }

    println!();
    println!(
        "{}: {} ({} min)",
        "Estimated duration".bold(),
        minutes(report.total_duration_minutes),
        report.total_duration_minutes
    );
    println!(
        "{}: {}",
        "Remaining".bold(),
        minutes(report.remaining_duration_minutes)
    );

    if !report.exact {
        print_section(&"Estimate is approximate".yellow().to_string());
        for degradation in &report.degradations {
            print_warning(&degradation.to_string());
        }
    }

    print_section("Tasks");
    for service in &job.services {
        println!("  {}", service.name.bold());
        for task in report.tasks.iter().filter(|t| t.service_id == service.id) {
            let name = service
                .task(&task.task_id)
                .map(|t| t.name.as_str())
                .unwrap_or(&task.task_id);

            print!("    {}. {} {}", task.position, name, status(task.status));
            if let Some(remaining) = task.remaining_minutes {
                print!(" ({})", countdown(remaining));
            }
            if verbose {
                if let Some(started) = task.started_at {
                    print!(" {}", format!("started {}", started.format("%Y-%m-%d %H:%M")).dimmed());
                }
            }
            println!();
        }
    }
    println!();
}
