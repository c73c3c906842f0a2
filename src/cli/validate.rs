// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Validate command - check a job document

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::job_path;
use crate::config::Settings;
use crate::job::{JobSnapshot, JobValidator};
use crate::schedule::DurationEstimator;

/// Run the validate command
pub async fn run(job: Option<PathBuf>, settings: &Settings, verbose: bool) -> Result<()> {
    println!("{}", "Validating job...".bold());
    println!();

    let path = job_path(job, settings);
    if !path.exists() {
        return Err(miette::miette!(
            "Job file not found: {}\n\n\
             Run 'jobflow init' to create a sample job.",
            path.display()
        ));
    }

    let snapshot = match JobSnapshot::from_file(&path) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("  {} Failed to parse job", "✗".red());
            eprintln!();
            return Err(miette::miette!("Parse error: {}", e));
        }
    };

    println!("  {} Job file parses", "✓".green());

    let validation = JobValidator::validate(&snapshot);

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if validation.has_warnings() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Job summary".bold());
        println!("  Name: {}", snapshot.name);
        println!("  Nodes: {}", snapshot.nodes.len());
        println!("  Services: {}", snapshot.services.len());
        for service in &snapshot.services {
            println!(
                "    - {} ({} tasks, {} min)",
                service.id,
                service.tasks.len(),
                DurationEstimator::service_minutes(service)
            );
        }
    }

    println!();

    if !validation.is_valid() {
        Err(miette::miette!("Job validation failed"))
    } else if validation.has_warnings() {
        println!("{}", "Job is valid but has warnings.".yellow().bold());
        Ok(())
    } else {
        println!("{}", "Job is valid!".green().bold());
        Ok(())
    }
}
