// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Init command - write a sample job document

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::config::Settings;
use crate::job::JobSnapshot;

/// Run the init command
pub async fn run(
    name: Option<String>,
    output: Option<PathBuf>,
    force: bool,
    settings: &Settings,
    verbose: bool,
) -> Result<()> {
    let job_name = name.unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.file_name().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_else(|| "my-job".to_string())
    });
    let path = output.unwrap_or_else(|| settings.job_file.clone());

    println!("{}", "Initializing jobflow job...".bold());
    println!();

    if path.exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        ));
    }

    let content = sample_job(&job_name);

    // Keep the requested format: YAML template, or JSON via the parsed form
    let snapshot = JobSnapshot::from_yaml(&content)?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        snapshot.to_file(&path)?;
    } else {
        std::fs::write(&path, &content)
            .map_err(|e| miette::miette!("Failed to write {}: {}", path.display(), e))?;
    }

    println!("  {} Created {}", "✓".green(), path.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to describe your services and tasks", path.display().to_string().cyan());
    println!("  2. Run {} to check the graph", "jobflow validate".cyan());
    println!("  3. Run {} to see stages and the estimate", "jobflow plan".cyan());
    println!();

    if verbose {
        println!("{}", "Generated job:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", content.dimmed());
    }

    Ok(())
}

/// Sample job: one service, then two in parallel, between sentinels
pub fn sample_job(name: &str) -> String {
    format!(
        r#"# jobflow job document
name: "{name}"

nodes:
  - id: start
    kind: {{ type: start }}
    successors: [survey]
  - id: survey
    kind: {{ type: service, service: site-survey }}
    successors: [civil, electrical]
  - id: civil
    kind: {{ type: service, service: civil-works }}
    successors: [end]
  - id: electrical
    kind: {{ type: service, service: electrical }}
    successors: [end]
  - id: end
    kind: {{ type: end }}

services:
  - id: site-survey
    name: "Site survey"
    tasks:
      - {{ id: measure, name: "Measure site", position: 1, deadline_minutes: 60 }}
      - {{ id: report, name: "Write survey report", position: 2, deadline_minutes: 40 }}
  - id: civil-works
    name: "Civil works"
    tasks:
      - {{ id: dig, name: "Dig foundation", position: 1, deadline_minutes: 50 }}
  - id: electrical
    name: "Electrical"
    tasks:
      - {{ id: wiring, name: "Run wiring", position: 1, deadline_minutes: 45 }}
      - {{ id: inspect, name: "Inspection", position: 2, deadline_minutes: 35 }}
"#
    )
}
