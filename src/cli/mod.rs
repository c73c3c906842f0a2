// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for jobflow.

pub mod graph;
pub mod init;
pub mod plan;
pub mod render;
pub mod task;
pub mod validate;
pub mod watch;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{OutputFormat, Settings};

/// Production job planner
///
/// Detects parallel stages, estimates job duration and sequences tasks.
#[derive(Parser, Debug)]
#[clap(
    name = "jobflow",
    version,
    about = "Stage planning, duration estimates and task sequencing for production jobs",
    long_about = None,
    after_help = "Examples:\n\
        jobflow init                    Write a sample job.yaml\n\
        jobflow plan                    Show stages, estimate and task statuses\n\
        jobflow task done dig           Mark a task done and advance its service\n\
        jobflow watch                   Re-plan on changes and deadline ticks\n\n\
        See 'jobflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Settings file (default: ./jobflow.toml, then the user config dir)
    #[clap(long, global = true, value_name = "FILE", env = "JOBFLOW_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a sample job document
    Init {
        /// Job name (defaults to current directory name)
        name: Option<String>,

        /// Output file
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[clap(short, long)]
        force: bool,
    },

    /// Show the stage plan, duration estimate and task statuses
    Plan {
        /// Job file
        job: Option<PathBuf>,

        /// Output format (text, json)
        #[clap(short, long)]
        format: Option<OutputFormat>,

        /// Evaluate at this instant instead of now (RFC 3339)
        #[clap(long, value_name = "TIME")]
        now: Option<DateTime<Utc>>,

        /// Write recomputed task statuses back to the job file
        #[clap(short, long)]
        write: bool,
    },

    /// Validate a job document
    Validate {
        /// Job file
        job: Option<PathBuf>,
    },

    /// Show the job graph
    Graph {
        /// Job file
        job: Option<PathBuf>,

        /// Output format (text, dot, mermaid)
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },

    /// Change a task and recompute its service
    Task {
        #[clap(subcommand)]
        action: TaskAction,

        /// Job file
        #[clap(short, long, global = true)]
        job: Option<PathBuf>,

        /// Apply the change at this instant instead of now (RFC 3339)
        #[clap(long, global = true, value_name = "TIME")]
        now: Option<DateTime<Utc>>,
    },

    /// Watch mode - re-plan on file changes and deadline ticks
    Watch {
        /// Job file
        job: Option<PathBuf>,

        /// Debounce delay in milliseconds
        #[clap(long)]
        debounce: Option<u64>,

        /// Seconds between deadline checks
        #[clap(long)]
        tick: Option<u64>,
    },
}

/// Task actions
#[derive(Subcommand, Debug, Clone)]
pub enum TaskAction {
    /// Mark a task done
    Done { task: String },

    /// Pause a task
    Pause { task: String },

    /// Resume a paused task
    Resume { task: String },

    /// Change a task's planned duration
    Deadline { task: String, minutes: u64 },

    /// Move a task to a new position in its service
    Move { task: String, position: u32 },
}

impl TaskAction {
    pub fn task(&self) -> &str {
        match self {
            Self::Done { task }
            | Self::Pause { task }
            | Self::Resume { task }
            | Self::Deadline { task, .. }
            | Self::Move { task, .. } => task,
        }
    }
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Job file from the command line, else from settings
pub fn job_path(explicit: Option<PathBuf>, settings: &Settings) -> PathBuf {
    explicit.unwrap_or_else(|| settings.job_file.clone())
}

/// Load a job document with a CLI-friendly error
pub fn load_job(path: &std::path::Path) -> miette::Result<crate::job::JobSnapshot> {
    if !path.exists() {
        return Err(miette::miette!(
            "Job file not found: {}\n\n\
             Run 'jobflow init' to create a sample job.",
            path.display()
        ));
    }

    crate::job::JobSnapshot::from_file(path)
        .map_err(|e| miette::miette!("Failed to load job: {}", e))
}
