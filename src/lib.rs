// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! # jobflow - Production Job Planner
//!
//! `jobflow` plans production jobs described as a graph of services, each
//! holding an ordered list of timed tasks.
//!
//! ## Features
//!
//! - **Stage detection** - Groups services that can run in parallel
//! - **Duration estimates** - Critical-path total and remaining time
//! - **Task sequencing** - Advances each service's tasks left to right
//! - **Deadline tracking** - Flags running tasks that overran their time
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a sample job
//! jobflow init my-job
//!
//! # Show stages, the estimate and task statuses
//! jobflow plan
//!
//! # Finish a task and advance its service
//! jobflow task done measure
//! ```
//!
//! ## Library use
//!
//! ```no_run
//! use chrono::Utc;
//! use jobflow::{JobSnapshot, Scheduler};
//!
//! let job = JobSnapshot::from_file(std::path::Path::new("job.yaml"))?;
//! let report = Scheduler::plan(&job, Utc::now())?;
//! println!("{} minutes", report.total_duration_minutes);
//! # Ok::<(), jobflow::JobflowError>(())
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod job;
pub mod schedule;
pub mod utils;

// Re-export commonly used types
pub use errors::{JobflowError, JobflowResult};
pub use graph::{DagView, JobGraph};
pub use job::{JobRegistry, JobSnapshot, JobValidator, NodeKind, NodeSpec, Service, Task, TaskStatus};
pub use schedule::{
    DurationEstimate, DurationEstimator, ScheduleReport, Scheduler, StageDetector, StagePlan,
    TaskSequencer,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
