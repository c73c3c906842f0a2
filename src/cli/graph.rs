// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Graph command - visualize the job graph

use miette::Result;
use std::path::PathBuf;

use super::{job_path, load_job, GraphFormat};
use crate::config::Settings;
use crate::graph::{DagView, JobGraph};

/// Run the graph command
pub async fn run(
    job: Option<PathBuf>,
    format: GraphFormat,
    settings: &Settings,
    _verbose: bool,
) -> Result<()> {
    let snapshot = load_job(&job_path(job, settings))?;

    let graph = JobGraph::new(&snapshot.nodes)?;
    let dag = DagView::new(&graph);

    let output = match format {
        GraphFormat::Text => dag.to_text()?,
        GraphFormat::Dot => dag.to_dot(),
        GraphFormat::Mermaid => dag.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
