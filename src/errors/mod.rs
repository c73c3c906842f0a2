// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Error types
//!
//! Every failure the scheduling core can report, plus the I/O and parsing
//! failures of the surrounding CLI. Variants carry `miette` diagnostics so
//! the command line can show a hint next to the message.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for jobflow operations
pub type JobflowResult<T> = Result<T, JobflowError>;

/// Main error type for jobflow
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum JobflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Node '{node}' points at undefined node '{successor}'")]
    #[diagnostic(
        code(jobflow::dangling_edge),
        help("Define '{successor}' in the node list or remove the edge")
    )]
    DanglingEdge { node: String, successor: String },

    #[error("Node '{node}' is defined more than once")]
    #[diagnostic(code(jobflow::duplicate_node))]
    DuplicateNode { node: String },

    #[error("Service '{service}' is referenced by more than one node")]
    #[diagnostic(
        code(jobflow::duplicate_service_node),
        help("Each service appears in the graph exactly once")
    )]
    DuplicateServiceNode { service: String },

    #[error("Graph has no entry point")]
    #[diagnostic(
        code(jobflow::no_entry_point),
        help("Every node has an incoming edge. The graph is empty or made of cycles")
    )]
    NoEntryPoint,

    #[error("Circular dependency detected: {}", .nodes.join(" -> "))]
    #[diagnostic(
        code(jobflow::circular_dependency),
        help("Remove one of the edges between these nodes")
    )]
    CircularDependency { nodes: Vec<String> },

    #[error("Node '{node}' not found")]
    #[diagnostic(code(jobflow::unknown_node))]
    UnknownNode { node: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Service / Task Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Service '{service}' not found")]
    #[diagnostic(
        code(jobflow::unknown_service),
        help("Check that '{service}' is listed under services")
    )]
    UnknownService { service: String },

    #[error("Task '{task}' not found")]
    #[diagnostic(code(jobflow::unknown_task))]
    UnknownTask { task: String },

    #[error("Tasks of service '{service}' are out of order: {reason}")]
    #[diagnostic(
        code(jobflow::invalid_task_order),
        help("Task positions must run 1, 2, 3, ... without gaps or repeats")
    )]
    InvalidTaskOrder { service: String, reason: String },

    #[error("Service '{holder}' is already being edited")]
    #[diagnostic(
        code(jobflow::edit_in_progress),
        help("Finish the edit of '{holder}' before editing '{requested}'")
    )]
    EditInProgress { holder: String, requested: String },

    #[error("Edit token does not hold the lock")]
    #[diagnostic(code(jobflow::stale_edit_token))]
    StaleEditToken,

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Job file not found: {path}")]
    #[diagnostic(
        code(jobflow::job_not_found),
        help("Create a job with 'jobflow init' or write job.yaml manually")
    )]
    JobNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(jobflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(jobflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(jobflow::invalid_config))]
    InvalidConfig { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(jobflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(jobflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(jobflow::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(jobflow::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for JobflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for JobflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for JobflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for JobflowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl JobflowError {
    /// Build an `InvalidTaskOrder` error for a service
    pub fn task_order(service: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTaskOrder {
            service: service.to_string(),
            reason: reason.into(),
        }
    }
}
