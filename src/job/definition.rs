// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Job definition structures
//!
//! Defines the schema of job documents (`job.yaml` / `job.json`): the
//! pipeline graph, and the services with their ordered tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{JobflowError, JobflowResult};

/// Identifier of a graph node
pub type NodeId = String;
/// Identifier of a service
pub type ServiceId = String;
/// Identifier of a task
pub type TaskId = String;

/// Point-in-time view of one job: graph plus service/task arena
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job name
    pub name: String,

    /// Job description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Pipeline graph nodes
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,

    /// Services referenced by the graph
    #[serde(default)]
    pub services: Vec<Service>,
}

impl JobSnapshot {
    /// Load a job from a YAML or JSON file (chosen by extension)
    pub fn from_file(path: &Path) -> JobflowResult<Self> {
        if !path.exists() {
            return Err(JobflowError::JobNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| JobflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        if is_json(path) {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Write the job back to a YAML or JSON file (chosen by extension)
    pub fn to_file(&self, path: &Path) -> JobflowResult<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            self.to_yaml()?
        };

        std::fs::write(path, content).map_err(|e| JobflowError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse a job from a YAML string
    pub fn from_yaml(yaml: &str) -> JobflowResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse a job from a JSON string
    pub fn from_json(json: &str) -> JobflowResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Serialize the job to YAML
    pub fn to_yaml(&self) -> JobflowResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Get a service by id
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Get a mutable service by id
    pub fn service_mut(&mut self, id: &str) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.id == id)
    }

    /// Get a node by id
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find the service owning a task
    pub fn service_of_task(&self, task_id: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.tasks.iter().any(|t| t.id == task_id))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// A node of the pipeline graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Node id, unique within the job
    pub id: NodeId,

    /// What this node stands for
    pub kind: NodeKind,

    /// Nodes this one points to
    #[serde(default)]
    pub successors: Vec<NodeId>,
}

impl NodeSpec {
    pub fn start(id: &str, successors: &[&str]) -> Self {
        Self::with_kind(id, NodeKind::Start, successors)
    }

    pub fn end(id: &str) -> Self {
        Self::with_kind(id, NodeKind::End, &[])
    }

    pub fn service(id: &str, service: &str, successors: &[&str]) -> Self {
        Self::with_kind(
            id,
            NodeKind::Service {
                service: service.to_string(),
            },
            successors,
        )
    }

    fn with_kind(id: &str, kind: NodeKind, successors: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            kind,
            successors: successors.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Node kinds. Start and End are zero-duration sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    Service { service: ServiceId },
    End,
}

impl NodeKind {
    /// Service referenced by this node, if any
    pub fn service_id(&self) -> Option<&str> {
        match self {
            Self::Service { service } => Some(service),
            Self::Start | Self::End => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Service { .. })
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Service { service } => write!(f, "service:{}", service),
            Self::End => write!(f, "end"),
        }
    }
}

/// A unit of work made of serial tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service id
    pub id: ServiceId,

    /// Display name
    pub name: String,

    /// Tasks, ordered by `position`
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Service {
    pub fn new(id: &str, name: &str, tasks: Vec<Task>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            tasks,
        }
    }

    /// Get a task by id
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// The atomic unit of execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task id
    pub id: TaskId,

    /// Display name
    pub name: String,

    /// Serial order within the service, starting at 1
    pub position: u32,

    /// Runtime status
    #[serde(default)]
    pub status: TaskStatus,

    /// Planned duration once started
    pub deadline_minutes: u64,

    /// Set once, when the task first becomes `Running`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Set once, when the task becomes `Done`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A fresh, unstarted task
    pub fn new(id: &str, position: u32, deadline_minutes: u64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            position,
            status: TaskStatus::Waiting,
            deadline_minutes,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn started(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn finished(mut self, at: DateTime<Utc>) -> Self {
        self.finished_at = Some(at);
        self
    }
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Waiting,
    Preparing,
    Running,
    Overdue,
    Paused,
    Done,
}

impl TaskStatus {
    /// Frozen statuses are only ever written by an explicit action
    pub fn is_frozen(self) -> bool {
        matches!(self, Self::Done | Self::Paused)
    }

    /// Started and not finished
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Overdue)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Preparing => write!(f, "preparing"),
            Self::Running => write!(f, "running"),
            Self::Overdue => write!(f, "overdue"),
            Self::Paused => write!(f, "paused"),
            Self::Done => write!(f, "done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_job() {
        let yaml = r#"
name: "tower-install"
nodes:
  - id: start
    kind: { type: start }
    successors: [civil]
  - id: civil
    kind: { type: service, service: civil-works }
    successors: [end]
  - id: end
    kind: { type: end }
services:
  - id: civil-works
    name: "Civil works"
    tasks:
      - id: dig
        name: "Dig foundation"
        position: 1
        deadline_minutes: 60
      - id: pour
        name: "Pour concrete"
        position: 2
        status: preparing
        deadline_minutes: 120
"#;

        let job = JobSnapshot::from_yaml(yaml).unwrap();
        assert_eq!(job.name, "tower-install");
        assert_eq!(job.nodes.len(), 3);
        assert_eq!(job.nodes[1].kind.service_id(), Some("civil-works"));
        assert!(job.nodes[0].kind.is_sentinel());

        let service = job.service("civil-works").unwrap();
        assert_eq!(service.tasks[0].status, TaskStatus::Waiting);
        assert_eq!(service.tasks[1].status, TaskStatus::Preparing);
        assert_eq!(job.service_of_task("pour").unwrap().id, "civil-works");
    }

    #[test]
    fn test_parse_json_timestamps() {
        let json = r#"{
            "name": "j",
            "services": [{
                "id": "s", "name": "S",
                "tasks": [{
                    "id": "t", "name": "T", "position": 1, "status": "running",
                    "deadline_minutes": 30, "started_at": "2025-03-01T08:00:00Z"
                }]
            }]
        }"#;

        let job = JobSnapshot::from_json(json).unwrap();
        let task = &job.services[0].tasks[0];
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(
            task.started_at.unwrap().to_rfc3339(),
            "2025-03-01T08:00:00+00:00"
        );
    }

    #[test]
    fn test_file_round_trip_keeps_format() {
        let dir = tempfile::TempDir::new().unwrap();
        let job = JobSnapshot {
            name: "j".into(),
            description: None,
            nodes: vec![NodeSpec::service("a", "svc", &[])],
            services: vec![Service::new("svc", "Svc", vec![Task::new("t1", 1, 10)])],
        };

        for file in ["job.yaml", "job.json"] {
            let path = dir.path().join(file);
            job.to_file(&path).unwrap();
            assert_eq!(JobSnapshot::from_file(&path).unwrap(), job);
        }
    }

    #[test]
    fn test_missing_file() {
        let result = JobSnapshot::from_file(Path::new("/nonexistent/job.yaml"));
        assert!(matches!(result, Err(JobflowError::JobNotFound { .. })));
    }

    #[test]
    fn test_frozen_statuses() {
        assert!(TaskStatus::Done.is_frozen());
        assert!(TaskStatus::Paused.is_frozen());
        assert!(!TaskStatus::Running.is_frozen());
        assert!(TaskStatus::Overdue.is_active());
    }
}
