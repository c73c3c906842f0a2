// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Job validation
//!
//! Collects every structural problem of a job document at once, split into
//! errors (the scheduler would refuse or mis-sequence the job) and warnings
//! (the estimate would be degraded).

use std::collections::{HashMap, HashSet};

use super::definition::{JobSnapshot, NodeKind, Service, TaskStatus};
use crate::graph::{DagView, JobGraph};
use crate::schedule::{StageDetector, TaskSequencer};

/// Job validator
pub struct JobValidator;

impl JobValidator {
    /// Validate a job document
    pub fn validate(job: &JobSnapshot) -> ValidationResult {
        let mut result = ValidationResult::new();

        if job.nodes.is_empty() {
            result.add_warning("Job has no graph nodes; nothing will be estimated");
        }

        Self::validate_nodes(job, &mut result);
        Self::validate_services(job, &mut result);

        // Structural checks need a graph that builds
        if result.is_valid() {
            match JobGraph::new(&job.nodes) {
                Ok(graph) => Self::validate_graph(&graph, &mut result),
                Err(e) => result.add_error(&e.to_string()),
            }
        }

        result
    }

    fn validate_nodes(job: &JobSnapshot, result: &mut ValidationResult) {
        let ids: HashSet<&str> = job.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut seen = HashSet::new();
        let mut referenced: HashMap<&str, &str> = HashMap::new();

        for node in &job.nodes {
            if !seen.insert(node.id.as_str()) {
                result.add_error(&format!("Duplicate node id: '{}'", node.id));
            }

            for successor in &node.successors {
                if !ids.contains(successor.as_str()) {
                    result.add_error(&format!(
                        "Node '{}' points at undefined node '{}'",
                        node.id, successor
                    ));
                }
            }

            match &node.kind {
                NodeKind::Service { service } => {
                    if job.service(service).is_none() {
                        result.add_error(&format!(
                            "Node '{}' references unknown service '{}'",
                            node.id, service
                        ));
                    }
                    if let Some(other) = referenced.insert(service, &node.id) {
                        result.add_error(&format!(
                            "Service '{}' is referenced by both '{}' and '{}'",
                            service, other, node.id
                        ));
                    }
                }
                NodeKind::End if !node.successors.is_empty() => {
                    result.add_warning(&format!("End node '{}' has successors", node.id));
                }
                _ => {}
            }
        }

        for service in &job.services {
            if !referenced.contains_key(service.id.as_str()) {
                result.add_warning(&format!(
                    "Service '{}' is not in the graph and adds no duration",
                    service.id
                ));
            }
        }
    }

    fn validate_services(job: &JobSnapshot, result: &mut ValidationResult) {
        let mut service_ids = HashSet::new();
        let mut task_ids = HashSet::new();

        for service in &job.services {
            if !service_ids.insert(service.id.as_str()) {
                result.add_error(&format!("Duplicate service id: '{}'", service.id));
            }

            for task in &service.tasks {
                if !task_ids.insert(task.id.as_str()) {
                    result.add_error(&format!("Duplicate task id: '{}'", task.id));
                }
            }

            Self::validate_tasks(service, result);
        }
    }

    /// Check one service's task list
    fn validate_tasks(service: &Service, result: &mut ValidationResult) {
        if let Err(e) = TaskSequencer::validate_order(service) {
            result.add_error(&e.to_string());
        }

        let active = service.tasks.iter().filter(|t| t.status.is_active()).count();
        if active > 1 {
            result.add_warning(&format!(
                "Service '{}' has {} tasks running at once",
                service.id, active
            ));
        }

        for task in &service.tasks {
            let needs_start = matches!(task.status, TaskStatus::Done | TaskStatus::Overdue);
            if needs_start && task.started_at.is_none() {
                result.add_error(&format!(
                    "Task '{}' is {} but was never started",
                    task.id, task.status
                ));
            }
            if task.status == TaskStatus::Running && task.started_at.is_none() {
                result.add_warning(&format!(
                    "Task '{}' is running without a start time; it starts counting at the next plan",
                    task.id
                ));
            }
            if task.status == TaskStatus::Done && task.finished_at.is_none() {
                result.add_warning(&format!("Task '{}' is done without a finish time", task.id));
            }
            if task.deadline_minutes == 0 {
                result.add_warning(&format!("Task '{}' has a zero-minute deadline", task.id));
            }
        }
    }

    fn validate_graph(graph: &JobGraph, result: &mut ValidationResult) {
        let dag = DagView::new(graph);

        if let Some(cycle) = dag.find_cycle() {
            result.add_error(&format!("Circular dependency: {}", cycle.join(" -> ")));
        }

        for id in graph.all_nodes() {
            if graph.kind_of(id) == Some(&NodeKind::Start) && !graph.predecessors_of(id).is_empty() {
                result.add_warning(&format!("Start node '{}' has predecessors", id));
            }
        }

        match StageDetector::detect(graph) {
            Ok(plan) => {
                for node in plan.orphans() {
                    result.add_warning(&format!(
                        "Node '{}' is unreachable and will be estimated as a trailing stage",
                        node
                    ));
                }
            }
            Err(e) if !graph.is_empty() => {
                result.add_warning(&format!("{}; services will be estimated one after another", e));
            }
            Err(_) => {}
        }
    }
}

/// Result of job validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{NodeSpec, Task};
    use chrono::{TimeZone, Utc};

    fn job(nodes: Vec<NodeSpec>, services: Vec<Service>) -> JobSnapshot {
        JobSnapshot {
            name: "test".into(),
            description: None,
            nodes,
            services,
        }
    }

    fn svc(id: &str) -> Service {
        Service::new(id, id, vec![Task::new(&format!("{}-1", id), 1, 10)])
    }

    #[test]
    fn test_valid_job() {
        let result = JobValidator::validate(&job(
            vec![
                NodeSpec::start("s", &["a"]),
                NodeSpec::service("a", "A", &["e"]),
                NodeSpec::end("e"),
            ],
            vec![svc("A")],
        ));

        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(!result.has_warnings(), "{:?}", result.warnings);
    }

    #[test]
    fn test_empty_job_warns() {
        let result = JobValidator::validate(&job(vec![], vec![]));
        assert!(result.is_valid());
        assert!(result.warnings[0].contains("no graph nodes"));
    }

    #[test]
    fn test_collects_all_node_errors() {
        let result = JobValidator::validate(&job(
            vec![
                NodeSpec::service("a", "A", &["ghost"]),
                NodeSpec::service("a", "B", &[]),
                NodeSpec::service("c", "A", &[]),
            ],
            vec![svc("A")],
        ));

        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("Duplicate node id")));
        assert!(result.errors.iter().any(|e| e.contains("undefined node 'ghost'")));
        assert!(result.errors.iter().any(|e| e.contains("unknown service 'B'")));
        assert!(result.errors.iter().any(|e| e.contains("referenced by both")));
    }

    #[test]
    fn test_cycle_is_error() {
        let result = JobValidator::validate(&job(
            vec![
                NodeSpec::service("a", "A", &["b"]),
                NodeSpec::service("b", "B", &["a"]),
            ],
            vec![svc("A"), svc("B")],
        ));

        assert!(result.errors.iter().any(|e| e.contains("Circular dependency: a -> b")));
        assert!(result.warnings.iter().any(|w| w.contains("no entry point")));
    }

    #[test]
    fn test_orphan_and_unplaced_warnings() {
        let result = JobValidator::validate(&job(
            vec![
                NodeSpec::start("s", &["a"]),
                NodeSpec::service("a", "A", &[]),
                NodeSpec::service("x", "X", &["x"]),
            ],
            vec![svc("A"), svc("X"), svc("Loose")],
        ));

        assert!(result.warnings.iter().any(|w| w.contains("'x' is unreachable")));
        assert!(result.warnings.iter().any(|w| w.contains("'Loose' is not in the graph")));
    }

    #[test]
    fn test_task_problems() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let service = Service::new(
            "A",
            "A",
            vec![
                Task::new("t1", 1, 10).with_status(TaskStatus::Done),
                Task::new("t2", 1, 0).with_status(TaskStatus::Running).started(at),
                Task::new("t3", 3, 10).with_status(TaskStatus::Overdue).started(at),
            ],
        );
        let result = JobValidator::validate(&job(vec![NodeSpec::service("a", "A", &[])], vec![service]));

        assert!(result.errors.iter().any(|e| e.contains("out of order")));
        assert!(result.errors.iter().any(|e| e.contains("'t1' is done but was never started")));
        assert!(result.warnings.iter().any(|w| w.contains("2 tasks running at once")));
        assert!(result.warnings.iter().any(|w| w.contains("zero-minute deadline")));
    }

    #[test]
    fn test_running_without_start_warns() {
        let service = Service::new("A", "A", vec![Task::new("t1", 1, 10).with_status(TaskStatus::Running)]);
        let result = JobValidator::validate(&job(vec![NodeSpec::service("a", "A", &[])], vec![service]));

        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("'t1' is running without a start time")));
    }
}
