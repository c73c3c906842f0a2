// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Scheduling facade
//!
//! One entry point that turns a job snapshot into a stage plan, duration
//! estimates and recomputed task statuses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::duration::{DurationEstimate, DurationEstimator};
use super::sequencer::TaskSequencer;
use super::stages::{StageDetector, StagePlan};
use crate::errors::{JobflowError, JobflowResult};
use crate::graph::JobGraph;
use crate::job::{JobSnapshot, ServiceId, Task, TaskId, TaskStatus};

/// Reason an estimate is not exact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// No entry point; every service was given its own stage
    NoEntryPoint,
    /// Node appended as a trailing stage
    OrphanNode { node: String },
    /// Service left unsequenced; its tasks are reported as given
    InvalidTaskOrder { service: ServiceId, reason: String },
    /// Service is not part of the graph and adds no duration
    UnplacedService { service: ServiceId },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEntryPoint => {
                write!(f, "graph has no entry point, services estimated one after another")
            }
            Self::OrphanNode { node } => {
                write!(f, "node '{}' is unreachable, appended as a trailing stage", node)
            }
            Self::InvalidTaskOrder { service, reason } => {
                write!(f, "service '{}' not sequenced: {}", service, reason)
            }
            Self::UnplacedService { service } => {
                write!(f, "service '{}' is not in the graph", service)
            }
        }
    }
}

/// Recomputed state of one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskState {
    pub task_id: TaskId,
    pub service_id: ServiceId,
    pub position: u32,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Countdown for running and overdue tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<i64>,
}

impl TaskState {
    fn new(service_id: &str, task: &Task, now: DateTime<Utc>) -> Self {
        let remaining_minutes = if task.status.is_active() {
            TaskSequencer::remaining_minutes(task, now)
        } else {
            None
        };

        Self {
            task_id: task.id.clone(),
            service_id: service_id.to_string(),
            position: task.position,
            status: task.status,
            started_at: task.started_at,
            finished_at: task.finished_at,
            remaining_minutes,
        }
    }
}

/// Everything derived from one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    pub job: String,
    pub computed_at: DateTime<Utc>,
    /// Stages as service ids, sentinel-only stages omitted
    pub stages: Vec<Vec<ServiceId>>,
    /// Full plan including sentinel and orphan stages
    pub plan: StagePlan,
    pub estimate: DurationEstimate,
    pub total_duration_minutes: u64,
    pub remaining_duration_minutes: u64,
    /// False whenever a degradation applies
    pub exact: bool,
    pub degradations: Vec<Degradation>,
    pub tasks: Vec<TaskState>,
}

impl ScheduleReport {
    pub fn to_json(&self) -> JobflowResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// BLAKE3 digest of the JSON form
    pub fn fingerprint(&self) -> JobflowResult<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    pub fn task(&self, id: &str) -> Option<&TaskState> {
        self.tasks.iter().find(|t| t.task_id == id)
    }

    pub fn overdue(&self) -> impl Iterator<Item = &TaskState> {
        self.tasks.iter().filter(|t| t.status == TaskStatus::Overdue)
    }
}

/// Composes graph, stage detection, estimation and sequencing
pub struct Scheduler;

impl Scheduler {
    /// Compute the report for a snapshot
    pub fn plan(job: &JobSnapshot, now: DateTime<Utc>) -> JobflowResult<ScheduleReport> {
        Self::recompute(job, now).map(|(_, report)| report)
    }

    /// Compute the report and a new snapshot carrying the recomputed task
    /// fields, ready to be persisted by the caller.
    ///
    /// Fails on graph construction errors and on service nodes pointing at
    /// undefined services. Missing entry points, orphan nodes and badly
    /// ordered services degrade the estimate instead.
    pub fn recompute(
        job: &JobSnapshot,
        now: DateTime<Utc>,
    ) -> JobflowResult<(JobSnapshot, ScheduleReport)> {
        let graph = JobGraph::new(&job.nodes)?;

        for service in graph.services() {
            if job.service(service).is_none() {
                return Err(JobflowError::UnknownService {
                    service: service.to_string(),
                });
            }
        }

        let mut degradations = Vec::new();

        let plan = match StageDetector::detect(&graph) {
            Ok(plan) => {
                for node in plan.orphans() {
                    warn!(job = %job.name, node, "orphan node appended as trailing stage");
                    degradations.push(Degradation::OrphanNode {
                        node: node.to_string(),
                    });
                }
                plan
            }
            Err(JobflowError::NoEntryPoint) => {
                warn!(job = %job.name, "no entry point, falling back to sequential stages");
                degradations.push(Degradation::NoEntryPoint);
                StagePlan::sequential(&graph)
            }
            Err(e) => return Err(e),
        };

        let placed: HashSet<&str> = graph.services().collect();
        let mut updated = job.clone();
        let mut tasks = Vec::new();

        for service in &mut updated.services {
            if !placed.contains(service.id.as_str()) {
                warn!(job = %job.name, service = %service.id, "service not in graph");
                degradations.push(Degradation::UnplacedService {
                    service: service.id.clone(),
                });
            }

            match TaskSequencer::sequence(service, now) {
                Ok(mut sequenced) => {
                    TaskSequencer::check_deadlines(&mut sequenced, now);
                    service.tasks = sequenced;
                }
                Err(JobflowError::InvalidTaskOrder { service: id, reason }) => {
                    warn!(job = %job.name, service = %id, %reason, "task order invalid");
                    degradations.push(Degradation::InvalidTaskOrder {
                        service: id,
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }

            tasks.extend(service.tasks.iter().map(|t| TaskState::new(&service.id, t, now)));
        }

        let estimator = DurationEstimator::new(&updated.services);
        let estimate = estimator.estimate(&plan);
        let remaining = estimator.estimate_remaining(&plan, now);

        debug!(
            job = %job.name,
            stages = plan.len(),
            total = estimate.total_minutes,
            remaining = remaining.total_minutes,
            "schedule computed"
        );

        let report = ScheduleReport {
            job: job.name.clone(),
            computed_at: now,
            stages: plan.service_stages(),
            total_duration_minutes: estimate.total_minutes,
            remaining_duration_minutes: remaining.total_minutes,
            exact: degradations.is_empty(),
            plan,
            estimate,
            degradations,
            tasks,
        };

        Ok((updated, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{NodeSpec, Service};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn service(id: &str, deadlines: &[u64]) -> Service {
        let tasks = deadlines
            .iter()
            .enumerate()
            .map(|(i, d)| Task::new(&format!("{}{}", id, i + 1), i as u32 + 1, *d))
            .collect();
        Service::new(id, id, tasks)
    }

    fn fork_job() -> JobSnapshot {
        JobSnapshot {
            name: "fork".into(),
            description: None,
            nodes: vec![
                NodeSpec::start("start", &["a"]),
                NodeSpec::service("a", "A", &["b", "c"]),
                NodeSpec::service("b", "B", &["end"]),
                NodeSpec::service("c", "C", &["end"]),
                NodeSpec::end("end"),
            ],
            services: vec![service("A", &[100]), service("B", &[50]), service("C", &[80])],
        }
    }

    #[test]
    fn test_fork_and_join() {
        let report = Scheduler::plan(&fork_job(), now()).unwrap();

        assert_eq!(
            report.stages,
            vec![vec!["A".to_string()], vec!["B".into(), "C".into()]]
        );
        assert_eq!(report.plan.len(), 4);
        assert_eq!(report.total_duration_minutes, 180);
        assert_eq!(report.remaining_duration_minutes, 180);
        assert!(report.exact);

        let first = report.task("A1").unwrap();
        assert_eq!(first.status, TaskStatus::Running);
        assert_eq!(first.started_at, Some(now()));
        assert_eq!(first.remaining_minutes, Some(100));
    }

    #[test]
    fn test_single_service_scenario() {
        let job = JobSnapshot {
            name: "single".into(),
            description: None,
            nodes: vec![NodeSpec::service("n", "S", &[])],
            services: vec![service("S", &[60, 120, 30])],
        };

        let report = Scheduler::plan(&job, now()).unwrap();
        let statuses: Vec<TaskStatus> = report.tasks.iter().map(|t| t.status).collect();

        assert_eq!(
            statuses,
            vec![TaskStatus::Running, TaskStatus::Preparing, TaskStatus::Waiting]
        );
        assert_eq!(report.total_duration_minutes, 210);
    }

    #[test]
    fn test_idempotent_output() {
        let job = fork_job();
        let first = Scheduler::plan(&job, now()).unwrap();
        let second = Scheduler::plan(&job, now()).unwrap();

        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
    }

    #[test]
    fn test_recompute_returns_new_snapshot() {
        let job = fork_job();
        let (updated, _) = Scheduler::recompute(&job, now()).unwrap();

        assert_eq!(job.services[0].tasks[0].status, TaskStatus::Waiting);
        assert_eq!(updated.services[0].tasks[0].status, TaskStatus::Running);

        // feeding the result back in changes nothing
        let (again, _) = Scheduler::recompute(&updated, now()).unwrap();
        assert_eq!(again, updated);
    }

    #[test]
    fn test_deadline_applied_after_sequencing() {
        let mut job = fork_job();
        job.services[0].tasks[0].status = TaskStatus::Running;
        job.services[0].tasks[0].started_at = Some(now() - Duration::minutes(130));

        let report = Scheduler::plan(&job, now()).unwrap();
        let task = report.task("A1").unwrap();

        assert_eq!(task.status, TaskStatus::Overdue);
        assert_eq!(task.remaining_minutes, Some(-30));
        assert_eq!(report.overdue().count(), 1);
        assert_eq!(report.remaining_duration_minutes, 80);
    }

    #[test]
    fn test_no_entry_point_degrades_to_sequential() {
        let job = JobSnapshot {
            name: "loop".into(),
            description: None,
            nodes: vec![
                NodeSpec::service("a", "A", &["b"]),
                NodeSpec::service("b", "B", &["a"]),
            ],
            services: vec![service("A", &[10]), service("B", &[20])],
        };

        let report = Scheduler::plan(&job, now()).unwrap();

        assert!(!report.exact);
        assert_eq!(report.degradations, vec![Degradation::NoEntryPoint]);
        assert_eq!(report.stages.len(), 2);
        assert_eq!(report.total_duration_minutes, 30);
    }

    #[test]
    fn test_orphans_still_counted() {
        let job = JobSnapshot {
            name: "orphan".into(),
            description: None,
            nodes: vec![
                NodeSpec::start("s", &["a"]),
                NodeSpec::service("a", "A", &["b"]),
                NodeSpec::service("b", "B", &["a"]),
            ],
            services: vec![service("A", &[10]), service("B", &[20])],
        };

        let report = Scheduler::plan(&job, now()).unwrap();

        assert_eq!(report.total_duration_minutes, 30);
        assert_eq!(
            report.degradations,
            vec![
                Degradation::OrphanNode { node: "a".into() },
                Degradation::OrphanNode { node: "b".into() },
            ]
        );
    }

    #[test]
    fn test_invalid_order_is_isolated() {
        let mut job = fork_job();
        job.services[1].tasks[0].position = 7;

        let report = Scheduler::plan(&job, now()).unwrap();

        assert!(matches!(
            report.degradations.as_slice(),
            [Degradation::InvalidTaskOrder { service, .. }] if service == "B"
        ));
        // other services still sequenced
        assert_eq!(report.task("A1").unwrap().status, TaskStatus::Running);
        assert_eq!(report.task("B1").unwrap().status, TaskStatus::Waiting);
        assert_eq!(report.total_duration_minutes, 180);
    }

    #[test]
    fn test_unplaced_service_adds_no_duration() {
        let mut job = fork_job();
        job.services.push(service("X", &[999]));

        let report = Scheduler::plan(&job, now()).unwrap();

        assert_eq!(report.total_duration_minutes, 180);
        assert_eq!(
            report.degradations,
            vec![Degradation::UnplacedService { service: "X".into() }]
        );
        assert_eq!(report.task("X1").unwrap().status, TaskStatus::Running);
    }

    #[test]
    fn test_huge_deadline_plans_without_overdue() {
        for minutes in [200_000_000_000_000, u64::MAX] {
            let job = JobSnapshot {
                name: "long".into(),
                description: None,
                nodes: vec![NodeSpec::service("n", "S", &[])],
                services: vec![service("S", &[minutes])],
            };

            let report = Scheduler::plan(&job, now()).unwrap();
            assert_eq!(report.task("S1").unwrap().status, TaskStatus::Running);
            assert_eq!(report.total_duration_minutes, minutes);
            assert_eq!(report.remaining_duration_minutes, minutes);

            let (started, _) = Scheduler::recompute(&job, now()).unwrap();
            let later = Scheduler::plan(&started, now() + Duration::days(3650)).unwrap();
            assert_eq!(later.overdue().count(), 0);
            assert_eq!(later.remaining_duration_minutes, minutes - 3650 * 24 * 60);
        }
    }

    #[test]
    fn test_fatal_errors() {
        let mut job = fork_job();
        job.nodes[0].successors.push("ghost".into());
        assert!(matches!(
            Scheduler::plan(&job, now()),
            Err(JobflowError::DanglingEdge { .. })
        ));

        let mut job = fork_job();
        job.services.retain(|s| s.id != "C");
        assert_eq!(
            Scheduler::plan(&job, now()).unwrap_err(),
            JobflowError::UnknownService { service: "C".into() }
        );
    }
}
