// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Task sequencing
//!
//! Derives each task's runtime status from its position and from the state
//! of the task before it. The pass is a pure function of the task list and
//! the supplied clock reading; nothing is stored between calls.
//!
//! Rules, evaluated in position order:
//!
//! - `Done`, `Paused`, `Running` and `Overdue` tasks keep their status. A
//!   `Running` task missing `started_at` is stamped.
//! - A `Waiting`/`Preparing` task becomes `Running` when it is first or its
//!   predecessor is `Done`, and gets `started_at` stamped if it has none.
//! - Otherwise it becomes `Preparing` when its predecessor is `Running` or
//!   `Overdue`, and `Waiting` in every other case.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::errors::{JobflowError, JobflowResult};
use crate::job::{Service, Task, TaskStatus};

/// Per-service task state machine
pub struct TaskSequencer;

impl TaskSequencer {
    /// Check that positions are exactly `1..=N`
    pub fn validate_order(service: &Service) -> JobflowResult<()> {
        let count = service.tasks.len() as u32;
        let mut seen = HashSet::with_capacity(service.tasks.len());

        for task in &service.tasks {
            if task.position == 0 || task.position > count {
                return Err(JobflowError::task_order(
                    &service.id,
                    format!(
                        "task '{}' has position {} outside 1..={}",
                        task.id, task.position, count
                    ),
                ));
            }
            if !seen.insert(task.position) {
                return Err(JobflowError::task_order(
                    &service.id,
                    format!("position {} is used more than once", task.position),
                ));
            }
        }

        Ok(())
    }

    /// Recompute task statuses for one service.
    ///
    /// Returns new tasks sorted by position; the input is not modified.
    pub fn sequence(service: &Service, now: DateTime<Utc>) -> JobflowResult<Vec<Task>> {
        Self::validate_order(service)?;

        let mut tasks = service.tasks.clone();
        tasks.sort_by_key(|t| t.position);

        let mut previous: Option<TaskStatus> = None;
        for task in &mut tasks {
            if matches!(task.status, TaskStatus::Waiting | TaskStatus::Preparing) {
                let next = match previous {
                    None | Some(TaskStatus::Done) => TaskStatus::Running,
                    Some(TaskStatus::Running | TaskStatus::Overdue) => TaskStatus::Preparing,
                    Some(_) => TaskStatus::Waiting,
                };

                if next == TaskStatus::Running && task.started_at.is_none() {
                    task.started_at = Some(now);
                }
                if next != task.status {
                    debug!(service = %service.id, task = %task.id, from = %task.status, to = %next, "task status changed");
                }
                task.status = next;
            } else if task.status == TaskStatus::Running && task.started_at.is_none() {
                debug!(service = %service.id, task = %task.id, "running task had no start time");
                task.started_at = Some(now);
            }
            previous = Some(task.status);
        }

        Ok(tasks)
    }

    /// Mark running tasks whose deadline has passed as `Overdue`.
    ///
    /// Only time drives this transition. Applying it twice at the same
    /// instant gives the same result.
    pub fn check_deadlines(tasks: &mut [Task], now: DateTime<Utc>) -> usize {
        let mut changed = 0;

        for task in tasks.iter_mut() {
            if task.status == TaskStatus::Running && Self::is_past_deadline(task, now) {
                debug!(task = %task.id, "task overdue");
                task.status = TaskStatus::Overdue;
                changed += 1;
            }
        }

        changed
    }

    /// Started, unfinished, and running longer than its deadline.
    ///
    /// A deadline too large to represent never passes.
    pub fn is_past_deadline(task: &Task, now: DateTime<Utc>) -> bool {
        match (task.started_at, task.finished_at, deadline(task)) {
            (Some(started), None, Some(deadline)) => now - started > deadline,
            _ => false,
        }
    }

    /// Whole minutes left before the deadline, negative once overdue.
    ///
    /// `None` for tasks that are not started or already finished. Saturates
    /// at `i64::MAX` when the deadline is too large to represent.
    pub fn remaining_minutes(task: &Task, now: DateTime<Utc>) -> Option<i64> {
        let (Some(started), None) = (task.started_at, task.finished_at) else {
            return None;
        };

        let left = deadline(task).and_then(|d| d.checked_sub(&(now - started)));
        Some(left.map_or(i64::MAX, |l| l.num_minutes()))
    }

    /// The task currently running (or overdue) in a sequenced list
    pub fn current(tasks: &[Task]) -> Option<&Task> {
        tasks.iter().find(|t| t.status.is_active())
    }
}

fn deadline(task: &Task) -> Option<Duration> {
    i64::try_from(task.deadline_minutes)
        .ok()
        .and_then(Duration::try_minutes)
}
