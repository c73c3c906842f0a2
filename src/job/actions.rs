// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Mutating actions on a job snapshot
//!
//! These are the writes the scheduler reacts to: graph edits, task
//! reordering and the explicit done/pause/resume transitions. Each action
//! edits the snapshot it is given; callers recompute afterwards.

use chrono::{DateTime, Utc};

use super::definition::{JobSnapshot, NodeSpec, Task, TaskStatus};
use crate::errors::{JobflowError, JobflowResult};
use crate::schedule::TaskSequencer;

impl JobSnapshot {
    // ─────────────────────────────────────────────────────────────────────
    // Graph edits
    // ─────────────────────────────────────────────────────────────────────

    /// Add a node to the graph
    pub fn add_node(&mut self, node: NodeSpec) -> JobflowResult<()> {
        if self.node(&node.id).is_some() {
            return Err(JobflowError::DuplicateNode { node: node.id });
        }
        if let Some(service) = node.kind.service_id() {
            if self.service(service).is_none() {
                return Err(JobflowError::UnknownService {
                    service: service.to_string(),
                });
            }
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every edge pointing at it
    pub fn remove_node(&mut self, id: &str) -> JobflowResult<NodeSpec> {
        let index = self.node_index(id)?;
        let removed = self.nodes.remove(index);
        for node in &mut self.nodes {
            node.successors.retain(|s| s != id);
        }
        Ok(removed)
    }

    /// Add an edge `from -> to`; adding an existing edge is a no-op
    pub fn add_edge(&mut self, from: &str, to: &str) -> JobflowResult<()> {
        self.node_index(to)?;
        let index = self.node_index(from)?;
        let successors = &mut self.nodes[index].successors;
        if !successors.iter().any(|s| s == to) {
            successors.push(to.to_string());
        }
        Ok(())
    }

    /// Remove an edge `from -> to`, returning whether it existed
    pub fn remove_edge(&mut self, from: &str, to: &str) -> JobflowResult<bool> {
        let index = self.node_index(from)?;
        let successors = &mut self.nodes[index].successors;
        let before = successors.len();
        successors.retain(|s| s != to);
        Ok(successors.len() != before)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Task list edits
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a task at a 1-based position, shifting later tasks down.
    ///
    /// Positions past the end append.
    pub fn insert_task(&mut self, service: &str, mut task: Task, position: u32) -> JobflowResult<()> {
        if self.service_of_task(&task.id).is_some() {
            return Err(JobflowError::InvalidConfig {
                reason: format!("task '{}' already exists", task.id),
            });
        }

        let tasks = self.ordered_tasks_mut(service)?;
        let index = (position.max(1) as usize - 1).min(tasks.len());
        task.status = TaskStatus::Waiting;
        task.started_at = None;
        task.finished_at = None;
        tasks.insert(index, task);
        renumber(tasks);
        Ok(())
    }

    /// Remove a task and close the gap it leaves
    pub fn remove_task(&mut self, task_id: &str) -> JobflowResult<Task> {
        let service = self.owner_of(task_id)?;
        let tasks = self.ordered_tasks_mut(&service)?;
        let index = position_of(tasks, task_id)?;
        let removed = tasks.remove(index);
        renumber(tasks);
        Ok(removed)
    }

    /// Move a task to a new 1-based position within its service
    pub fn move_task(&mut self, task_id: &str, position: u32) -> JobflowResult<()> {
        let service = self.owner_of(task_id)?;
        let tasks = self.ordered_tasks_mut(&service)?;
        let index = position_of(tasks, task_id)?;
        let task = tasks.remove(index);
        let target = (position.max(1) as usize - 1).min(tasks.len());
        tasks.insert(target, task);
        renumber(tasks);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Status writes
    // ─────────────────────────────────────────────────────────────────────

    /// Mark a task done
    pub fn mark_done(&mut self, task_id: &str, now: DateTime<Utc>) -> JobflowResult<()> {
        let task = self.task_mut(task_id)?;
        task.started_at.get_or_insert(now);
        task.finished_at.get_or_insert(now);
        task.status = TaskStatus::Done;
        Ok(())
    }

    /// Pause a task; the sequencer will not touch it until resumed
    pub fn mark_paused(&mut self, task_id: &str) -> JobflowResult<()> {
        let task = self.task_mut(task_id)?;
        if task.status == TaskStatus::Done {
            return Err(JobflowError::InvalidConfig {
                reason: format!("task '{}' is already done", task_id),
            });
        }
        task.status = TaskStatus::Paused;
        Ok(())
    }

    /// Resume a task as running
    pub fn mark_running(&mut self, task_id: &str, now: DateTime<Utc>) -> JobflowResult<()> {
        let task = self.task_mut(task_id)?;
        task.started_at.get_or_insert(now);
        task.finished_at = None;
        task.status = if TaskSequencer::is_past_deadline(task, now) {
            TaskStatus::Overdue
        } else {
            TaskStatus::Running
        };
        Ok(())
    }

    /// Change the planned duration of a task.
    ///
    /// An overdue task whose new deadline has not passed is running again.
    pub fn set_deadline(&mut self, task_id: &str, minutes: u64, now: DateTime<Utc>) -> JobflowResult<()> {
        let task = self.task_mut(task_id)?;
        task.deadline_minutes = minutes;
        if task.status == TaskStatus::Overdue && !TaskSequencer::is_past_deadline(task, now) {
            task.status = TaskStatus::Running;
        }
        Ok(())
    }

    fn node_index(&self, id: &str) -> JobflowResult<usize> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| JobflowError::UnknownNode { node: id.to_string() })
    }

    fn owner_of(&self, task_id: &str) -> JobflowResult<String> {
        self.service_of_task(task_id)
            .map(|s| s.id.clone())
            .ok_or_else(|| JobflowError::UnknownTask {
                task: task_id.to_string(),
            })
    }

    fn task_mut(&mut self, task_id: &str) -> JobflowResult<&mut Task> {
        self.services
            .iter_mut()
            .flat_map(|s| s.tasks.iter_mut())
            .find(|t| t.id == task_id)
            .ok_or_else(|| JobflowError::UnknownTask {
                task: task_id.to_string(),
            })
    }

    fn ordered_tasks_mut(&mut self, service: &str) -> JobflowResult<&mut Vec<Task>> {
        let service = self
            .service_mut(service)
            .ok_or_else(|| JobflowError::UnknownService {
                service: service.to_string(),
            })?;
        service.tasks.sort_by_key(|t| t.position);
        Ok(&mut service.tasks)
    }
}

fn position_of(tasks: &[Task], task_id: &str) -> JobflowResult<usize> {
    tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| JobflowError::UnknownTask {
            task: task_id.to_string(),
        })
}

fn renumber(tasks: &mut [Task]) {
    for (i, task) in tasks.iter_mut().enumerate() {
        task.position = i as u32 + 1;
    }
}
