// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Duration estimation
//!
//! Critical-path estimate over a stage plan: a service lasts as long as the
//! sum of its tasks, a stage as long as its slowest service, and the job as
//! long as the sum of its stages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::stages::{Stage, StagePlan};
use crate::job::{Service, ServiceId, Task, TaskStatus};

/// Estimate for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEstimate {
    pub index: usize,
    pub duration_minutes: u64,
    /// Slowest service of the stage; `None` for sentinel-only stages
    pub bottleneck: Option<ServiceId>,
}

/// Estimate for a whole plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DurationEstimate {
    pub stages: Vec<StageEstimate>,
    pub total_minutes: u64,
}

/// Computes stage and job durations from task deadlines
pub struct DurationEstimator<'a> {
    services: HashMap<&'a str, &'a Service>,
}

impl<'a> DurationEstimator<'a> {
    pub fn new(services: &'a [Service]) -> Self {
        Self {
            services: services.iter().map(|s| (s.id.as_str(), s)).collect(),
        }
    }

    /// Planned duration of a service: its tasks run strictly in series
    pub fn service_minutes(service: &Service) -> u64 {
        service
            .tasks
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.deadline_minutes))
    }

    /// Work left in a service at `now`
    pub fn service_remaining_minutes(service: &Service, now: DateTime<Utc>) -> u64 {
        service
            .tasks
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(task_remaining(t, now)))
    }

    /// Planned duration of the job
    pub fn estimate(&self, plan: &StagePlan) -> DurationEstimate {
        self.fold_plan(plan, Self::service_minutes)
    }

    /// Remaining duration of the job at `now`, using the same stage rule
    pub fn estimate_remaining(&self, plan: &StagePlan, now: DateTime<Utc>) -> DurationEstimate {
        self.fold_plan(plan, |s| Self::service_remaining_minutes(s, now))
    }

    fn fold_plan(&self, plan: &StagePlan, per_service: impl Fn(&Service) -> u64) -> DurationEstimate {
        let stages: Vec<StageEstimate> = plan
            .stages
            .iter()
            .map(|stage| self.estimate_stage(stage, &per_service))
            .collect();

        let total_minutes = stages
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.duration_minutes));

        DurationEstimate {
            stages,
            total_minutes,
        }
    }

    fn estimate_stage(&self, stage: &Stage, per_service: &impl Fn(&Service) -> u64) -> StageEstimate {
        let mut duration_minutes = 0;
        let mut bottleneck = None;

        for id in &stage.services {
            let minutes = self.services.get(id.as_str()).map_or(0, |s| per_service(*s));
            if bottleneck.is_none() || minutes > duration_minutes {
                duration_minutes = minutes;
                bottleneck = Some(id.clone());
            }
        }

        StageEstimate {
            index: stage.index,
            duration_minutes,
            bottleneck,
        }
    }
}

fn task_remaining(task: &Task, now: DateTime<Utc>) -> u64 {
    match task.status {
        TaskStatus::Done => 0,
        TaskStatus::Running | TaskStatus::Overdue => match task.started_at {
            Some(started) => {
                let elapsed = (now - started).num_minutes().max(0) as u64;
                task.deadline_minutes.saturating_sub(elapsed)
            }
            None => task.deadline_minutes,
        },
        _ => task.deadline_minutes,
    }
}
