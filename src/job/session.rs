// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Edit sessions and per-job serialization
//!
//! The scheduler is stateless; these helpers belong to whoever owns job
//! state. `EditLock` is the cooperative "one service in edit mode" lock, and
//! `JobRegistry` runs mutate, recompute and store for one job at a time.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::definition::JobSnapshot;
use crate::errors::{JobflowError, JobflowResult};
use crate::schedule::{ScheduleReport, Scheduler};

/// Proof of holding the edit lock
#[derive(Debug, PartialEq, Eq)]
pub struct EditToken {
    id: u64,
    service: String,
}

impl EditToken {
    pub fn service(&self) -> &str {
        &self.service
    }
}

/// Cooperative lock: at most one service of a job is edited at a time
#[derive(Debug, Default)]
pub struct EditLock {
    holder: Option<(u64, String)>,
    next_id: u64,
}

impl EditLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing a service
    pub fn begin(&mut self, service: &str) -> JobflowResult<EditToken> {
        if let Some((_, holder)) = &self.holder {
            return Err(JobflowError::EditInProgress {
                holder: holder.clone(),
                requested: service.to_string(),
            });
        }

        self.next_id += 1;
        self.holder = Some((self.next_id, service.to_string()));
        Ok(EditToken {
            id: self.next_id,
            service: service.to_string(),
        })
    }

    /// Finish an edit; the token must be the one currently holding the lock
    pub fn end(&mut self, token: EditToken) -> JobflowResult<()> {
        match &self.holder {
            Some((id, _)) if *id == token.id => {
                self.holder = None;
                Ok(())
            }
            _ => Err(JobflowError::StaleEditToken),
        }
    }

    /// Service currently being edited
    pub fn editing(&self) -> Option<&str> {
        self.holder.as_ref().map(|(_, s)| s.as_str())
    }
}

type SharedJob = Arc<Mutex<JobSnapshot>>;

/// In-memory job store that serializes writers per job
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<BTreeMap<String, SharedJob>>,
    revisions: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a job
    pub async fn insert(&self, job: JobSnapshot) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.name.clone(), Arc::new(Mutex::new(job)));
    }

    /// Copy of the current snapshot
    pub async fn snapshot(&self, name: &str) -> Option<JobSnapshot> {
        let job = self.handle(name).await?;
        let guard = job.lock().await;
        Some(guard.clone())
    }

    pub async fn names(&self) -> Vec<String> {
        self.jobs.read().await.keys().cloned().collect()
    }

    /// Apply a mutation, recompute, and store the recomputed snapshot.
    ///
    /// Holds the job's lock for the whole cycle, so a writer always sees
    /// the previous writer's result. A failed mutation or recompute leaves
    /// the stored snapshot unchanged.
    pub async fn mutate<F>(&self, name: &str, now: DateTime<Utc>, f: F) -> JobflowResult<ScheduleReport>
    where
        F: FnOnce(&mut JobSnapshot) -> JobflowResult<()>,
    {
        let job = self.handle(name).await.ok_or_else(|| JobflowError::InvalidConfig {
            reason: format!("job '{}' is not registered", name),
        })?;

        let mut guard = job.lock().await;
        let mut draft = guard.clone();
        f(&mut draft)?;

        let (recomputed, report) = Scheduler::recompute(&draft, now)?;
        *guard = recomputed;

        let revision = self.revisions.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(job = name, revision, "job updated");
        Ok(report)
    }

    /// Number of successful mutations across all jobs
    pub fn revisions(&self) -> u64 {
        self.revisions.load(Ordering::Relaxed)
    }

    async fn handle(&self, name: &str) -> Option<SharedJob> {
        self.jobs.read().await.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{NodeSpec, Service, Task, TaskStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn job(name: &str) -> JobSnapshot {
        JobSnapshot {
            name: name.into(),
            description: None,
            nodes: vec![NodeSpec::service("a", "A", &[])],
            services: vec![Service::new(
                "A",
                "A",
                vec![Task::new("t1", 1, 10), Task::new("t2", 2, 10), Task::new("t3", 3, 10)],
            )],
        }
    }

    #[test]
    fn test_edit_lock_is_exclusive() {
        let mut lock = EditLock::new();
        let token = lock.begin("A").unwrap();

        assert_eq!(lock.editing(), Some("A"));
        assert_eq!(
            lock.begin("B").unwrap_err(),
            JobflowError::EditInProgress {
                holder: "A".into(),
                requested: "B".into(),
            }
        );

        lock.end(token).unwrap();
        assert_eq!(lock.editing(), None);
        assert_eq!(lock.begin("B").unwrap().service(), "B");
    }

    #[test]
    fn test_stale_token_rejected() {
        let mut lock = EditLock::new();
        let first = lock.begin("A").unwrap();
        let stale = EditToken {
            id: 42,
            service: "A".into(),
        };

        assert_eq!(lock.end(stale).unwrap_err(), JobflowError::StaleEditToken);
        lock.end(first).unwrap();
    }

    #[tokio::test]
    async fn test_mutate_recomputes_and_stores() {
        let registry = JobRegistry::new();
        registry.insert(job("j")).await;

        let report = registry
            .mutate("j", now(), |job| job.mark_done("t1", now()))
            .await
            .unwrap();

        assert_eq!(report.task("t2").unwrap().status, TaskStatus::Running);
        let stored = registry.snapshot("j").await.unwrap();
        assert_eq!(stored.services[0].tasks[1].status, TaskStatus::Running);
        assert_eq!(registry.revisions(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_snapshot() {
        let registry = JobRegistry::new();
        registry.insert(job("j")).await;

        let result = registry.mutate("j", now(), |job| job.mark_done("ghost", now())).await;

        assert!(matches!(result, Err(JobflowError::UnknownTask { .. })));
        assert_eq!(registry.snapshot("j").await.unwrap(), job("j"));
        assert_eq!(registry.revisions(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_completions_keep_one_running() {
        let registry = Arc::new(JobRegistry::new());
        registry.insert(job("j")).await;
        registry.mutate("j", now(), |_| Ok(())).await.unwrap();

        // Each writer completes whatever is running when it gets the lock
        let writers: Vec<_> = (0..2)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .mutate("j", now(), |job| {
                            let running = job.services[0]
                                .tasks
                                .iter()
                                .find(|t| t.status == TaskStatus::Running)
                                .map(|t| t.id.clone())
                                .ok_or_else(|| JobflowError::UnknownTask {
                                    task: "running".into(),
                                })?;
                            job.mark_done(&running, now())
                        })
                        .await
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let stored = registry.snapshot("j").await.unwrap();
        let statuses: Vec<TaskStatus> = stored.services[0].tasks.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Done, TaskStatus::Done, TaskStatus::Running]
        );
    }

    #[tokio::test]
    async fn test_jobs_are_independent() {
        let registry = JobRegistry::new();
        registry.insert(job("one")).await;
        registry.insert(job("two")).await;

        registry
            .mutate("one", now(), |job| job.mark_paused("t1"))
            .await
            .unwrap();

        assert_eq!(registry.names().await, vec!["one", "two"]);
        let two = registry.snapshot("two").await.unwrap();
        assert_eq!(two.services[0].tasks[0].status, TaskStatus::Waiting);
    }
}
