//! Concurrent in-memory job map.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use preel_models::{progress_percent, Job, JobId, JobState};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Shared registry of all known jobs.
///
/// Cloning is cheap; all clones see the same map. Readers get snapshot
/// copies, writers take the single write lock for the duration of one
/// transition.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job, returning its id.
    pub async fn insert(&self, job: Job) -> JobId {
        let id = job.id.clone();
        self.jobs.write().await.insert(id.clone(), job);
        id
    }

    /// Snapshot copy of a job.
    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Number of tracked jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Move a pending job into processing.
    pub async fn begin(&self, id: &JobId) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if job.state.is_terminal() {
            return Err(StoreError::terminal(id, job.state.as_str()));
        }
        if job.state != JobState::Pending {
            return Err(StoreError::invalid_transition(
                id,
                format!("{} -> processing", job.state),
            ));
        }

        *job = job.clone().start();
        Ok(())
    }

    /// Update the total work item count once it becomes known
    /// (scene counts are only known after the script is split).
    pub async fn set_total(&self, id: &JobId, total: u32) -> StoreResult<()> {
        self.mutate_live(id, |job| {
            job.total_items = total;
        })
        .await
    }

    /// Record item-based progress: `completed` out of `total` work items.
    ///
    /// The stored percentage never decreases even if callers report out of
    /// order.
    pub async fn set_progress(
        &self,
        id: &JobId,
        completed: u32,
        total: u32,
        task: impl Into<String>,
    ) -> StoreResult<()> {
        let task = task.into();
        self.mutate_live(id, |job| {
            let percent = progress_percent(completed, total).max(job.progress);
            job.total_items = total;
            job.completed_items = job.completed_items.max(completed);
            *job = job.clone().with_progress(percent).with_task(task);
        })
        .await
    }

    /// Record stage-based progress as a raw percentage.
    ///
    /// Video pipelines report fixed milestones rather than item counts;
    /// the same monotonic clamp applies.
    pub async fn set_stage(
        &self,
        id: &JobId,
        percent: u8,
        task: impl Into<String>,
    ) -> StoreResult<()> {
        let task = task.into();
        self.mutate_live(id, |job| {
            let percent = percent.max(job.progress);
            *job = job.clone().with_progress(percent).with_task(task);
        })
        .await
    }

    /// Mark a processing job as completed with its artifact.
    pub async fn complete(&self, id: &JobId, artifact: PathBuf) -> StoreResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if job.state.is_terminal() {
            return Err(StoreError::terminal(id, job.state.as_str()));
        }
        if job.state != JobState::Processing {
            return Err(StoreError::invalid_transition(
                id,
                format!("{} -> completed", job.state),
            ));
        }

        *job = job.clone().complete(artifact);
        debug!(job_id = %id, "Job completed");
        Ok(job.clone())
    }

    /// Mark a live job as failed.
    pub async fn fail(&self, id: &JobId, error: impl Into<String>) -> StoreResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if job.state.is_terminal() {
            return Err(StoreError::terminal(id, job.state.as_str()));
        }

        *job = job.clone().fail(error);
        debug!(job_id = %id, "Job failed");
        Ok(job.clone())
    }

    /// Remove a job outright. Returns the removed record, if any.
    pub async fn remove(&self, id: &JobId) -> Option<Job> {
        self.jobs.write().await.remove(id)
    }

    /// Remove terminal jobs whose last update is older than `ttl` and
    /// return them so the caller can delete whatever they left on disk.
    /// Live jobs are never evicted.
    pub async fn evict_expired(&self, ttl: Duration) -> Vec<Job> {
        let cutoff = Utc::now() - ttl;
        let mut jobs = self.jobs.write().await;

        let expired: Vec<JobId> = jobs
            .iter()
            .filter(|(_, job)| job.state.is_terminal() && job.updated_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| jobs.remove(&id))
            .collect()
    }

    /// Apply a mutation to a job that is actively processing.
    async fn mutate_live(&self, id: &JobId, f: impl FnOnce(&mut Job)) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if job.state.is_terminal() {
            return Err(StoreError::terminal(id, job.state.as_str()));
        }
        if job.state != JobState::Processing {
            return Err(StoreError::invalid_transition(
                id,
                format!("cannot update job in state {}", job.state),
            ));
        }

        f(job);
        Ok(())
    }
}
