//! Background eviction of expired jobs.
//!
//! Terminal jobs stay queryable for a grace period so pollers can fetch
//! the final status and download the artifact. After the TTL the sweeper
//! drops the record and deletes the job's directory from disk.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};

use crate::store::JobStore;

/// Interval between eviction runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic job eviction service.
pub struct JobSweeper {
    store: JobStore,
    ttl: chrono::Duration,
    jobs_root: PathBuf,
}

impl JobSweeper {
    /// Create a sweeper evicting terminal jobs older than `ttl_secs`.
    /// `jobs_root` is the directory holding one subdirectory per job.
    pub fn new(store: JobStore, ttl_secs: u64, jobs_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            ttl: chrono::Duration::seconds(ttl_secs as i64),
            jobs_root: jobs_root.into(),
        }
    }

    /// Start the background eviction loop.
    ///
    /// Runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        info!(
            ttl_secs = self.ttl.num_seconds(),
            "Starting job sweeper (interval: {:?})",
            SWEEP_INTERVAL
        );

        let mut ticker = interval(SWEEP_INTERVAL);

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// Run a single eviction cycle. Returns the number of evicted jobs.
    pub async fn sweep_once(&self) -> usize {
        let expired = self.store.evict_expired(self.ttl).await;

        for job in &expired {
            let dir = self.jobs_root.join(job.id.as_str());
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(job_id = %job.id, path = %dir.display(), "Failed to remove job directory: {}", e);
                }
            }

            // Artifacts normally live inside the job directory; clean up
            // strays that were moved elsewhere.
            if let Some(artifact) = &job.artifact {
                if !artifact.starts_with(&dir) {
                    if let Err(e) = tokio::fs::remove_file(artifact).await {
                        if e.kind() != std::io::ErrorKind::NotFound {
                            warn!(job_id = %job.id, path = %artifact.display(), "Failed to remove artifact: {}", e);
                        }
                    }
                }
            }
        }

        if !expired.is_empty() {
            info!("Job sweep complete: evicted {} expired jobs", expired.len());
        }

        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preel_models::{Job, JobKind};

    #[tokio::test]
    async fn test_sweep_removes_job_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JobStore::new();

        let id = store.insert(Job::new(JobKind::Images, 1)).await;
        store.begin(&id).await.unwrap();

        let job_dir = tmp.path().join(id.as_str());
        std::fs::create_dir_all(&job_dir).unwrap();
        let artifact = job_dir.join("promptreel_images.zip");
        std::fs::write(&artifact, b"zip bytes").unwrap();

        store.complete(&id, artifact.clone()).await.unwrap();

        let sweeper = JobSweeper::new(store.clone(), 0, tmp.path());
        let evicted = sweeper.sweep_once().await;

        assert_eq!(evicted, 1);
        assert!(store.get(&id).await.is_none());
        assert!(!job_dir.exists());
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_jobs() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JobStore::new();

        let id = store.insert(Job::new(JobKind::Images, 1)).await;
        store.begin(&id).await.unwrap();
        store
            .complete(&id, tmp.path().join("out.zip"))
            .await
            .unwrap();

        let sweeper = JobSweeper::new(store.clone(), 3600, tmp.path());
        assert_eq!(sweeper.sweep_once().await, 0);
        assert!(store.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_ignores_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JobStore::new();

        let id = store.insert(Job::new(JobKind::TextToVideo, 0)).await;
        store.begin(&id).await.unwrap();
        store.fail(&id, "no scenes").await.unwrap();

        // No directory was ever created for this job
        let sweeper = JobSweeper::new(store.clone(), 0, tmp.path());
        assert_eq!(sweeper.sweep_once().await, 1);
        assert!(store.get(&id).await.is_none());
    }
}
