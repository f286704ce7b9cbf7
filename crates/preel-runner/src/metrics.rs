//! Prometheus metrics for job pipelines.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_STARTED_TOTAL: &str = "preel_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "preel_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "preel_jobs_failed_total";
    pub const GENERATION_DURATION_SECONDS: &str = "preel_generation_duration_seconds";
}

/// Record a job accepted for processing.
pub fn record_job_started(job_type: &str) {
    let labels = [("type", job_type.to_string())];
    counter!(names::JOBS_STARTED_TOTAL, &labels).increment(1);
}

/// Record a job that reached `completed`.
pub fn record_job_completed(job_type: &str) {
    let labels = [("type", job_type.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Record a job that reached `failed`.
pub fn record_job_failed(job_type: &str) {
    let labels = [("type", job_type.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record one call to an external generation service.
pub fn record_generation(service: &str, duration_secs: f64) {
    let labels = [("service", service.to_string())];
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}
