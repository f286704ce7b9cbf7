//! Fixed-interval job polling.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::client::{JobStatus, StudioClient};
use crate::error::ClientResult;

/// Default interval between status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Poll job status until the job reaches a terminal state.
///
/// Every snapshot is handed to `on_update`; the first poll happens
/// immediately, then one per interval. Returns the terminal snapshot.
pub async fn poll_until_terminal<F>(
    client: &StudioClient,
    job_id: &str,
    interval: Duration,
    mut on_update: F,
) -> ClientResult<JobStatus>
where
    F: FnMut(&JobStatus),
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let status = client.job_status(job_id).await?;
        on_update(&status);

        if status.is_terminal() {
            return Ok(status);
        }
    }
}
