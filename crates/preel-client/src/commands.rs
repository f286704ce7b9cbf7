//! CLI subcommands.

pub mod images;
pub mod text_to_video;
pub mod voice_to_video;

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use preel_models::JobState;

use preel_client::{poll_until_terminal, Session, StudioClient, POLL_INTERVAL};

/// Artifact type a job produces.
pub(crate) enum Artifact {
    Zip,
    Video,
}

impl Artifact {
    fn default_file_name(&self, job_id: &str) -> String {
        match self {
            Artifact::Zip => format!("promptreel_images_{job_id}.zip"),
            Artifact::Video => format!("promptreel_video_{job_id}.mp4"),
        }
    }
}

/// Watch a started job, printing progress, and download its artifact.
///
/// Returns an error (non-zero exit) when the job fails.
pub(crate) async fn watch_and_download(
    client: &StudioClient,
    session: &mut Session,
    job_id: &str,
    artifact: Artifact,
    output: Option<PathBuf>,
) -> Result<()> {
    session.begin_generation(job_id)?;
    println!("Job {job_id} started");

    // Print a line only when the snapshot actually changed
    let mut last: Option<(u8, String)> = None;
    let status = poll_until_terminal(client, job_id, POLL_INTERVAL, |snapshot| {
        let line = (snapshot.progress, snapshot.current_task.clone());
        if last.as_ref() != Some(&line) {
            println!("[{:>3}%] {}", snapshot.progress, snapshot.current_task);
            last = Some(line);
        }
    })
    .await
    .context("Status polling failed")?;

    match status.status {
        JobState::Completed => {
            session.complete()?;

            let bytes = match artifact {
                Artifact::Zip => client.download_images(job_id).await?,
                Artifact::Video => client.download_video(job_id).await?,
            };

            let output =
                output.unwrap_or_else(|| PathBuf::from(artifact.default_file_name(job_id)));
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("Could not write {}", output.display()))?;

            println!("Saved {} ({} bytes)", output.display(), bytes.len());
            Ok(())
        }
        JobState::Failed => {
            let detail = status
                .error_message
                .clone()
                .unwrap_or_else(|| "generation failed".to_string());
            session.fail(detail.clone())?;
            bail!("Job {job_id} failed: {detail}");
        }
        other => bail!("Polling stopped in non-terminal state {other}"),
    }
}
