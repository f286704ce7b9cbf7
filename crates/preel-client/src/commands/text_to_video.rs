//! Script-to-video subcommand.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use preel_models::{AspectRatio, DEFAULT_STYLE};

use preel_client::{Session, StudioClient};

use super::{watch_and_download, Artifact};

#[derive(Args)]
pub struct TextToVideoCommand {
    /// Text file with the narration script
    #[arg(long, value_name = "FILE")]
    script: PathBuf,

    /// Style appended to every scene prompt
    #[arg(long, default_value = DEFAULT_STYLE)]
    style: String,

    /// Aspect ratio as W:H
    #[arg(long, default_value = "16:9")]
    aspect_ratio: String,

    /// Studio server base URL
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// Where to write the mp4 (default: promptreel_video_<job>.mp4)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl TextToVideoCommand {
    pub async fn execute(self) -> Result<()> {
        let aspect: AspectRatio = self
            .aspect_ratio
            .parse()
            .context("Invalid --aspect-ratio")?;
        let client = StudioClient::new(&self.server)?;
        let mut session = Session::new();

        session.begin_upload()?;
        let script = tokio::fs::read_to_string(&self.script)
            .await
            .with_context(|| format!("Could not read {}", self.script.display()))?;
        session.prompts_ready(vec![script.clone()])?;

        let started = client
            .generate_text_to_video(&script, &self.style, aspect)
            .await?;

        watch_and_download(
            &client,
            &mut session,
            &started.job_id,
            Artifact::Video,
            self.output,
        )
        .await
    }
}
