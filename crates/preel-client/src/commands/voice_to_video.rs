//! Voice-to-video subcommand.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use preel_models::{AspectRatio, DEFAULT_STYLE};

use preel_client::{Session, StudioClient};

use super::{watch_and_download, Artifact};

#[derive(Args)]
pub struct VoiceToVideoCommand {
    /// Narration recording (mp3, wav, m4a, ...)
    #[arg(long, value_name = "FILE")]
    audio: PathBuf,

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

impl VoiceToVideoCommand {
    pub async fn execute(self) -> Result<()> {
        let aspect: AspectRatio = self
            .aspect_ratio
            .parse()
            .context("Invalid --aspect-ratio")?;
        let client = StudioClient::new(&self.server)?;
        let mut session = Session::new();

        session.begin_upload()?;
        let audio = tokio::fs::read(&self.audio)
            .await
            .with_context(|| format!("Could not read {}", self.audio.display()))?;
        let file_name = self
            .audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "narration.mp3".to_string());

        // Scene prompts come from the server-side transcript
        session.prompts_ready(Vec::new())?;

        let started = client
            .generate_voice_to_video(&file_name, audio, &self.style, aspect)
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
