//! Image batch subcommand.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use preel_models::{AspectRatio, DEFAULT_STYLE};

use preel_client::{Session, StudioClient};

use super::{watch_and_download, Artifact};

#[derive(Args)]
pub struct ImagesCommand {
    /// CSV file of prompts, one per row (first column)
    #[arg(long, value_name = "FILE")]
    csv: PathBuf,

    /// Style appended to every prompt
    #[arg(long, default_value = DEFAULT_STYLE)]
    style: String,

    /// Aspect ratio as W:H
    #[arg(long, default_value = "1:1")]
    aspect_ratio: String,

    /// Studio server base URL
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// Where to write the zip (default: promptreel_images_<job>.zip)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl ImagesCommand {
    pub async fn execute(self) -> Result<()> {
        let aspect: AspectRatio = self
            .aspect_ratio
            .parse()
            .context("Invalid --aspect-ratio")?;
        let client = StudioClient::new(&self.server)?;
        let mut session = Session::new();

        session.begin_upload()?;
        let data = tokio::fs::read(&self.csv)
            .await
            .with_context(|| format!("Could not read {}", self.csv.display()))?;
        let file_name = self
            .csv
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "prompts.csv".to_string());

        let uploaded = client.upload_csv(&file_name, data).await?;
        println!("Parsed {} prompts from {}", uploaded.count, self.csv.display());
        session.prompts_ready(uploaded.prompts.clone())?;

        let started = client
            .generate_images(uploaded.prompts, &self.style, aspect)
            .await?;

        watch_and_download(&client, &mut session, &started.job_id, Artifact::Zip, self.output)
            .await
    }
}
