//! Fire-and-forget generation pipelines.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{error, info, warn};

use preel_genai::{
    GeminiImageClient, GenAiConfig, TranslateTtsClient, WorkersAiImageClient,
    WorkersAiWhisperClient,
};
use preel_media::{
    build_zip, media_duration, move_file, render_slideshow, scene_durations, split_script,
    JobWorkspace, MediaError, SlideshowFrame,
};
use preel_models::{AspectRatio, JobId, JobKind};
use preel_store::JobStore;

use crate::config::StudioConfig;
use crate::error::RunnerResult;
use crate::metrics::{record_generation, record_job_completed, record_job_failed, record_job_started};

/// Spawns and drives generation jobs.
///
/// Each `spawn_*` method hands the pipeline to `tokio::spawn` and returns
/// immediately; callers observe progress through the job store. Pipelines
/// stop at the first error, recording it on the job.
#[derive(Clone)]
pub struct JobRunner {
    store: JobStore,
    workspace: JobWorkspace,
    genai: GenAiConfig,
    config: StudioConfig,
}

impl JobRunner {
    pub fn new(store: JobStore, genai: GenAiConfig, config: StudioConfig) -> Self {
        let workspace = JobWorkspace::new(&config.data_dir);
        Self {
            store,
            workspace,
            genai,
            config,
        }
    }

    /// Run an image batch job in the background.
    pub fn spawn_images(
        &self,
        job_id: JobId,
        prompts: Vec<String>,
        style: String,
        aspect: AspectRatio,
    ) {
        let runner = self.clone();
        tokio::spawn(async move {
            record_job_started(JobKind::Images.as_str());
            let outcome = runner.run_images(&job_id, &prompts, &style, aspect).await;
            runner.finish(&job_id, JobKind::Images, outcome).await;
        });
    }

    /// Run a script-to-video job in the background.
    pub fn spawn_text_to_video(
        &self,
        job_id: JobId,
        script: String,
        style: String,
        aspect: AspectRatio,
    ) {
        let runner = self.clone();
        tokio::spawn(async move {
            record_job_started(JobKind::TextToVideo.as_str());
            let outcome = runner
                .run_text_to_video(&job_id, &script, &style, aspect)
                .await;
            runner.finish(&job_id, JobKind::TextToVideo, outcome).await;
        });
    }

    /// Run a narration-to-video job in the background.
    pub fn spawn_voice_to_video(
        &self,
        job_id: JobId,
        audio: Vec<u8>,
        file_name: String,
        style: String,
        aspect: AspectRatio,
    ) {
        let runner = self.clone();
        tokio::spawn(async move {
            record_job_started(JobKind::VoiceToVideo.as_str());
            let outcome = runner
                .run_voice_to_video(&job_id, &audio, &file_name, &style, aspect)
                .await;
            runner.finish(&job_id, JobKind::VoiceToVideo, outcome).await;
        });
    }

    async fn finish(&self, job_id: &JobId, kind: JobKind, outcome: RunnerResult<()>) {
        match outcome {
            Ok(()) => {
                record_job_completed(kind.as_str());
            }
            Err(err) => {
                error!(job_id = %job_id, kind = kind.as_str(), "Job failed: {err}");
                record_job_failed(kind.as_str());
                if let Err(store_err) = self.store.fail(job_id, err.to_string()).await {
                    warn!(job_id = %job_id, "Could not record job failure: {store_err}");
                }
            }
        }
    }

    /// Generate one image per prompt, zip the results, complete the job.
    async fn run_images(
        &self,
        job_id: &JobId,
        prompts: &[String],
        style: &str,
        aspect: AspectRatio,
    ) -> RunnerResult<()> {
        let total = prompts.len() as u32;
        info!(job_id = %job_id, kind = "images", "Starting image batch: {total} prompts");

        self.store.begin(job_id).await?;
        let client = GeminiImageClient::new(&self.genai)?;
        let job_dir = self.workspace.create_job_dir(job_id.as_str()).await?;

        let mut stills = Vec::with_capacity(prompts.len());
        for (i, prompt) in prompts.iter().enumerate() {
            let position = i as u32 + 1;
            let task = format!("Generating image {position}/{total}");
            self.store
                .set_progress(job_id, i as u32, total, task.clone())
                .await?;

            let started = Instant::now();
            let image = client
                .generate(&enhance_prompt(prompt, style), aspect)
                .await?;
            record_generation("gemini", started.elapsed().as_secs_f64());

            let path = self.workspace.image_path(job_id.as_str(), position as usize);
            tokio::fs::write(&path, &image).await?;
            stills.push(path);

            self.store.set_progress(job_id, position, total, task).await?;

            if position < total {
                sleep(Duration::from_millis(self.config.item_delay_ms)).await;
            }
        }

        let zip_tmp = job_dir.join("partial.zip");
        build_zip(stills, zip_tmp.clone()).await?;
        let artifact = self.workspace.zip_path(job_id.as_str());
        move_file(&zip_tmp, &artifact).await?;

        self.store.complete(job_id, artifact).await?;
        info!(job_id = %job_id, kind = "images", "Image batch completed");
        Ok(())
    }

    /// Turn a script into narrated video: scenes, stills, speech, render.
    async fn run_text_to_video(
        &self,
        job_id: &JobId,
        script: &str,
        style: &str,
        aspect: AspectRatio,
    ) -> RunnerResult<()> {
        info!(job_id = %job_id, kind = "text_to_video", "Starting video from script");

        self.store.begin(job_id).await?;
        let image_client = WorkersAiImageClient::new(&self.genai)?;
        let tts = TranslateTtsClient::new(&self.genai)?;
        self.workspace.create_job_dir(job_id.as_str()).await?;

        self.store
            .set_stage(job_id, 5, "Splitting script into scenes")
            .await?;
        let scenes = self.plan_scenes(script)?;
        self.store.set_total(job_id, scenes.len() as u32).await?;

        let stills = self
            .generate_scene_stills(job_id, &image_client, &scenes, style, aspect, 5, 70)
            .await?;

        self.store
            .set_stage(job_id, 70, "Synthesizing narration")
            .await?;
        let started = Instant::now();
        let speech = tts.synthesize(script).await?;
        record_generation("translate_tts", started.elapsed().as_secs_f64());

        let narration = self
            .workspace
            .narration_path(job_id.as_str(), "narration.mp3");
        tokio::fs::write(&narration, &speech).await?;
        self.store
            .set_stage(job_id, 80, "Timing scenes to narration")
            .await?;

        let narration_secs = media_duration(&narration).await?;
        let durations = scene_durations(&scenes, Some(narration_secs));

        self.render_video(job_id, stills, &durations, &narration)
            .await
    }

    /// Turn uploaded narration into video: transcript, scenes, stills, render.
    async fn run_voice_to_video(
        &self,
        job_id: &JobId,
        audio: &[u8],
        file_name: &str,
        style: &str,
        aspect: AspectRatio,
    ) -> RunnerResult<()> {
        info!(job_id = %job_id, kind = "voice_to_video", "Starting video from narration");

        self.store.begin(job_id).await?;
        let whisper = WorkersAiWhisperClient::new(&self.genai)?;
        let image_client = WorkersAiImageClient::new(&self.genai)?;
        self.workspace.create_job_dir(job_id.as_str()).await?;

        let narration = self.workspace.narration_path(job_id.as_str(), file_name);
        tokio::fs::write(&narration, audio).await?;

        self.store
            .set_stage(job_id, 5, "Transcribing narration")
            .await?;
        let started = Instant::now();
        let transcript = whisper.transcribe(audio).await?;
        record_generation("workers_ai_whisper", started.elapsed().as_secs_f64());

        self.store
            .set_stage(job_id, 15, "Planning scenes from transcript")
            .await?;
        let scenes = self.plan_scenes(&transcript)?;
        self.store.set_total(job_id, scenes.len() as u32).await?;

        let stills = self
            .generate_scene_stills(job_id, &image_client, &scenes, style, aspect, 15, 70)
            .await?;

        self.store
            .set_stage(job_id, 70, "Timing scenes to narration")
            .await?;
        let narration_secs = media_duration(&narration).await?;
        let durations = scene_durations(&scenes, Some(narration_secs));

        self.render_video(job_id, stills, &durations, &narration)
            .await
    }

    fn plan_scenes(&self, script: &str) -> RunnerResult<Vec<String>> {
        let mut scenes = split_script(script);
        scenes.truncate(self.config.max_scenes);
        if scenes.is_empty() {
            return Err(MediaError::NoScenes.into());
        }
        Ok(scenes)
    }

    /// Generate one still per scene, mapping item progress onto the
    /// percentage window `from_percent..=to_percent`.
    async fn generate_scene_stills(
        &self,
        job_id: &JobId,
        client: &WorkersAiImageClient,
        scenes: &[String],
        style: &str,
        aspect: AspectRatio,
        from_percent: u8,
        to_percent: u8,
    ) -> RunnerResult<Vec<PathBuf>> {
        let total = scenes.len() as u32;
        let span = u32::from(to_percent - from_percent);

        let mut stills = Vec::with_capacity(scenes.len());
        for (i, scene) in scenes.iter().enumerate() {
            let position = i as u32 + 1;
            let task = format!("Generating scene {position}/{total}");
            let before = from_percent + (span * i as u32 / total) as u8;
            self.store.set_stage(job_id, before, task.clone()).await?;

            let started = Instant::now();
            let image = client
                .generate(&enhance_prompt(scene, style), aspect)
                .await?;
            record_generation("workers_ai_image", started.elapsed().as_secs_f64());

            let path = self.workspace.image_path(job_id.as_str(), position as usize);
            tokio::fs::write(&path, &image).await?;
            stills.push(path);

            let after = from_percent + (span * position / total) as u8;
            self.store.set_stage(job_id, after, task).await?;

            if position < total {
                sleep(Duration::from_millis(self.config.item_delay_ms)).await;
            }
        }

        Ok(stills)
    }

    /// Render stills plus narration into the final mp4 and complete the job.
    async fn render_video(
        &self,
        job_id: &JobId,
        stills: Vec<PathBuf>,
        durations: &[f64],
        narration: &Path,
    ) -> RunnerResult<()> {
        self.store.set_stage(job_id, 80, "Rendering video").await?;

        let frames: Vec<SlideshowFrame> = stills
            .into_iter()
            .zip(durations.iter())
            .map(|(image, &duration_secs)| SlideshowFrame {
                image,
                duration_secs,
            })
            .collect();

        let tmp = self.workspace.job_dir(job_id.as_str()).join("partial.mp4");
        render_slideshow(&frames, Some(narration), &tmp, &self.config.render_config()).await?;

        let artifact = self.workspace.video_path(job_id.as_str());
        move_file(&tmp, &artifact).await?;
        self.store.set_stage(job_id, 99, "Finalizing video").await?;
        self.store.complete(job_id, artifact.clone()).await?;

        info!(job_id = %job_id, "Video rendered: {}", artifact.display());
        Ok(())
    }
}

/// The original API appended the style to every prompt this way.
fn enhance_prompt(prompt: &str, style: &str) -> String {
    format!("{prompt}, {style} style")
}

#[cfg(test)]
mod tests {
    use super::*;

    use preel_media::zip_entry_count;
    use preel_models::{Job, JobState};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64 of b"fakepng"
    const FAKE_PNG_B64: &str = "ZmFrZXBuZw==";

    fn test_config(data_dir: &Path) -> StudioConfig {
        StudioConfig {
            data_dir: data_dir.to_path_buf(),
            item_delay_ms: 0,
            ..StudioConfig::default()
        }
    }

    fn test_genai(server: &MockServer) -> GenAiConfig {
        GenAiConfig {
            gemini_api_key: "test-key".to_string(),
            gemini_base_url: server.uri(),
            cf_account_id: "acct".to_string(),
            cf_api_token: "token".to_string(),
            cf_base_url: server.uri(),
            tts_base_url: server.uri(),
            ..GenAiConfig::default()
        }
    }

    async fn wait_terminal(store: &JobStore, id: &JobId) -> Job {
        for _ in 0..250 {
            if let Some(job) = store.get(id).await {
                if job.state.is_terminal() {
                    return job;
                }
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("job never reached a terminal state");
    }

    #[tokio::test]
    async fn test_images_pipeline_completes_with_zip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/imagen-3.0-generate-002:predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"bytesBase64Encoded": FAKE_PNG_B64}]
            })))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), test_genai(&server), test_config(dir.path()));

        let job = Job::new(JobKind::Images, 3);
        let job_id = store.insert(job).await;

        let prompts = vec![
            "a sunset".to_string(),
            "a forest".to_string(),
            "a city".to_string(),
        ];
        runner.spawn_images(
            job_id.clone(),
            prompts,
            "photorealistic".to_string(),
            AspectRatio::SQUARE,
        );

        let job = wait_terminal(&store, &job_id).await;
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);

        let artifact = job.artifact.unwrap();
        assert!(artifact.ends_with("images.zip"));
        assert_eq!(zip_entry_count(&artifact).unwrap(), 3);

        let first = dir.path().join(job_id.as_str()).join("image_001.png");
        assert_eq!(std::fs::read(first).unwrap(), b"fakepng");
    }

    #[tokio::test]
    async fn test_images_pipeline_stops_at_first_failure() {
        let server = MockServer::start().await;
        // First prompt succeeds, the second hits a server error.
        Mock::given(method("POST"))
            .and(path("/v1beta/models/imagen-3.0-generate-002:predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"bytesBase64Encoded": FAKE_PNG_B64}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/imagen-3.0-generate-002:predict"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), test_genai(&server), test_config(dir.path()));

        let job = Job::new(JobKind::Images, 3);
        let job_id = store.insert(job).await;

        runner.spawn_images(
            job_id.clone(),
            vec!["one".to_string(), "two".to_string(), "three".to_string()],
            "photorealistic".to_string(),
            AspectRatio::SQUARE,
        );

        let job = wait_terminal(&store, &job_id).await;
        assert_eq!(job.state, JobState::Failed);
        assert!(job.error_message.is_some());
        assert!(job.artifact.is_none());

        // The first still remains on disk, nothing later was attempted.
        let job_dir = dir.path().join(job_id.as_str());
        assert!(job_dir.join("image_001.png").exists());
        assert!(!job_dir.join("image_002.png").exists());
        assert!(!job_dir.join("images.zip").exists());
    }

    #[tokio::test]
    async fn test_text_pipeline_rejects_scriptless_input() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), test_genai(&server), test_config(dir.path()));

        let job = Job::new(JobKind::TextToVideo, 0);
        let job_id = store.insert(job).await;

        let err = runner
            .run_text_to_video(&job_id, "Too short.", "cinematic", AspectRatio::LANDSCAPE)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No usable scenes found in script");
    }

    #[tokio::test]
    async fn test_voice_pipeline_fails_on_empty_transcript() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/client/v4/accounts/acct/ai/run/@cf/openai/whisper"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"text": "Too short."}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), test_genai(&server), test_config(dir.path()));

        let job = Job::new(JobKind::VoiceToVideo, 0);
        let job_id = store.insert(job).await;

        runner.spawn_voice_to_video(
            job_id.clone(),
            b"RIFFfakewav".to_vec(),
            "talk.wav".to_string(),
            "cinematic".to_string(),
            AspectRatio::LANDSCAPE,
        );

        let job = wait_terminal(&store, &job_id).await;
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(
            job.error_message.as_deref(),
            Some("No usable scenes found in script")
        );

        // The upload was persisted before transcription.
        let narration = dir.path().join(job_id.as_str()).join("narration.wav");
        assert_eq!(std::fs::read(narration).unwrap(), b"RIFFfakewav");
    }

    #[tokio::test]
    async fn test_scene_progress_maps_into_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/client/v4/accounts/acct/ai/run/@cf/stabilityai/stable-diffusion-xl-base-1.0",
            ))
            .and(body_partial_json(json!({"width": 1024, "height": 576})))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(b"sdxlpng".to_vec()),
            )
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), test_genai(&server), test_config(dir.path()));

        let job = Job::new(JobKind::TextToVideo, 0);
        let job_id = store.insert(job).await;
        store.begin(&job_id).await.unwrap();
        runner
            .workspace
            .create_job_dir(job_id.as_str())
            .await
            .unwrap();

        let client = WorkersAiImageClient::new(&runner.genai).unwrap();
        let scenes = vec![
            "The sun rises over the quiet harbor town.".to_string(),
            "Fishing boats drift across silver water.".to_string(),
        ];
        let stills = runner
            .generate_scene_stills(
                &job_id,
                &client,
                &scenes,
                "cinematic",
                AspectRatio::LANDSCAPE,
                5,
                70,
            )
            .await
            .unwrap();

        assert_eq!(stills.len(), 2);
        let job = store.get(&job_id).await.unwrap();
        // 5 + 65 * 2/2 lands exactly on the window end.
        assert_eq!(job.progress, 70);
        assert_eq!(job.current_task, "Generating scene 2/2");
    }

    #[test]
    fn test_enhance_prompt_appends_style() {
        assert_eq!(
            enhance_prompt("a red barn", "photorealistic"),
            "a red barn, photorealistic style"
        );
    }
}
