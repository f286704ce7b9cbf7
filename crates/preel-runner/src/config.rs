//! Pipeline configuration.

use std::path::PathBuf;

use preel_media::RenderConfig;

/// Settings shared by the job pipelines and the HTTP layer.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Root directory for job workdirs and artifacts
    pub data_dir: PathBuf,
    /// Seconds a finished job stays queryable before eviction
    pub job_ttl_secs: u64,
    /// Pause between generation calls in milliseconds
    pub item_delay_ms: u64,
    /// Rendered video width
    pub video_width: u32,
    /// Rendered video height
    pub video_height: u32,
    /// Rendered video frame rate
    pub video_fps: u32,
    /// Upper bound on scenes per video
    pub max_scenes: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            job_ttl_secs: 3600,
            item_delay_ms: 1000,
            video_width: 1920,
            video_height: 1080,
            video_fps: 24,
            max_scenes: preel_media::MAX_SCENES,
        }
    }
}

impl StudioConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            job_ttl_secs: env_parse("JOB_TTL_SECS", defaults.job_ttl_secs),
            item_delay_ms: env_parse("ITEM_DELAY_MS", defaults.item_delay_ms),
            video_width: env_parse("VIDEO_WIDTH", defaults.video_width),
            video_height: env_parse("VIDEO_HEIGHT", defaults.video_height),
            video_fps: env_parse("VIDEO_FPS", defaults.video_fps),
            max_scenes: env_parse("MAX_SCENES", defaults.max_scenes),
        }
    }

    /// Geometry for rendered videos.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            width: self.video_width,
            height: self.video_height,
            fps: self.video_fps,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
