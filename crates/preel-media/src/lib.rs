//! Media toolkit for prompt-to-video assembly.
//!
//! This crate provides:
//! - Prompt extraction from uploaded CSV files
//! - Script scene planning with per-scene durations
//! - Zip packaging of generated stills
//! - Type-safe FFmpeg command building with timeouts
//! - ffprobe duration lookup
//! - Ken Burns style slideshow rendering with optional narration

pub mod archive;
pub mod command;
pub mod error;
pub mod probe;
pub mod prompts;
pub mod scenes;
pub mod slideshow;
pub mod workspace;

pub use archive::{build_zip, zip_entry_count};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::media_duration;
pub use prompts::parse_prompts;
pub use scenes::{scene_durations, split_script, MAX_SCENES};
pub use slideshow::{render_slideshow, Motion, RenderConfig, SlideshowFrame};
pub use workspace::{move_file, JobWorkspace};
