//! Slideshow rendering from generated stills.
//!
//! Each still becomes a clip with a Ken Burns style motion effect, clips are
//! joined with fade transitions, and an optional narration track is muxed in.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Total fade time between consecutive clips, split across the outgoing
/// and incoming clip.
const FADE_SECS: f64 = 0.5;

/// Floor for the render timeout in seconds.
const MIN_RENDER_TIMEOUT_SECS: u64 = 600;

/// Output geometry for rendered video.
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 24,
        }
    }
}

/// An ordered still with its screen time.
#[derive(Debug, Clone)]
pub struct SlideshowFrame {
    pub image: PathBuf,
    pub duration_secs: f64,
}

/// Motion effect applied to a still.
///
/// Effects cycle in a fixed order so consecutive scenes never repeat
/// the same movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    ZoomIn,
    ZoomOut,
    PanRight,
    PanLeft,
}

impl Motion {
    /// Effect for the still at `index`.
    pub fn for_index(index: usize) -> Self {
        match index % 4 {
            0 => Self::ZoomIn,
            1 => Self::ZoomOut,
            2 => Self::PanRight,
            _ => Self::PanLeft,
        }
    }

    fn zoom_expr(self, ticks: u32) -> String {
        match self {
            Self::ZoomIn => format!("1+0.1*on/{ticks}"),
            Self::ZoomOut => format!("1.2-0.1*on/{ticks}"),
            Self::PanRight | Self::PanLeft => "1.1".to_string(),
        }
    }

    fn x_expr(self, ticks: u32) -> String {
        match self {
            Self::ZoomIn | Self::ZoomOut => "iw/2-(iw/zoom/2)".to_string(),
            Self::PanRight => format!("(iw-iw/zoom)*on/{ticks}"),
            Self::PanLeft => format!("(iw-iw/zoom)*(1-on/{ticks})"),
        }
    }

    fn y_expr(self) -> &'static str {
        "ih/2-(ih/zoom/2)"
    }
}

/// Render ordered stills into an mp4.
///
/// Stills are scaled and cropped to the output geometry, animated with a
/// cycling motion effect, joined with fade transitions, and encoded with
/// libx264. When `narration` is given it is muxed as an AAC track and the
/// output is cut to the shorter stream.
pub async fn render_slideshow(
    frames: &[SlideshowFrame],
    narration: Option<&Path>,
    output: &Path,
    config: &RenderConfig,
) -> MediaResult<()> {
    for frame in frames {
        if !frame.image.exists() {
            return Err(MediaError::FileNotFound(frame.image.clone()));
        }
    }
    if let Some(audio) = narration {
        if !audio.exists() {
            return Err(MediaError::FileNotFound(audio.to_path_buf()));
        }
    }

    let total_secs: f64 = frames.iter().map(|f| f.duration_secs).sum();
    let cmd = build_command(frames, narration, output, config)?;

    info!(
        "Rendering slideshow: {} stills, {:.1}s total, narration: {} -> {}",
        frames.len(),
        total_secs,
        narration.is_some(),
        output.display()
    );

    FfmpegRunner::new()
        .with_timeout(render_timeout(total_secs))
        .run(&cmd)
        .await
}

/// Timeout scaled to the output length, floored at ten minutes.
fn render_timeout(total_secs: f64) -> Duration {
    Duration::from_secs(((total_secs * 10.0) as u64).max(MIN_RENDER_TIMEOUT_SECS))
}

fn build_command(
    frames: &[SlideshowFrame],
    narration: Option<&Path>,
    output: &Path,
    config: &RenderConfig,
) -> MediaResult<FfmpegCommand> {
    if frames.is_empty() {
        return Err(MediaError::internal("slideshow requires at least one still"));
    }

    let mut cmd = FfmpegCommand::new(output);
    for frame in frames {
        cmd = cmd.input(&frame.image);
    }
    if let Some(audio) = narration {
        cmd = cmd.input(audio);
    }

    let fps = config.fps.to_string();
    cmd = cmd
        .filter_complex(build_graph(frames, config))
        .map("[vout]")
        .output_args(["-c:v", "libx264", "-r", fps.as_str()]);

    if narration.is_some() {
        cmd = cmd
            .map(format!("{}:a", frames.len()))
            .output_args(["-c:a", "aac", "-shortest"]);
    }

    Ok(cmd)
}

fn build_graph(frames: &[SlideshowFrame], config: &RenderConfig) -> String {
    let (w, h, fps) = (config.width, config.height, config.fps);
    let half_fade = FADE_SECS / 2.0;
    let last = frames.len() - 1;

    let mut chains: Vec<String> = Vec::with_capacity(frames.len() + 1);
    for (i, frame) in frames.iter().enumerate() {
        let motion = Motion::for_index(i);
        let ticks = (frame.duration_secs * f64::from(fps)).round().max(1.0) as u32;

        let mut chain = format!(
            "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},\
             zoompan=z='{z}':x='{x}':y='{y}':d={ticks}:s={w}x{h}:fps={fps},format=yuv420p",
            z = motion.zoom_expr(ticks),
            x = motion.x_expr(ticks),
            y = motion.y_expr(),
        );

        // Fades shorter than the clip itself only.
        if frame.duration_secs > FADE_SECS {
            if i > 0 {
                chain.push_str(&format!(",fade=t=in:st=0:d={half_fade}"));
            }
            if i < last {
                let start = frame.duration_secs - half_fade;
                chain.push_str(&format!(",fade=t=out:st={start:.3}:d={half_fade}"));
            }
        }

        chain.push_str(&format!("[v{i}]"));
        chains.push(chain);
    }

    let labels: String = (0..frames.len()).map(|i| format!("[v{i}]")).collect();
    chains.push(format!("{labels}concat=n={}:v=1:a=0[vout]", frames.len()));
    chains.join(";")
}
