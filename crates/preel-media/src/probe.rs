//! Media inspection via ffprobe.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Duration in seconds of an audio or video file.
///
/// # Errors
///
/// Returns `FileNotFound` when the path does not exist, `FfprobeNotFound`
/// when the binary is missing, and `FfmpegFailed` when ffprobe exits with
/// an error or reports no duration.
pub async fn media_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    check_ffprobe()?;

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(MediaError::ffmpeg_failed(
            format!("ffprobe failed for {}", path.display()),
            Some(stderr),
            output.status.code(),
        ));
    }

    let duration = parse_duration(&output.stdout)?;
    debug!("Probed {}: {:.3}s", path.display(), duration);
    Ok(duration)
}

fn parse_duration(stdout: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::ffmpeg_failed("ffprobe reported no duration", None, None))
}
