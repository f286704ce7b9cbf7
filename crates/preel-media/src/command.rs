//! Type-safe FFmpeg command building and execution.
//!
//! Commands are built declaratively and run through [`FfmpegRunner`], which
//! captures stderr for diagnostics and enforces a timeout by killing the
//! child process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default timeout for FFmpeg operations.
const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Number of trailing stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 40;

/// Check that the ffmpeg binary is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check that the ffprobe binary is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

/// A declarative FFmpeg invocation.
///
/// Arguments are emitted in the order FFmpeg expects: global flags, one
/// `-i` per input (each preceded by its own input flags), the filter graph,
/// stream maps, output flags, and finally the output path.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    output: PathBuf,
    filter_complex: Option<String>,
    maps: Vec<String>,
    output_args: Vec<String>,
}

#[derive(Debug, Clone)]
struct Input {
    args: Vec<String>,
    path: PathBuf,
}

impl FfmpegCommand {
    /// Create a command writing to `output`.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.into(),
            filter_complex: None,
            maps: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Add an input file.
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(Input {
            args: Vec::new(),
            path: path.into(),
        });
        self
    }

    /// Add an input file preceded by input-specific flags.
    pub fn input_with_args<I, S>(mut self, path: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(Input {
            args: args.into_iter().map(Into::into).collect(),
            path: path.into(),
        });
        self
    }

    /// Set the `-filter_complex` graph.
    pub fn filter_complex(mut self, graph: impl Into<String>) -> Self {
        self.filter_complex = Some(graph.into());
        self
    }

    /// Add a `-map` for an output stream.
    pub fn map(mut self, stream: impl Into<String>) -> Self {
        self.maps.push(stream.into());
        self
    }

    /// Append raw output flags.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path the command writes to.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the full argument list.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-v".to_string(), "error".to_string()];

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().into_owned());
        }

        if let Some(graph) = &self.filter_complex {
            args.push("-filter_complex".to_string());
            args.push(graph.clone());
        }

        for stream in &self.maps {
            args.push("-map".to_string());
            args.push(stream.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());

        args
    }
}

/// Runs FFmpeg commands with a timeout.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    timeout: Duration,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a runner with the default timeout.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the command to completion.
    ///
    /// Kills the child and returns `Timeout` when the deadline passes.
    /// A non-zero exit status becomes `FfmpegFailed` carrying the tail of
    /// stderr and the exit code.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child.stderr.take().ok_or_else(|| {
            MediaError::internal("failed to capture ffmpeg stderr")
        })?;

        let tail_task = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    "ffmpeg exceeded {}s timeout, killing process",
                    self.timeout.as_secs()
                );
                let _ = child.kill().await;
                return Err(MediaError::Timeout(self.timeout.as_secs()));
            }
        };

        let tail = tail_task.await.unwrap_or_default();

        if !status.success() {
            let stderr_text = if tail.is_empty() {
                None
            } else {
                Some(tail.join("\n"))
            };
            return Err(MediaError::ffmpeg_failed(
                format!("writing {}", cmd.output_path().display()),
                stderr_text,
                status.code(),
            ));
        }

        Ok(())
    }
}
