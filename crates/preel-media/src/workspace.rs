//! Per-job working directories and artifact placement.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Lays out per-job directories under a jobs root.
///
/// Each job gets `{root}/{job_id}/` holding its generated stills, narration
/// audio, and the final artifact.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    root: PathBuf,
}

impl JobWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything for one job.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join(job_id)
    }

    /// Create the job directory, including parents.
    pub async fn create_job_dir(&self, job_id: &str) -> MediaResult<PathBuf> {
        let dir = self.job_dir(job_id);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Path for the still at 1-based `position`, named `image_001.png`
    /// onward.
    pub fn image_path(&self, job_id: &str, position: usize) -> PathBuf {
        self.job_dir(job_id).join(format!("image_{position:03}.png"))
    }

    /// Path for the zip of generated stills.
    pub fn zip_path(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id).join("images.zip")
    }

    /// Path for the rendered video.
    pub fn video_path(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id).join("video.mp4")
    }

    /// Path for narration audio, keeping the extension of `source_name`.
    pub fn narration_path(&self, job_id: &str, source_name: &str) -> PathBuf {
        let ext = Path::new(source_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav");
        self.job_dir(job_id).join(format!("narration.{ext}"))
    }
}

/// Move a file, falling back to copy-and-delete across filesystems.
///
/// The fallback copies to a temporary file next to `dst` first so the final
/// rename is atomic on the destination filesystem.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(
                "Cross-device rename, copying instead: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

// EXDEV is error code 18 on Linux and macOS.
fn is_cross_device(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp_dst = dst.with_extension("tmp");

    fs::copy(src, &tmp_dst).await?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = std::fs::remove_file(&tmp_dst);
        return Err(MediaError::from(e));
    }

    if let Err(e) = fs::remove_file(src).await {
        warn!(
            "Failed to remove source after cross-device move: {}: {}",
            src.display(),
            e
        );
    }

    Ok(())
}
