//! Zip packaging for generated stills.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{MediaError, MediaResult};

/// Bundle files into a deflate-compressed zip at `output`.
///
/// Each file is stored under its bare file name, in the order given.
/// The work runs on the blocking pool.
pub async fn build_zip(files: Vec<PathBuf>, output: PathBuf) -> MediaResult<()> {
    tokio::task::spawn_blocking(move || write_zip(&files, &output))
        .await
        .map_err(|e| MediaError::internal(format!("zip task panicked: {e}")))?
}

fn write_zip(files: &[PathBuf], output: &Path) -> MediaResult<()> {
    let mut zip = ZipWriter::new(File::create(output)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            MediaError::internal(format!("unusable file name: {}", path.display()))
        })?;

        let mut contents = Vec::new();
        File::open(path)
            .map_err(|_| MediaError::FileNotFound(path.clone()))?
            .read_to_end(&mut contents)?;

        zip.start_file(name, options)?;
        zip.write_all(&contents)?;
    }

    zip.finish()?;
    info!("Packaged {} files into {}", files.len(), output.display());
    Ok(())
}

/// Number of entries in a zip archive.
pub fn zip_entry_count(path: impl AsRef<Path>) -> MediaResult<usize> {
    let archive = ZipArchive::new(File::open(path.as_ref())?)?;
    Ok(archive.len())
}
