//! Full-tree zip snapshot of a site directory.
//!
//! Packages a local directory into a single in-memory zip buffer suitable
//! as an HTTP request body. One-shot and unfiltered: every file and
//! directory under the source is included, with relative paths normalized
//! to forward slashes.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Errors produced while building an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("source directory missing or unreadable: {0}")]
    SourceUnavailable(PathBuf),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Builds an in-memory zip archive of the full contents of `source`.
///
/// Entry names are relative to `source` with `/` separators (even on
/// Windows). Fails with [`ArchiveError::SourceUnavailable`] before
/// producing any bytes if `source` is not a readable directory; the
/// caller must not proceed to upload after that.
pub fn archive_dir(source: &Path) -> Result<Vec<u8>, ArchiveError> {
    if !source.is_dir() {
        return Err(ArchiveError::SourceUnavailable(source.to_path_buf()));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = WalkDir::new(source).into_iter();

    while let Some(entry) = entries.next().transpose()? {
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let name = rel.to_string_lossy().replace('\\', "/");
        if name.is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            writer.add_directory(name, FileOptions::default())?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, FileOptions::default())?;
            io::copy(&mut File::open(entry.path())?, &mut writer)?;
        }
    }

    let buffer = writer.finish()?.into_inner();
    debug!(source = %source.display(), bytes = buffer.len(), "archive built");
    Ok(buffer)
}
