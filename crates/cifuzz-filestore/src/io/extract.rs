//! Zip archive extraction.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

/// Errors raised while unpacking an archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Writing the extracted files failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive is corrupt or unreadable.
    #[error("Archive error: {0}")]
    Archive(String),
}

/// Extract a zip archive read from `reader` into `dest_dir`.
///
/// `dest_dir` is created if missing. Entries whose names would escape
/// `dest_dir` are skipped. Returns the extracted file paths relative to
/// `dest_dir`.
///
/// # Errors
///
/// Returns an error if the archive cannot be parsed or a file cannot be
/// written.
pub fn extract_zip<R: Read + Seek>(
    reader: R,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, ExtractError> {
    let mut archive = ZipArchive::new(reader).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;

        // Sanitize path to prevent Zip Slip
        let Some(relative_path) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };

        let absolute_path = dest_dir.join(&relative_path);

        if entry.is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }

        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&absolute_path)?;
        io::copy(&mut entry, &mut out)?;

        // Owner keeps read/write so re-downloads can overwrite.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let mode = (mode & 0o777) | 0o600;
                fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
            }
        }

        extracted.push(relative_path);
    }

    Ok(extracted)
}
