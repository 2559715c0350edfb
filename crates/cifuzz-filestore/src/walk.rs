//! Directory traversal utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Resolve `dir` to an absolute path without following symlinks.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn absolute_dir(dir: &Path) -> io::Result<PathBuf> {
    std::path::absolute(dir)
}

/// Collect every regular file below `root`, recursively.
///
/// Paths are returned absolute (rooted at `root`) and sorted. Symlinks to
/// files are listed under their link path and read through the link;
/// symlinked directories are not descended into.
///
/// # Errors
///
/// Returns an error if `root` does not exist or any entry cannot be read.
pub fn collect_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let file_type = entry.file_type();
        let is_file = if file_type.is_symlink() {
            fs::metadata(entry.path())?.is_file()
        } else {
            file_type.is_file()
        };
        if is_file {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Express `path` relative to `root` as a `/`-separated item path.
///
/// Returns `None` if `path` is not below `root`.
pub fn item_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
