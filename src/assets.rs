//! Verbatim copy of the project's assets directory into the output.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Recursively copy `src` into `dest`, preserving file and directory modes.
///
/// Existing files in `dest` are overwritten. Returns the number of files
/// copied. A missing `src` copies nothing.
pub fn copy_dir(src: &Path, dest: &Path) -> io::Result<usize> {
    if !src.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = dest.join(rel);
        let permissions = entry.metadata().map_err(io::Error::from)?.permissions();

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            fs::set_permissions(&target, permissions)?;
        } else if entry.file_type().is_file() {
            // fs::copy carries the mode over on Unix; set it again for other platforms.
            fs::copy(entry.path(), &target)?;
            fs::set_permissions(&target, permissions)?;
            copied += 1;
        }
    }
    Ok(copied)
}
