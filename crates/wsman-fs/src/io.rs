//! Atomic I/O operations with file locking, plus the directory and symlink
//! helpers used when checkouts are garbage collected.

use std::fs::{self, OpenOptions};
use std::io::Write;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial file.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file in the same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;

    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Create a directory and all of its parents.
pub fn ensure_dir(path: &NormalizedPath) -> Result<()> {
    let native_path = path.to_native();
    fs::create_dir_all(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// List the entry names of a directory, sorted. A missing directory is empty.
pub fn list_dir_names(path: &NormalizedPath) -> Result<Vec<String>> {
    let native_path = path.to_native();
    let entries = match fs::read_dir(&native_path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(&native_path, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&native_path, e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Remove a file, a symlink or a whole directory tree.
///
/// Symlinks are removed themselves, never followed.
pub fn remove_path(path: &NormalizedPath) -> Result<()> {
    let native_path = path.to_native();
    let metadata = match fs::symlink_metadata(&native_path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(&native_path, e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(&native_path)
    } else {
        fs::remove_file(&native_path)
    };
    result.map_err(|e| Error::io(&native_path, e))
}

/// Point `link` at `target`, replacing whatever `link` was before.
pub fn replace_symlink(target: &NormalizedPath, link: &NormalizedPath) -> Result<()> {
    if let Some(parent) = link.parent() {
        ensure_dir(&parent)?;
    }
    if let Ok(current) = fs::read_link(link.to_native())
        && NormalizedPath::new(current) == *target
    {
        return Ok(());
    }
    remove_path(link)?;

    let native_link = link.to_native();
    symlink_dir(&target.to_native(), &native_link).map_err(|e| Error::io(&native_link, e))
}

/// Resolve the target of a symlink, if `link` is one.
pub fn read_symlink(link: &NormalizedPath) -> Option<NormalizedPath> {
    fs::read_link(link.to_native()).ok().map(NormalizedPath::new)
}

#[cfg(unix)]
fn symlink_dir(target: &std::path::Path, link: &std::path::Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &std::path::Path, link: &std::path::Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Canonicalize an existing path without the `\\?\` prefix on Windows.
pub fn canonicalize(path: &NormalizedPath) -> Result<NormalizedPath> {
    let native_path = path.to_native();
    dunce::canonicalize(&native_path)
        .map(NormalizedPath::new)
        .map_err(|e| Error::io(&native_path, e))
}
