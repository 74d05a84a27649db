//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file with locking.
///
/// Content goes to a temp file in the same directory, is synced, and is then
/// renamed over the target so readers never observe a partial write.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

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

    temp_file
        .lock_exclusive()
        .map_err(|source| Error::LockFailed {
            path: native_path.clone(),
            source,
        })?;

    let written = temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all())
        .map_err(|e| Error::io(&temp_path, e));

    // Lock is released on drop as well; unlock failure is not fatal here.
    let _ = temp_file.unlock();
    drop(temp_file);

    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;
    tracing::debug!(path = %path, bytes = content.len(), "atomic write complete");
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// List the names of the immediate sub-directories of `path`, sorted.
///
/// A missing directory yields an empty list. Hidden entries (leading `.`)
/// and entries whose names are not valid UTF-8 are skipped.
pub fn list_subdirectories(path: &NormalizedPath) -> Result<Vec<String>> {
    let native_path = path.to_native();
    let entries = match fs::read_dir(&native_path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(&native_path, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&native_path, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| Error::io(entry.path(), e))?
            .is_dir();
        if !is_dir {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if !name.starts_with('.') => names.push(name),
            Ok(_) => {}
            Err(raw) => {
                tracing::warn!("Skipping directory with non-UTF-8 name: {:?}", raw);
            }
        }
    }
    names.sort();
    Ok(names)
}
