//! Export the virtual file map onto the real filesystem.
//!
//! Map keys are absolute-looking (`/src/app.js`); on disk they become
//! paths relative to the chosen output directory. A non-empty target is
//! refused unless forced, and keys that would climb out of the target
//! are rejected outright. Each file is written atomically.

use std::{
    fs::{self, File},
    path::{Component, Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::core::workspace::FileMap;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("output directory {0} is not empty (use --force to write into it)")]
    DirNotEmpty(PathBuf),
    #[error("path {0:?} escapes the output directory")]
    PathEscape(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write every file under `out_dir`, returning written paths in map order.
#[instrument(skip_all, fields(count = files.len(), out = %out_dir.display()))]
pub fn export_files(
    files: &FileMap,
    out_dir: &Path,
    force: bool,
) -> Result<Vec<PathBuf>, ExportError> {
    if !force && dir_has_entries(out_dir)? {
        return Err(ExportError::DirNotEmpty(out_dir.to_path_buf()));
    }
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(files.len());
    for (key, content) in files {
        let rel = sanitize_key(key)?;
        let target = out_dir.join(&rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&target, content.text().as_bytes())?;
        debug!(path = %target.display(), "exported");
        written.push(target);
    }
    Ok(written)
}

fn dir_has_entries(dir: &Path) -> Result<bool, ExportError> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Strip the leading slash and reject anything non-relative:
/// `..`, a second root, or drive prefixes all refuse the export.
fn sanitize_key(key: &str) -> Result<PathBuf, ExportError> {
    let rel = key.trim_start_matches('/');
    let mut out = PathBuf::new();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExportError::PathEscape(key.to_string()));
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(ExportError::PathEscape(key.to_string()));
    }
    Ok(out)
}

/// Atomic write with robust temp file strategy
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ExportError> {
    // Prefer same-dir tempfile; fall back to OS temp on EPERM/ENOENT
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    // Preserve original permissions
    #[cfg(unix)]
    let perms = fs::metadata(path)
        .map(|m| m.permissions())
        .unwrap_or_else(|_| std::os::unix::fs::PermissionsExt::from_mode(0o644));
    #[cfg(not(unix))]
    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let tmp = match tempfile::NamedTempFile::new_in(dir) {
        Ok(t) => t,
        Err(_) => tempfile::NamedTempFile::new()?, // fallback to /tmp
    };

    // Write the content fully
    use std::io::Write;
    let mut file = tmp.as_file();
    file.set_len(0)?;
    file.write_all(data)?;
    file.sync_all()?;

    // Apply permissions to the temp file (best effort)
    #[cfg(unix)]
    fs::set_permissions(tmp.path(), perms)?;
    #[cfg(not(unix))]
    if let Some(perms) = perms {
        fs::set_permissions(tmp.path(), perms)?;
    }

    // fsync parent dir to ensure durability on Unix
    #[cfg(unix)]
    {
        if let Ok(parent_file) = File::open(dir) {
            let _ = parent_file.sync_all();
        }
    }

    // Atomically replace the destination
    match tmp.persist(path) {
        Ok(_) => {}
        Err(e) => {
            // Different filesystem? Try copy fallback
            fs::copy(e.file.path(), path)?;
        }
    }

    Ok(())
}
