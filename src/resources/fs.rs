//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::io;
use std::path::{Path, PathBuf};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Remove an existing file or symlink at `path`, including broken symlinks.
///
/// Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_existing(path: &Path) -> Result<()> {
    if path.exists() || path.symlink_metadata().is_ok() {
        std::fs::remove_file(path)
            .with_context(|| format!("remove existing: {}", path.display()))?;
    }
    Ok(())
}

/// Replace the contents of `path` without ever leaving a half-written file.
///
/// The data goes to a sibling temporary file that is then renamed over the
/// target. A symlinked target is resolved first so the link itself survives.
///
/// # Errors
///
/// Returns the underlying I/O error if the temporary file cannot be written
/// or renamed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let target = resolve_link(path);
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let file_name = target
        .file_name()
        .map_or_else(|| "file".into(), |n| n.to_string_lossy());
    let tmp = parent.join(format!(".{file_name}.omd-tmp-{}", std::process::id()));
    if let Err(e) = std::fs::write(&tmp, contents) {
        std::fs::remove_file(&tmp).ok();
        return Err(e);
    }
    std::fs::rename(&tmp, &target).inspect_err(|_| {
        std::fs::remove_file(&tmp).ok();
    })
}

fn resolve_link(path: &Path) -> PathBuf {
    let is_link = path
        .symlink_metadata()
        .is_ok_and(|m| m.file_type().is_symlink());
    if is_link && let Ok(resolved) = dunce::canonicalize(path) {
        return resolved;
    }
    path.to_path_buf()
}
