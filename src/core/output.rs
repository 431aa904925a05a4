//! core::output
//!
//! Writing the generated changelog to disk.
//!
//! # Design
//!
//! The document is written to a temporary file next to the target and
//! renamed into place, so a failed run never leaves a truncated changelog.
//! With overwriting disabled an existing target is renamed around: a
//! trailing number in the file stem is incremented, otherwise `_1` is
//! appended, until a free name is found.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from writing output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write changelog '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The path a changelog would be written to.
pub fn target_path(path: &Path, overwrite: bool) -> PathBuf {
    if overwrite {
        path.to_path_buf()
    } else {
        next_free_path(path)
    }
}

/// First non-existing path derived from `path`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tagscribe::core::output::next_free_path;
///
/// // With CHANGELOG.md present this yields CHANGELOG_1.md, then CHANGELOG_2.md.
/// let free = next_free_path(Path::new("CHANGELOG.md"));
/// ```
pub fn next_free_path(path: &Path) -> PathBuf {
    let mut candidate = path.to_path_buf();
    while candidate.exists() {
        candidate = bump(&candidate);
    }
    candidate
}

/// Increment a trailing number in the stem, or append `_1`.
fn bump(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();

    let bumped = stem[stem.len() - digits..]
        .parse::<u64>()
        .ok()
        .filter(|_| digits > 0)
        .and_then(|n| n.checked_add(1));
    let new_stem = match bumped {
        Some(n) => format!("{}{}", &stem[..stem.len() - digits], n),
        None => format!("{}_1", stem),
    };

    let file_name = match path.extension() {
        Some(ext) => format!("{}.{}", new_stem, ext.to_string_lossy()),
        None => new_stem,
    };
    path.with_file_name(file_name)
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError {
    let path = path.to_path_buf();
    move |source| OutputError::WriteError { path, source }
}

/// Write `contents` to `path` atomically.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error(path))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path).map_err(write_error(&temp_path))?;
    file.write_all(contents.as_bytes())
        .map_err(write_error(&temp_path))?;
    file.sync_all().map_err(write_error(&temp_path))?;

    fs::rename(&temp_path, path).map_err(write_error(path))?;
    Ok(())
}

/// Write the changelog, returning the path actually written.
pub fn write_changelog(path: &Path, contents: &str, overwrite: bool) -> Result<PathBuf, OutputError> {
    let target = target_path(path, overwrite);
    write_atomic(&target, contents)?;
    tracing::debug!(path = %target.display(), bytes = contents.len(), "wrote changelog");
    Ok(target)
}
