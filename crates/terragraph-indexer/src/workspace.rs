//! Writing modified file contents back into the working tree

use crate::error::{IndexError, Result};
use crate::loader::{absolute, relative_key};
use path_clean::PathClean;
use std::collections::BTreeMap;
use std::path::Path;

/// Write `path -> content` pairs below `root`, creating parent directories.
///
/// Every path is checked before anything is written: absolute paths and
/// paths that leave `root` fail the whole batch. Returns the normalized keys
/// written, or that would be written when `dry_run` is set.
pub fn apply_modifications(
    root: &Path,
    changes: &BTreeMap<String, String>,
    dry_run: bool,
) -> Result<Vec<String>> {
    let mut planned = Vec::with_capacity(changes.len());
    for (path, content) in changes {
        planned.push((checked_key(root, path)?, content));
    }

    let mut written = Vec::with_capacity(planned.len());
    for (key, content) in planned {
        let target = absolute(root, &key);
        if dry_run {
            tracing::info!("Would write {} ({} bytes)", target.display(), content.len());
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, content)?;
            tracing::info!("Updated {}", key);
        }
        written.push(key);
    }
    Ok(written)
}

fn checked_key(root: &Path, path: &str) -> Result<String> {
    if Path::new(path).is_absolute() {
        return Err(IndexError::PathEscapesRoot(path.to_string()));
    }
    let candidate = root.join(path).clean();
    relative_key(root, &candidate).ok_or_else(|| IndexError::PathEscapesRoot(path.to_string()))
}
