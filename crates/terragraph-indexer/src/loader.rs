//! Repository loader: enumerate configuration files under a root

use crate::config::IndexConfig;
use crate::error::{IndexError, LoadWarning, Result};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Files found by a scan, in lexicographic order of their relative paths.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Repository-relative paths, `/`-separated.
    pub files: Vec<String>,
    pub warnings: Vec<LoadWarning>,
}

/// Walk `root` and collect every file whose name matches a configured suffix.
///
/// Only a missing or non-directory root is fatal; anything unreadable below it
/// becomes a warning.
pub fn load(root: &Path, config: &IndexConfig) -> Result<LoadOutcome> {
    if !root.exists() {
        return Err(IndexError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(IndexError::RootNotDirectory(root.to_path_buf()));
    }

    let excluded = config.exclude_set()?;
    let mut outcome = LoadOutcome::default();

    let walker = WalkBuilder::new(root)
        .hidden(!config.include_hidden)
        .git_ignore(config.respect_gitignore)
        .git_exclude(config.respect_gitignore)
        .git_global(false)
        .require_git(false)
        .parents(false)
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                outcome.warnings.push(walk_warning(root, &e));
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        if !config.matches_suffix(path) {
            continue;
        }
        let Some(relative) = relative_key(root, path) else {
            continue;
        };
        if excluded.is_match(&relative) {
            tracing::debug!("Excluded by pattern: {}", relative);
            continue;
        }
        outcome.files.push(relative);
    }

    outcome.files.sort();
    tracing::info!(
        "Found {} configuration files under {} ({} skipped)",
        outcome.files.len(),
        root.display(),
        outcome.warnings.len()
    );
    Ok(outcome)
}

/// Repository-relative, `/`-separated key for a path under `root`.
///
/// Returns `None` when the path is not inside `root`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Warning for an entry the walker could not read, attributed to the
/// deepest path the error carries, or to `root`.
fn walk_warning(root: &Path, err: &ignore::Error) -> LoadWarning {
    let path = error_path(err).map_or_else(|| root.to_path_buf(), Path::to_path_buf);
    tracing::warn!("Skipping {}: {}", path.display(), err);
    LoadWarning {
        path,
        message: err.to_string(),
    }
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

/// Absolute path for a repository-relative key.
pub fn absolute(root: &Path, key: &str) -> PathBuf {
    key.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}
