//! Scan configuration, read from `terragraph.toml`

use crate::error::{IndexError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the scanned root.
pub const CONFIG_FILE: &str = "terragraph.toml";

/// Characters of file text handed to a description generator.
pub const DEFAULT_DESCRIPTION_CHARS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// File name suffixes treated as configuration files.
    pub suffixes: Vec<String>,
    /// Glob patterns matched against repository-relative paths.
    pub exclude: Vec<String>,
    /// Descend into dot-directories such as `.terraform/`.
    pub include_hidden: bool,
    pub respect_gitignore: bool,
    /// Parse and extract on the rayon pool.
    pub parallel: bool,
    pub description_chars: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            suffixes: vec![".tf".to_string(), ".tf.json".to_string()],
            exclude: Vec::new(),
            include_hidden: false,
            respect_gitignore: true,
            parallel: false,
            description_chars: DEFAULT_DESCRIPTION_CHARS,
        }
    }
}

impl IndexConfig {
    /// Load `terragraph.toml` from `root`, or defaults when it is absent.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text).map_err(|source| IndexError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// True when the file name ends with one of the configured suffixes.
    pub fn matches_suffix(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| {
                self.suffixes
                    .iter()
                    .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix.as_str()))
            })
    }

    pub(crate) fn exclude_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}

/// Resolve the config for a scan: an explicit file wins over discovery.
pub fn resolve(root: &Path, explicit: Option<&PathBuf>) -> Result<IndexConfig> {
    match explicit {
        Some(path) => IndexConfig::from_file(path),
        None => IndexConfig::discover(root),
    }
}
