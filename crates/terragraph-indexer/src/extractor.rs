//! Reference extraction from parsed documents
//!
//! Two independent rules run over every document:
//!
//! * module blocks contribute their `source`, resolved against the owning
//!   file's directory when it is a relative path;
//! * string values are scanned for tokens that look like paths to other
//!   configuration files and exist on disk.

use crate::config::IndexConfig;
use crate::error::Result;
use crate::loader::{absolute, relative_key};
use crate::parser::Document;
use path_clean::PathClean;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use terragraph_core::ReferenceKind;

/// Where a reference points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceTarget {
    /// An existing file under the root, by repository-relative key.
    Resolved(String),
    /// A non-path module source, kept verbatim.
    External(String),
    /// A local path that does not exist, or a module directory without
    /// configuration files.
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub target: ReferenceTarget,
    pub kind: ReferenceKind,
    /// Module block name for module references.
    pub label: Option<String>,
}

/// Key used for the root directory itself when it is a reference target.
const ROOT_KEY: &str = ".";

pub struct Extractor<'a> {
    root: &'a Path,
    config: &'a IndexConfig,
    token: Regex,
}

impl<'a> Extractor<'a> {
    pub fn new(root: &'a Path, config: &'a IndexConfig) -> Result<Self> {
        let mut suffixes: Vec<&str> = config.suffixes.iter().map(String::as_str).collect();
        // longest first so `.tf.json` wins over `.tf`
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
        let alternatives: Vec<String> = suffixes.iter().map(|s| regex::escape(s)).collect();
        let token = Regex::new(&format!(r"[\w.\-/]*(?:{})\b", alternatives.join("|")))?;
        Ok(Extractor { root, config, token })
    }

    /// Lazily yield every reference found in `doc`, owned by the file `owner`.
    pub fn extract<'d>(&'d self, doc: &'d Document, owner: &'d str) -> impl Iterator<Item = Reference> + 'd {
        let owner_dir = absolute(self.root, owner)
            .parent()
            .map_or_else(|| self.root.to_path_buf(), Path::to_path_buf);
        let module_dir = owner_dir.clone();

        let modules = module_sources(doc).into_iter().flat_map(move |(name, source)| {
            self.resolve_module(&module_dir, source)
                .into_iter()
                .map(move |target| Reference {
                    target,
                    kind: ReferenceKind::ModuleReference,
                    label: Some(name.to_string()),
                })
        });

        let locals = StringLeaves::new(doc)
            .flat_map(move |text| self.token.find_iter(text).map(|m| m.as_str()))
            .filter_map(move |token| self.resolve_local(&owner_dir, owner, token))
            .map(|key| Reference {
                target: ReferenceTarget::Resolved(key),
                kind: ReferenceKind::LocalFileReference,
                label: None,
            });

        modules.chain(locals)
    }

    fn resolve_module(&self, owner_dir: &Path, source: &str) -> Vec<ReferenceTarget> {
        if !is_local_source(source) {
            tracing::debug!("Non-local module source: {}", source);
            return vec![ReferenceTarget::External(source.to_string())];
        }

        let candidate = owner_dir.join(source).clean();
        let Some(key) = self.key_for(&candidate) else {
            tracing::debug!("Module source escapes the root: {}", source);
            return vec![ReferenceTarget::External(source.to_string())];
        };

        if candidate.is_dir() {
            let files = self.config_files_in(&candidate);
            if files.is_empty() {
                tracing::warn!("No configuration files in module directory: {}", key);
                return vec![ReferenceTarget::Unresolved(key)];
            }
            files.into_iter().map(ReferenceTarget::Resolved).collect()
        } else if candidate.is_file() {
            vec![ReferenceTarget::Resolved(key)]
        } else {
            tracing::debug!("Module path does not exist: {}", key);
            vec![ReferenceTarget::Unresolved(key)]
        }
    }

    fn resolve_local(&self, owner_dir: &Path, owner: &str, token: &str) -> Option<String> {
        let token = token.trim_start_matches('/');
        if token.is_empty() {
            return None;
        }
        let candidate = owner_dir.join(token).clean();
        if !candidate.is_file() || !self.config.matches_suffix(&candidate) {
            return None;
        }
        let key = relative_key(self.root, &candidate)?;
        (key != owner).then_some(key)
    }

    /// Configuration files directly inside `dir`, sorted by key.
    fn config_files_in(&self, dir: &Path) -> Vec<String> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot read module directory {}: {}", dir.display(), e);
                return Vec::new();
            }
        };
        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.config.matches_suffix(path))
            .filter_map(|path| relative_key(self.root, &path))
            .collect();
        files.sort();
        files
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        if path == self.root {
            return Some(ROOT_KEY.to_string());
        }
        relative_key(self.root, path)
    }
}

/// `./x`, `../x`, `.` and `..` are filesystem sources; anything else is not.
fn is_local_source(source: &str) -> bool {
    source == "."
        || source == ".."
        || source.starts_with("./")
        || source.starts_with("../")
}

/// `(name, source)` of every module block, in either the object or the
/// array-of-objects shape.
fn module_sources(doc: &Document) -> Vec<(&str, &str)> {
    let mut sources = Vec::new();
    match doc.get("module") {
        Some(Value::Object(blocks)) => collect_named_blocks(blocks, &mut sources),
        Some(Value::Array(items)) => {
            for item in items {
                if let Value::Object(blocks) = item {
                    collect_named_blocks(blocks, &mut sources);
                }
            }
        }
        _ => {}
    }
    sources
}

fn collect_named_blocks<'d>(
    blocks: &'d serde_json::Map<String, Value>,
    sources: &mut Vec<(&'d str, &'d str)>,
) {
    for (name, body) in blocks {
        let bodies: Vec<&Value> = match body {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for body in bodies {
            if let Some(source) = body.get("source").and_then(Value::as_str) {
                sources.push((name.as_str(), source));
            }
        }
    }
}

/// Depth-first iterator over every string value in a document.
struct StringLeaves<'d> {
    stack: Vec<&'d Value>,
}

impl<'d> StringLeaves<'d> {
    fn new(doc: &'d Document) -> Self {
        StringLeaves {
            stack: doc.values().rev().collect(),
        }
    }
}

impl<'d> Iterator for StringLeaves<'d> {
    type Item = &'d str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(value) = self.stack.pop() {
            match value {
                Value::String(s) => return Some(s),
                Value::Array(items) => self.stack.extend(items.iter().rev()),
                Value::Object(map) => self.stack.extend(map.values().rev()),
                _ => {}
            }
        }
        None
    }
}
