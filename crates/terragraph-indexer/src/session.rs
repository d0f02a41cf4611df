//! Indexing session: root, config and the caches that survive a rescan

use crate::builder::{GraphBuilder, ParsedFile};
use crate::config::{self, IndexConfig};
use crate::error::{LoadWarning, ParseError, Result};
use crate::loader::load;
use crate::parser::Document;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use terragraph_core::DependencyGraph;

/// What a scan did, for logs and API responses.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub files: usize,
    /// Files parsed this scan.
    pub parsed: usize,
    /// Files whose previous parse was reused.
    pub reused: usize,
    pub parse_failures: usize,
    pub descriptions_restored: usize,
    #[serde(serialize_with = "serialize_warnings")]
    pub warnings: Vec<LoadWarning>,
}

fn serialize_warnings<S: serde::Serializer>(
    warnings: &[LoadWarning],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(warnings.iter().map(ToString::to_string))
}

#[derive(Debug, Clone)]
struct CachedDocument {
    hash: u64,
    document: std::result::Result<Arc<Document>, ParseError>,
}

#[derive(Debug, Clone)]
struct CachedDescription {
    hash: u64,
    text: String,
}

/// Owns everything a sequence of scans over one root shares.
///
/// Parsed documents are reused when a file's content hash is unchanged.
/// Extraction always reruns, since module directories can change without
/// the referencing file changing.
pub struct Session {
    root: PathBuf,
    config: IndexConfig,
    documents: HashMap<String, CachedDocument>,
    descriptions: HashMap<String, CachedDescription>,
}

impl Session {
    pub fn new(root: impl AsRef<Path>, config: IndexConfig) -> Self {
        let root = root.as_ref();
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        Session {
            root,
            config,
            documents: HashMap::new(),
            descriptions: HashMap::new(),
        }
    }

    /// Session with `terragraph.toml` from `root`, or from an explicit file.
    pub fn open(root: impl AsRef<Path>, config_path: Option<&PathBuf>) -> Result<Self> {
        let config = config::resolve(root.as_ref(), config_path)?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Load, parse and build. Cache entries for changed or vanished files
    /// are dropped.
    pub fn scan(&mut self) -> Result<(DependencyGraph, ScanReport)> {
        let outcome = load(&self.root, &self.config)?;
        let builder = GraphBuilder::new(&self.root, self.config.clone());
        let (files, read_warnings) = builder.read(&outcome);

        let mut report = ScanReport {
            files: files.len(),
            warnings: outcome.warnings,
            ..ScanReport::default()
        };
        report.warnings.extend(read_warnings);

        let hashes: Vec<u64> = files.iter().map(|f| content_hash(&f.content)).collect();
        let mut slots = Vec::with_capacity(files.len());
        let mut pending = Vec::new();
        for (file, &hash) in files.into_iter().zip(&hashes) {
            match self.documents.get(&file.path) {
                Some(cached) if cached.hash == hash && file.decode_error.is_none() => slots.push(Some(ParsedFile {
                    path: file.path,
                    content: file.content,
                    document: cached.document.clone(),
                })),
                _ => {
                    slots.push(None);
                    pending.push(file);
                }
            }
        }
        report.parsed = pending.len();
        report.reused = slots.len() - pending.len();

        let mut fresh = builder.parse_all(pending).into_iter();
        let parsed: Vec<ParsedFile> = slots
            .into_iter()
            .filter_map(|slot| slot.or_else(|| fresh.next()))
            .collect();
        report.parse_failures = parsed.iter().filter(|p| p.document.is_err()).count();

        let current: HashMap<&str, u64> = parsed
            .iter()
            .zip(&hashes)
            .map(|(p, &hash)| (p.path.as_str(), hash))
            .collect();

        self.documents = parsed
            .iter()
            .zip(&hashes)
            .map(|(p, &hash)| {
                let cached = CachedDocument {
                    hash,
                    document: p.document.clone(),
                };
                (p.path.clone(), cached)
            })
            .collect();

        let mut graph = builder.assemble(&parsed)?;

        self.descriptions
            .retain(|path, entry| current.get(path.as_str()) == Some(&entry.hash));
        for (path, entry) in &self.descriptions {
            graph.set_description(path, entry.text.clone())?;
        }
        report.descriptions_restored = self.descriptions.len();

        tracing::info!(
            "Scan of {}: {} files, {} parsed, {} reused, {} parse failures",
            self.root.display(),
            report.files,
            report.parsed,
            report.reused,
            report.parse_failures
        );
        Ok((graph, report))
    }

    /// Attach a description to a node and remember it for later scans while
    /// the file content stays the same.
    pub fn describe(&mut self, graph: &mut DependencyGraph, path: &str, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        graph.set_description(path, text.clone())?;
        if let Some(content) = graph.node(path).and_then(|n| n.content()) {
            let hash = content_hash(content);
            self.descriptions
                .insert(path.to_string(), CachedDescription { hash, text });
        }
        Ok(())
    }

    /// Drop every cached parse and description.
    pub fn invalidate(&mut self) {
        self.documents.clear();
        self.descriptions.clear();
    }
}

pub(crate) fn content_hash(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_repo_with_structure, write_file};

    #[test]
    fn test_rescan_reuses_unchanged_parses() {
        let repo = create_repo_with_structure(&[
            ("main.tf", "module \"net\" {\n  source = \"./net\"\n}\n"),
            ("net/main.tf", "variable \"cidr\" {}\n"),
        ]);
        let mut session = Session::new(repo.path(), IndexConfig::default());

        let (_, first) = session.scan().unwrap();
        assert_eq!(first.parsed, 2);
        assert_eq!(first.reused, 0);

        write_file(repo.path(), "net/main.tf", "variable \"cidr\" {\n  default = \"10.0.0.0/8\"\n}\n");
        let (_, second) = session.scan().unwrap();
        assert_eq!(second.parsed, 1);
        assert_eq!(second.reused, 1);
    }

    #[test]
    fn test_description_survives_until_content_changes() {
        let repo = create_repo_with_structure(&[("main.tf", "locals {}\n"), ("vars.tf", "")]);
        let mut session = Session::new(repo.path(), IndexConfig::default());

        let (mut graph, _) = session.scan().unwrap();
        session.describe(&mut graph, "main.tf", "Root locals").unwrap();
        session.describe(&mut graph, "vars.tf", "Variables").unwrap();

        let (graph, report) = session.scan().unwrap();
        assert_eq!(report.descriptions_restored, 2);
        assert_eq!(graph.node("main.tf").unwrap().description.as_deref(), Some("Root locals"));

        write_file(repo.path(), "main.tf", "locals {\n  env = \"prod\"\n}\n");
        let (graph, report) = session.scan().unwrap();
        assert_eq!(report.descriptions_restored, 1);
        assert_eq!(graph.node("main.tf").unwrap().description, None);
        assert_eq!(graph.node("vars.tf").unwrap().description.as_deref(), Some("Variables"));
    }

    #[test]
    fn test_vanished_file_drops_cache() {
        let repo = create_repo_with_structure(&[("main.tf", ""), ("old.tf", "")]);
        let mut session = Session::new(repo.path(), IndexConfig::default());
        let (mut graph, _) = session.scan().unwrap();
        session.describe(&mut graph, "old.tf", "Legacy").unwrap();

        std::fs::remove_file(repo.path().join("old.tf")).unwrap();
        let (graph, report) = session.scan().unwrap();
        assert!(!graph.contains("old.tf"));
        assert_eq!(report.files, 1);
        assert_eq!(report.descriptions_restored, 0);
    }

    #[test]
    fn test_invalidate_forces_reparse() {
        let repo = create_repo_with_structure(&[("main.tf", "")]);
        let mut session = Session::new(repo.path(), IndexConfig::default());
        session.scan().unwrap();

        session.invalidate();
        let (_, report) = session.scan().unwrap();
        assert_eq!(report.parsed, 1);
        assert_eq!(report.reused, 0);
    }

    #[test]
    fn test_describe_unknown_path() {
        let repo = create_repo_with_structure(&[("main.tf", "")]);
        let mut session = Session::new(repo.path(), IndexConfig::default());
        let (mut graph, _) = session.scan().unwrap();
        assert!(session.describe(&mut graph, "nope.tf", "x").is_err());
    }

    #[test]
    fn test_open_reads_config_file() {
        let repo = create_repo_with_structure(&[
            ("main.tf", ""),
            ("legacy/main.tf", ""),
            ("terragraph.toml", "exclude = [\"legacy/**\"]\n"),
        ]);
        let mut session = Session::open(repo.path(), None).unwrap();
        let (graph, _) = session.scan().unwrap();
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_content_hash_stable() {
        assert_eq!(content_hash("a"), content_hash("a"));
        assert_ne!(content_hash("a"), content_hash("b"));
    }
}
