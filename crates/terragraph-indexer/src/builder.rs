//! Dependency graph builder
//!
//! Pass 1 adds one node per loaded file, pass 2 inserts the references each
//! file yields. With `parallel` set, parsing and extraction fan out over the
//! rayon pool; every graph insertion still happens on the calling thread in
//! loader order.

use crate::config::IndexConfig;
use crate::error::{LoadWarning, ParseError, Result};
use crate::extractor::{Extractor, Reference, ReferenceTarget};
use crate::loader::{LoadOutcome, absolute};
use crate::parser::{Document, parse};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use terragraph_core::{DependencyEdge, DependencyGraph, EXTERNAL_KEY_PREFIX, FileNode};

/// A file read from disk, keyed by its repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: String,
    pub content: String,
    /// Set when the bytes were not UTF-8; `content` is then a lossy decode.
    pub decode_error: Option<ParseError>,
}

impl LoadedFile {
    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        match String::from_utf8(bytes) {
            Ok(content) => LoadedFile {
                path,
                content,
                decode_error: None,
            },
            Err(e) => {
                let valid = e.utf8_error().valid_up_to();
                let bytes = e.into_bytes();
                let prefix = &bytes[..valid];
                let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
                let line_start = prefix.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
                let decode_error = ParseError {
                    path: path.clone(),
                    line: Some(line),
                    column: Some(valid - line_start + 1),
                    message: format!("not valid UTF-8 at byte {valid}"),
                };
                LoadedFile {
                    path,
                    content: String::from_utf8_lossy(&bytes).into_owned(),
                    decode_error: Some(decode_error),
                }
            }
        }
    }
}

/// A loaded file together with its parse outcome.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: String,
    pub content: String,
    pub document: std::result::Result<Arc<Document>, ParseError>,
}

impl ParsedFile {
    pub fn parse(file: LoadedFile) -> Self {
        let document = match file.decode_error {
            Some(err) => Err(err),
            None => parse(&file.path, &file.content).map(Arc::new),
        };
        ParsedFile {
            path: file.path,
            content: file.content,
            document,
        }
    }
}

pub struct GraphBuilder {
    root: PathBuf,
    config: IndexConfig,
}

impl GraphBuilder {
    pub fn new(root: impl Into<PathBuf>, config: IndexConfig) -> Self {
        GraphBuilder {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Read every file named by a load outcome. Unreadable files become
    /// warnings and are left out; files that are not UTF-8 are kept and
    /// fail to parse.
    pub fn read(&self, outcome: &LoadOutcome) -> (Vec<LoadedFile>, Vec<LoadWarning>) {
        let read_one = |key: &String| -> std::result::Result<LoadedFile, LoadWarning> {
            let path = absolute(&self.root, key);
            match std::fs::read(&path) {
                Ok(bytes) => Ok(LoadedFile::from_bytes(key.clone(), bytes)),
                Err(e) => Err(LoadWarning {
                    path,
                    message: e.to_string(),
                }),
            }
        };

        let results: Vec<_> = if self.config.parallel {
            outcome.files.par_iter().map(read_one).collect()
        } else {
            outcome.files.iter().map(read_one).collect()
        };

        let mut files = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok(file) => files.push(file),
                Err(warning) => {
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
        (files, warnings)
    }

    /// Parse a batch of loaded files, keeping their order.
    pub fn parse_all(&self, files: Vec<LoadedFile>) -> Vec<ParsedFile> {
        if self.config.parallel {
            files.into_par_iter().map(ParsedFile::parse).collect()
        } else {
            files.into_iter().map(ParsedFile::parse).collect()
        }
    }

    /// Parse and assemble in one step.
    pub fn build(&self, files: Vec<LoadedFile>) -> Result<DependencyGraph> {
        let parsed = self.parse_all(files);
        self.assemble(&parsed)
    }

    /// Build the graph from already parsed files.
    pub fn assemble(&self, files: &[ParsedFile]) -> Result<DependencyGraph> {
        let extractor = Extractor::new(&self.root, &self.config)?;
        let extract_one = |file: &ParsedFile| -> Vec<Reference> {
            match &file.document {
                Ok(doc) => extractor.extract(doc, &file.path).collect(),
                Err(_) => Vec::new(),
            }
        };

        let references: Vec<Vec<Reference>> = if self.config.parallel {
            files.par_iter().map(extract_one).collect()
        } else {
            files.iter().map(extract_one).collect()
        };

        let mut graph = DependencyGraph::new();
        let mut scanned = HashSet::with_capacity(files.len());

        for file in files {
            let node = match &file.document {
                Ok(_) => {
                    tracing::debug!("Parsed {}", file.path);
                    FileNode::resolved(&file.path, &file.content)
                }
                Err(e) => {
                    tracing::warn!("Parse failure: {}", e);
                    FileNode::failed(&file.path, &file.content, e.clone().into())
                }
            };
            graph.add_node(node);
            scanned.insert(file.path.as_str());
        }

        // every path-keyed node, so externals can step aside regardless of order
        let local: HashSet<&str> = scanned
            .iter()
            .copied()
            .chain(references.iter().flatten().filter_map(|r| match &r.target {
                ReferenceTarget::Resolved(key) | ReferenceTarget::Unresolved(key) => Some(key.as_str()),
                ReferenceTarget::External(_) => None,
            }))
            .collect();

        for (file, refs) in files.iter().zip(&references) {
            for reference in refs {
                let target = match &reference.target {
                    ReferenceTarget::Resolved(key) if scanned.contains(key.as_str()) => key.clone(),
                    // on disk but not part of the scan: hidden, excluded or ignored
                    ReferenceTarget::Resolved(key) | ReferenceTarget::Unresolved(key) => {
                        graph.add_node(FileNode::unresolved(key));
                        key.clone()
                    }
                    ReferenceTarget::External(raw) if local.contains(raw.as_str()) => {
                        let key = format!("{EXTERNAL_KEY_PREFIX}{raw}");
                        graph.add_node(FileNode::external_at(&key, raw));
                        key
                    }
                    ReferenceTarget::External(raw) => {
                        graph.add_node(FileNode::external(raw));
                        raw.clone()
                    }
                };
                let edge = DependencyEdge {
                    kind: reference.kind,
                    external: matches!(reference.target, ReferenceTarget::External(_)),
                    label: reference.label.clone(),
                };
                graph.add_edge(&file.path, &target, edge)?;
            }
        }

        tracing::info!(
            "Built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}
