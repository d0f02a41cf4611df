//! Core data structures for the dependency graph

use serde::{Deserialize, Serialize};

/// Fallback text used wherever a node has no attached description.
pub const DEFAULT_DESCRIPTION: &str = "Terraform configuration file";

/// Key prefix for an external node whose raw source collides with a local path.
pub const EXTERNAL_KEY_PREFIX: &str = "external:";

/// Where a parse failed, kept on the node instead of aborting the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// What a node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    // ── Scanned ─────────────────────────────────────────────
    /// A configuration file loaded from the working tree.
    Resolved {
        content: String,
        parse_failure: Option<ParseFailure>,
    },

    // ── Placeholders ────────────────────────────────────────
    /// A module source that is not a local path (registry, git URL, ...).
    External { raw_source: String },
    /// A local target that does not exist or was not part of the scan.
    Unresolved,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Resolved { .. } => "resolved",
            NodeKind::External { .. } => "external",
            NodeKind::Unresolved => "unresolved",
        }
    }
}

/// A single node in the graph, keyed by its path (or raw source for externals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub kind: NodeKind,
    pub description: Option<String>,
}

impl FileNode {
    pub fn resolved(path: impl Into<String>, content: impl Into<String>) -> Self {
        FileNode {
            path: path.into(),
            kind: NodeKind::Resolved {
                content: content.into(),
                parse_failure: None,
            },
            description: None,
        }
    }

    pub fn failed(path: impl Into<String>, content: impl Into<String>, failure: ParseFailure) -> Self {
        FileNode {
            path: path.into(),
            kind: NodeKind::Resolved {
                content: content.into(),
                parse_failure: Some(failure),
            },
            description: None,
        }
    }

    pub fn external(raw_source: impl Into<String>) -> Self {
        let raw_source = raw_source.into();
        Self::external_at(raw_source.clone(), raw_source)
    }

    /// External node stored under `key` instead of its raw source, for a raw
    /// source that is also the path of a local node.
    pub fn external_at(key: impl Into<String>, raw_source: impl Into<String>) -> Self {
        FileNode {
            path: key.into(),
            kind: NodeKind::External {
                raw_source: raw_source.into(),
            },
            description: None,
        }
    }

    pub fn unresolved(path: impl Into<String>) -> Self {
        FileNode {
            path: path.into(),
            kind: NodeKind::Unresolved,
            description: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.kind, NodeKind::Resolved { .. })
    }

    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Resolved { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn parse_failure(&self) -> Option<&ParseFailure> {
        match &self.kind {
            NodeKind::Resolved { parse_failure, .. } => parse_failure.as_ref(),
            _ => None,
        }
    }
}

/// What kind of reference an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// `source` of a `module` block.
    ModuleReference,
    /// A path to another configuration file mentioned in a string value.
    LocalFileReference,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::ModuleReference => "module-reference",
            ReferenceKind::LocalFileReference => "local-file-reference",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge in the graph. Endpoints live in the petgraph structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub kind: ReferenceKind,
    /// Target is not a local path.
    pub external: bool,
    /// Module block name, when the edge comes from a module reference.
    pub label: Option<String>,
}
