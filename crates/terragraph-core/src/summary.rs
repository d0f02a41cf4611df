//! Serializable views handed to summarizers, renderers, and prompt assemblers

use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::model::{DEFAULT_DESCRIPTION, ParseFailure, ReferenceKind};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Graph overview with per-node degree counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<NodeSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub path: String,
    pub kind: String,
    pub description: Option<String>,
    pub in_degree: usize,
    pub out_degree: usize,
    pub parse_failed: bool,
}

/// Generic node/edge lists for a rendering library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<InterchangeNode>,
    pub edges: Vec<InterchangeEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchangeNode {
    pub id: String,
    pub kind: String,
    pub description: Option<String>,
    pub parse_failure: Option<ParseFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchangeEdge {
    pub source: String,
    pub target: String,
    pub kind: ReferenceKind,
    pub external: bool,
    pub label: Option<String>,
}

/// A file's text offered to an external description generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribableFile {
    pub path: String,
    pub content: String,
    pub truncated: bool,
}

const TRUNCATION_MARKER: &str = "... (truncated)";

impl DependencyGraph {
    pub fn summary(&self) -> GraphSummary {
        let nodes = self
            .nodes()
            .map(|node| NodeSummary {
                path: node.path.clone(),
                kind: node.kind.label().to_string(),
                description: node.description.clone(),
                in_degree: self.in_degree(&node.path).unwrap_or_default(),
                out_degree: self.out_degree(&node.path).unwrap_or_default(),
                parse_failed: node.parse_failure().is_some(),
            })
            .collect();

        GraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            nodes,
        }
    }

    pub fn interchange(&self) -> GraphExport {
        let nodes = self
            .nodes()
            .map(|node| InterchangeNode {
                id: node.path.clone(),
                kind: node.kind.label().to_string(),
                description: node.description.clone(),
                parse_failure: node.parse_failure().cloned(),
            })
            .collect();

        let edges = self
            .edges()
            .map(|(source, target, edge)| InterchangeEdge {
                source: source.to_string(),
                target: target.to_string(),
                kind: edge.kind,
                external: edge.external,
                label: edge.label.clone(),
            })
            .collect();

        GraphExport { nodes, edges }
    }

    /// Text of every scanned file, cut to `max_chars` characters.
    pub fn describable_files(&self, max_chars: usize) -> Vec<DescribableFile> {
        self.nodes()
            .filter_map(|node| {
                let content = node.content()?;
                let (content, truncated) = truncate_chars(content, max_chars);
                Some(DescribableFile {
                    path: node.path.clone(),
                    content,
                    truncated,
                })
            })
            .collect()
    }

    /// Plain-text listing of files, descriptions, and outgoing dependencies.
    ///
    /// An empty `paths` slice renders every scanned file.
    pub fn prompt_context<S: AsRef<str>>(&self, paths: &[S]) -> Result<String> {
        let selected: Vec<&str> = if paths.is_empty() {
            self.nodes()
                .filter(|n| n.is_resolved())
                .map(|n| n.path.as_str())
                .collect()
        } else {
            paths.iter().map(|p| p.as_ref()).collect()
        };

        let mut out = String::new();
        for path in selected {
            let node = self
                .node(path)
                .ok_or_else(|| crate::GraphError::NotFound(path.to_string()))?;
            let description = node.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION);
            let _ = writeln!(out, "File: {}", node.path);
            let _ = writeln!(out, "Description: {}", description);

            let deps = self.edges_from(path)?;
            if deps.is_empty() {
                let _ = writeln!(out, "Dependencies: none");
            } else {
                let _ = writeln!(out, "Dependencies:");
                for (target, edge) in deps {
                    match &edge.label {
                        Some(label) => {
                            let _ = writeln!(out, "- {} ({}: {})", target, edge.kind, label);
                        }
                        None => {
                            let _ = writeln!(out, "- {} ({})", target, edge.kind);
                        }
                    }
                }
            }
            out.push('\n');
        }
        Ok(out)
    }
}

fn truncate_chars(content: &str, max_chars: usize) -> (String, bool) {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => (format!("{}{}", &content[..cut], TRUNCATION_MARKER), true),
        None => (content.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_on_char_boundary() {
        let (short, truncated) = truncate_chars("héllo", 10);
        assert_eq!(short, "héllo");
        assert!(!truncated);

        let (cut, truncated) = truncate_chars("héllo", 2);
        assert_eq!(cut, "hé... (truncated)");
        assert!(truncated);
    }
}
