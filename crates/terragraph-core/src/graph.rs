//! Graph wrapper using petgraph::StableDiGraph keyed by node path

use crate::error::{GraphError, Result};
use crate::model::*;
use petgraph::Direction as EdgeDirection;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

/// Directed, possibly cyclic graph of files keyed by repository-relative path.
///
/// Nodes are addressed by their path; petgraph indices never leave this crate.
#[derive(Clone)]
pub struct DependencyGraph {
    inner: StableDiGraph<FileNode, DependencyEdge>,
    index: BTreeMap<String, NodeIndex>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph {
            inner: StableDiGraph::new(),
            index: BTreeMap::new(),
        }
    }

    /// Add a node unless one with the same path exists. Returns true if inserted.
    pub fn add_node(&mut self, node: FileNode) -> bool {
        if self.index.contains_key(&node.path) {
            return false;
        }
        let path = node.path.clone();
        let idx = self.inner.add_node(node);
        self.index.insert(path, idx);
        true
    }

    /// Add an edge between two known nodes.
    ///
    /// An edge of the same kind between the same pair is merged; returns false
    /// in that case.
    pub fn add_edge(&mut self, source: &str, target: &str, edge: DependencyEdge) -> Result<bool> {
        let from = self.index_of(source)?;
        let to = self.index_of(target)?;
        let duplicate = self
            .inner
            .edges_directed(from, EdgeDirection::Outgoing)
            .any(|e| e.target() == to && e.weight().kind == edge.kind);
        if duplicate {
            tracing::trace!("Merged duplicate {} edge {} -> {}", edge.kind, source, target);
            return Ok(false);
        }
        self.inner.add_edge(from, to, edge);
        Ok(true)
    }

    /// Get a node by path.
    pub fn node(&self, path: &str) -> Option<&FileNode> {
        self.index.get(path).and_then(|&idx| self.inner.node_weight(idx))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Attach a description to a node. The only mutation after the build.
    pub fn set_description(&mut self, path: &str, description: impl Into<String>) -> Result<()> {
        let idx = self.index_of(path)?;
        if let Some(node) = self.inner.node_weight_mut(idx) {
            node.description = Some(description.into());
        }
        Ok(())
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    /// Iterate over all edges in insertion order as (source, target, edge).
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &DependencyEdge)> {
        self.inner.edge_indices().filter_map(move |idx| {
            let (from, to) = self.inner.edge_endpoints(idx)?;
            let edge = self.inner.edge_weight(idx)?;
            Some((self.path_at(from)?, self.path_at(to)?, edge))
        })
    }

    /// Outgoing edges of a node as (target, edge).
    pub fn edges_from(&self, source: &str) -> Result<Vec<(&str, &DependencyEdge)>> {
        let idx = self.index_of(source)?;
        let mut edges: Vec<_> = self
            .inner
            .edges_directed(idx, EdgeDirection::Outgoing)
            .filter_map(|e| Some((self.path_at(e.target())?, e.weight())))
            .collect();
        // petgraph walks adjacency lists newest-first
        edges.reverse();
        Ok(edges)
    }

    /// Incoming edges of a node as (source, edge).
    pub fn edges_to(&self, target: &str) -> Result<Vec<(&str, &DependencyEdge)>> {
        let idx = self.index_of(target)?;
        let mut edges: Vec<_> = self
            .inner
            .edges_directed(idx, EdgeDirection::Incoming)
            .filter_map(|e| Some((self.path_at(e.source())?, e.weight())))
            .collect();
        edges.reverse();
        Ok(edges)
    }

    /// Check if an edge of a specific kind exists between two nodes.
    pub fn has_edge(&self, source: &str, target: &str, kind: ReferenceKind) -> bool {
        self.edges_from(source)
            .map(|edges| edges.iter().any(|(t, e)| *t == target && e.kind == kind))
            .unwrap_or(false)
    }

    pub fn in_degree(&self, path: &str) -> Result<usize> {
        let idx = self.index_of(path)?;
        Ok(self.inner.edges_directed(idx, EdgeDirection::Incoming).count())
    }

    pub fn out_degree(&self, path: &str) -> Result<usize> {
        let idx = self.index_of(path)?;
        Ok(self.inner.edges_directed(idx, EdgeDirection::Outgoing).count())
    }

    pub(crate) fn index_of(&self, path: &str) -> Result<NodeIndex> {
        self.index
            .get(path)
            .copied()
            .ok_or_else(|| GraphError::NotFound(path.to_string()))
    }

    pub(crate) fn path_at(&self, idx: NodeIndex) -> Option<&str> {
        self.inner.node_weight(idx).map(|n| n.path.as_str())
    }

    pub(crate) fn inner(&self) -> &StableDiGraph<FileNode, DependencyEdge> {
        &self.inner
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DependencyGraph {
    /// Same nodes and the same edge list, in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.nodes().eq(other.nodes()) && self.edges().eq(other.edges())
    }
}
