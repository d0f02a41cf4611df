//! Terragraph core: the file dependency graph and its queries

pub mod error;
pub mod graph;
pub mod model;
pub mod query;
pub mod summary;


pub use error::{GraphError, Result};
pub use graph::DependencyGraph;
pub use model::{
    DependencyEdge, FileNode, NodeKind, ParseFailure, ReferenceKind, DEFAULT_DESCRIPTION,
    EXTERNAL_KEY_PREFIX,
};
pub use query::{Direction, Hops};
pub use summary::{
    DescribableFile, GraphExport, GraphSummary, InterchangeEdge, InterchangeNode, NodeSummary,
};
