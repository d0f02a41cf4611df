//! Errors surfaced by the query facade

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("no node for path: {0}")]
    NotFound(String),
}
