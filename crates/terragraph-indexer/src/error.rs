//! Indexer errors and non-fatal scan findings

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("root path does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("root path is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("invalid suffix pattern: {0}")]
    Suffix(#[from] regex::Error),

    #[error("refusing to write outside the working tree: {0}")]
    PathEscapesRoot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Graph(#[from] terragraph_core::GraphError),
}

/// A file that was skipped during a scan. Logged and reported, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot load {path}: {message}")]
pub struct LoadWarning {
    pub path: PathBuf,
    pub message: String,
}

/// A syntax error in one configuration file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}:{}:{}: {message}", .line.unwrap_or(0), .column.unwrap_or(0))]
pub struct ParseError {
    pub path: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub message: String,
}

impl From<ParseError> for terragraph_core::ParseFailure {
    fn from(err: ParseError) -> Self {
        terragraph_core::ParseFailure {
            message: err.message,
            line: err.line,
            column: err.column,
        }
    }
}
