//! Terraform file loading, parsing, reference extraction, and graph building

pub mod builder;
pub mod config;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod parser;
pub mod session;
pub mod workspace;

#[cfg(test)]
pub mod test_utils;


pub use builder::{GraphBuilder, LoadedFile, ParsedFile};
pub use config::{CONFIG_FILE, IndexConfig};
pub use error::{IndexError, LoadWarning, ParseError, Result};
pub use extractor::{Extractor, Reference, ReferenceTarget};
pub use loader::{LoadOutcome, load};
pub use parser::{Document, parse};
pub use session::{ScanReport, Session};
pub use workspace::apply_modifications;
