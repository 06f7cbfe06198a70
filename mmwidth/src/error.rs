//! Errors raised while building or optimizing decompositions.

use derive_more::{Display, From};

#[derive(Debug, Display, From)]
pub enum DecompError {
    /// Error reading or writing files.
    #[display("IO error: {_0}")]
    #[from]
    Io(std::io::Error),
    /// An input file is malformed.
    #[display("Malformed input: {_0}")]
    Format(String),
    /// A decomposition tree lost one of its structural invariants. This is
    /// always a bug in the algorithm that produced the tree.
    #[display("Structural invariant violated: {_0}")]
    Invariant(String),
    /// The requested combination of heuristics is not available.
    #[display("Unsupported configuration: {_0}")]
    Unsupported(String),
    /// A serialized decomposition tree could not be read.
    #[display("Malformed decomposition tree: {_0}")]
    #[from]
    Json(serde_json::Error),
}

impl std::error::Error for DecompError {}
