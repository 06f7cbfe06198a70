//! The mmwidth command line interface.

use clap::{crate_version, Parser};

use crate::error::DecompError;

pub mod decompose;
pub mod width;

/// CLI arguments.
#[derive(Parser, Debug)]
#[clap(version = crate_version!(), long_about = None)]
#[clap(about = "Heuristic maximum-matching-width decompositions of graphs")]
pub enum Cli {
    /// Decompose a graph and print its MM-width.
    Decompose(decompose::DecomposeArgs),
    /// Check a decomposition and print its MM-width.
    Width(width::WidthArgs),
}

/// Error type for the CLI.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum CliError {
    /// Error reading or writing files.
    #[display("IO error: {_0}")]
    IO(std::io::Error),
    /// Error loading a graph or building its decomposition.
    #[display("{_0}")]
    Decomp(DecompError),
}

impl Cli {
    pub fn run(self) -> Result<(), CliError> {
        match self {
            Cli::Decompose(args) => args.run(),
            Cli::Width(args) => args.run(),
        }
    }
}
