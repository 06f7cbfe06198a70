//! The `width` CLI subcommand.

use clap::Parser;
use std::path::PathBuf;

use crate::graph_loader::load_dimacs;
use crate::json::read_tree;
use crate::matching::Matcher;

use super::CliError;

/// Check a json decomposition of a DIMACS graph and print its MM-width.
#[derive(Parser, Debug)]
pub struct WidthArgs {
    /// DIMACS graph file.
    graph: PathBuf,

    /// Json tree produced by `decompose`.
    tree: PathBuf,

    /// Also print the fitness of the tree.
    #[arg(long)]
    fitness: bool,
}

impl WidthArgs {
    /// Run the `width` command using the provided arguments.
    pub fn run(self) -> Result<(), CliError> {
        let graph = load_dimacs(&self.graph)?;
        let tree = read_tree(&graph, &self.tree)?;
        tree.validate(&graph.vertex_set())?;

        let mut matcher = Matcher::new();
        println!("MM-width: {}", tree.mm_width(&graph, &mut matcher));
        if self.fitness {
            println!("fitness: {}", tree.fitness(&graph, &mut matcher));
        }
        Ok(())
    }
}
