//! Heuristic decompositions of graphs of low maximum-matching width.
//!
//! A decomposition is a full binary tree whose leaves are the vertices of
//! the graph. Every tree node cuts the graph into the vertices below it and
//! the rest; its width is the size of a maximum matching across that cut,
//! and the MM-width of the tree is the largest width of any node.
//!
//! Trees are built bottom-up or top-down ([`decomp::Constructor`]) and then
//! improved by local search ([`optimize::Optimizer`]). The [`Decomposer`]
//! runs the whole pipeline.

pub mod bipartite;
pub mod cli;
pub mod decomp;
pub mod decomposer;
pub mod error;
pub mod graph;
pub mod graph_loader;
pub mod json;
pub mod matching;
pub mod optimize;
pub mod partition;
pub mod preprocess;
pub mod progress;

pub use decomp::{Constructor, DecompTree};
pub use decomposer::{Decomposer, Decomposition};
pub use error::DecompError;
pub use graph::Graph;
pub use matching::Matcher;
pub use optimize::{Budget, Optimizer};
pub use partition::Partition;

use rand::Rng;

/// Builds an initial decomposition of `graph`.
pub fn construct(
    graph: &Graph,
    constructor: Constructor,
    rng: &mut impl Rng,
) -> Result<DecompTree, DecompError> {
    constructor.construct(graph, &mut Matcher::new(), rng)
}

/// Improves a decomposition of `graph` within `budget`.
pub fn optimize(
    graph: &Graph,
    tree: DecompTree,
    optimizer: Optimizer,
    budget: &Budget,
    rng: &mut impl Rng,
) -> Result<DecompTree, DecompError> {
    optimizer.optimize(graph, &mut Matcher::new(), tree, budget, rng, &mut ())
}

/// The MM-width of a decomposition of `graph`.
pub fn mm_width(graph: &Graph, tree: &DecompTree) -> usize {
    tree.mm_width(graph, &mut Matcher::new())
}
