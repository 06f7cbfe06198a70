//! Bottom-up construction by repeatedly merging two frontier nodes.

use derive_more::Display;
use itertools::Itertools;
use log::debug;
use rand::Rng;

use super::DecompTree;
use crate::error::DecompError;
use crate::graph::Graph;
use crate::matching::{Matcher, MatcherKind};

/// How the next pair of frontier nodes is chosen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
pub enum BottomUpHeuristic {
    /// Try every pair and merge the one with the smallest cut.
    #[default]
    #[display("allPairsGreedy")]
    AllPairsGreedy,
    /// Fix a random node and merge it with its best partner.
    #[display("randomGreedy")]
    RandomGreedy,
    /// Fix the node with the fewest vertices and merge it with its best partner.
    #[display("smallestGreedy")]
    SmallestGreedy,
    /// Merge two random nodes.
    #[display("completelyRandom")]
    CompletelyRandom,
}

/// Builds a decomposition by merging frontier nodes until one is left.
///
/// The frontier starts with one leaf per vertex. Ties between candidate
/// pairs go to the first one found in frontier order.
pub fn bottom_up(
    graph: &Graph,
    matcher: &mut Matcher,
    heuristic: BottomUpHeuristic,
    kind: MatcherKind,
    rng: &mut impl Rng,
) -> Result<DecompTree, DecompError> {
    let mut tree = DecompTree::new(graph.vindex());
    let mut frontier: Vec<usize> = graph.vertices().map(|v| tree.add_leaf(v)).collect();

    while frontier.len() > 1 {
        let (i, j) = match heuristic {
            BottomUpHeuristic::AllPairsGreedy => best_pair(graph, matcher, kind, &tree, &frontier),
            BottomUpHeuristic::RandomGreedy => {
                let i = rng.random_range(0..frontier.len());
                (i, best_partner(graph, matcher, kind, &tree, &frontier, i))
            }
            BottomUpHeuristic::SmallestGreedy => {
                let i = (0..frontier.len())
                    .min_by_key(|&i| tree.label(frontier[i]).len())
                    .unwrap_or(0);
                (i, best_partner(graph, matcher, kind, &tree, &frontier, i))
            }
            BottomUpHeuristic::CompletelyRandom => {
                let i = rng.random_range(0..frontier.len());
                let mut j = rng.random_range(0..frontier.len() - 1);
                if j >= i {
                    j += 1;
                }
                (i, j)
            }
        };

        let (a, b) = (frontier[i], frontier[j]);
        let merged = tree.add_node(tree.label(a).union(tree.label(b)));
        tree.connect_child(merged, a);
        tree.connect_child(merged, b);

        frontier.remove(i.max(j));
        frontier.remove(i.min(j));
        frontier.push(merged);
    }

    debug!(
        "BU{}{}: built tree with {} nodes",
        heuristic,
        kind,
        tree.len()
    );
    tree.validate(&graph.vertex_set())?;
    Ok(tree)
}

/// The frontier position whose merge with position `i` has the smallest cut.
fn best_partner(
    graph: &Graph,
    matcher: &mut Matcher,
    kind: MatcherKind,
    tree: &DecompTree,
    frontier: &[usize],
    i: usize,
) -> usize {
    let mut best = None;
    for j in 0..frontier.len() {
        if j == i {
            continue;
        }
        let label = tree.label(frontier[i]).union(tree.label(frontier[j]));
        let size = matcher.score(kind, graph, &label);
        if best.map_or(true, |(s, _)| size < s) {
            best = Some((size, j));
        }
    }
    best.map(|(_, j)| j).expect("frontier has at least two nodes")
}

/// The pair of frontier positions whose merge has the smallest cut.
fn best_pair(
    graph: &Graph,
    matcher: &mut Matcher,
    kind: MatcherKind,
    tree: &DecompTree,
    frontier: &[usize],
) -> (usize, usize) {
    let mut best = None;
    for (i, j) in (0..frontier.len()).tuple_combinations() {
        let label = tree.label(frontier[i]).union(tree.label(frontier[j]));
        let size = matcher.score(kind, graph, &label);
        if best.map_or(true, |(s, _, _)| size < s) {
            best = Some((size, i, j));
        }
    }
    best.map(|(_, i, j)| (i, j))
        .expect("frontier has at least two nodes")
}
