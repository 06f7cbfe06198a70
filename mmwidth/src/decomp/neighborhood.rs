//! Neighbourhood operators for local search over decomposition trees.
//!
//! Every operator works on a copy of the current tree and leaves it a
//! complete decomposition of the same vertex set.

use derive_more::Display;
use rand::Rng;

use super::sharmin::{random_swap, split_below};
use super::DecompTree;
use crate::error::DecompError;
use crate::graph::Graph;
use crate::matching::Matcher;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
pub enum Neighborhood {
    /// Swap a node with its parent's sibling.
    #[default]
    #[display("uncleSwap")]
    UncleSwap,
    /// Swap two subtrees anywhere in the tree.
    #[display("twoSwap")]
    TwoSwap,
    /// Re-split an internal node and rebuild everything below it.
    #[display("Sharmin")]
    Sharmin,
}

impl Neighborhood {
    /// A random neighbour of `tree`.
    pub fn neighbor(
        &self,
        graph: &Graph,
        matcher: &mut Matcher,
        tree: &DecompTree,
        rng: &mut impl Rng,
    ) -> Result<DecompTree, DecompError> {
        match self {
            Neighborhood::UncleSwap => Ok(random_uncle_swap(tree, rng)),
            Neighborhood::TwoSwap => Ok(random_two_swap(tree, rng)),
            Neighborhood::Sharmin => sharmin_neighbor(graph, matcher, tree, rng),
        }
    }

    /// The best neighbour of `tree`. Only the uncle swap has an exhaustive
    /// variant.
    pub fn best_neighbor(
        &self,
        graph: &Graph,
        matcher: &mut Matcher,
        tree: &DecompTree,
    ) -> Result<DecompTree, DecompError> {
        match self {
            Neighborhood::UncleSwap => best_uncle_swap(graph, matcher, tree),
            _ => Err(DecompError::Unsupported(format!(
                "no best-neighbour search for the {} operator",
                self
            ))),
        }
    }
}

/// Swaps a random node that has a grandparent with its uncle. Trees too
/// shallow for the move are returned unchanged.
pub fn random_uncle_swap(tree: &DecompTree, rng: &mut impl Rng) -> DecompTree {
    let mut neighbor = tree.clone();
    let candidates: Vec<usize> = tree
        .node_indices()
        .filter(|&n| tree.grandparent(n).is_some())
        .collect();
    if !candidates.is_empty() {
        let v = candidates[rng.random_range(0..candidates.len())];
        neighbor.swap_uncle(v);
    }
    neighbor
}

/// Tries every uncle swap and returns the neighbour of smallest MM-width.
///
/// A swap at `v` is only evaluated when it can matter: once a neighbour at
/// most as wide as `tree` is known, nodes whose parent's cut is already
/// below the current width are skipped, as are swaps that do not shrink the
/// parent's cut. The result can be wider than `tree` if it is a local
/// optimum.
///
/// Fails with [`DecompError::Invariant`] when no node has a grandparent, since
/// such a tree has no uncle swap at all.
pub fn best_uncle_swap(
    graph: &Graph,
    matcher: &mut Matcher,
    tree: &DecompTree,
) -> Result<DecompTree, DecompError> {
    let original = tree.mm_width(graph, matcher);
    let mut improved = false;
    let mut best: Option<(usize, DecompTree)> = None;

    for v in tree.node_indices() {
        let (Some(dad), Some(_)) = (tree.parent(v), tree.grandparent(v)) else {
            continue;
        };
        let uncle = tree.sibling(dad).ok_or_else(|| {
            DecompError::Invariant(format!("node {} has a grandparent but no uncle", v))
        })?;

        let dad_size = matcher.matching_size(graph, tree.label(dad));
        if dad_size < original && improved {
            continue;
        }
        let swapped = tree
            .label(dad)
            .difference(tree.label(v))
            .union(tree.label(uncle));
        if matcher.matching_size(graph, &swapped) >= dad_size && improved {
            continue;
        }

        let mut neighbor = tree.clone();
        neighbor.swap_uncle(v);
        let width = neighbor.mm_width(graph, matcher);
        if best.as_ref().map_or(true, |(w, _)| width < *w) {
            if width <= original {
                improved = true;
            }
            best = Some((width, neighbor));
        }
    }

    best.map(|(_, t)| t).ok_or_else(|| {
        DecompError::Invariant(format!(
            "no uncle swap exists in a tree with {} nodes",
            tree.len()
        ))
    })
}

/// Swaps two random subtrees that are not nested. Trees with fewer than
/// three nodes are returned unchanged.
pub fn random_two_swap(tree: &DecompTree, rng: &mut impl Rng) -> DecompTree {
    let mut neighbor = tree.clone();
    let nodes: Vec<usize> = tree.node_indices().collect();
    if nodes.len() < 3 {
        return neighbor;
    }
    loop {
        let a = nodes[rng.random_range(0..nodes.len())];
        let b = nodes[rng.random_range(0..nodes.len())];
        if a != b && !tree.is_ancestor(a, b) && !tree.is_ancestor(b, a) {
            neighbor.swap_subtrees(a, b);
            return neighbor;
        }
    }
}

/// Picks a random internal node, re-splits it by trading vertices between
/// its children, and rebuilds both new children top-down.
pub fn sharmin_neighbor(
    graph: &Graph,
    matcher: &mut Matcher,
    tree: &DecompTree,
    rng: &mut impl Rng,
) -> Result<DecompTree, DecompError> {
    let mut neighbor = tree.clone();
    let internal: Vec<usize> = tree
        .node_indices()
        .filter(|&n| tree.children(n).len() == 2)
        .collect();
    if internal.is_empty() {
        return Ok(neighbor);
    }

    let r = internal[rng.random_range(0..internal.len())];
    let (y, z) = (tree.children(r)[0], tree.children(r)[1]);
    let a = random_swap(tree, y, z, false, rng);
    let b = tree.label(r).difference(&a);

    neighbor.remove_descendants(r);
    for side in [a, b] {
        let child = neighbor.add_node(side);
        neighbor.connect_child(r, child);
        split_below(graph, matcher, &mut neighbor, child, rng)?;
    }
    Ok(neighbor)
}
