//! Removal of low-degree vertices before decomposition, and their
//! reinsertion into the finished tree.
//!
//! A vertex of degree at most one never raises the MM-width: it can always
//! hang next to its neighbour's leaf. Stripping such vertices repeatedly
//! shrinks trees, paths and pendant chains away before the expensive search.

use log::info;

use crate::decomp::DecompTree;
use crate::error::DecompError;
use crate::graph::{Graph, V};

/// A vertex removed by [`strip`], with its only neighbour at that time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub vertex: V,
    pub neighbor: Option<V>,
}

/// Repeatedly removes vertices of degree less than two while the graph has
/// more than one edge. Returns the reduced graph and the removals in order.
///
/// The reduced graph keeps the vertex indices of `graph`, so trees over it
/// use the same partition width.
pub fn strip(graph: &Graph) -> (Graph, Vec<Removal>) {
    let mut g = graph.clone();
    let mut removals = Vec::new();
    let mut stack: Vec<V> = g.vertices().collect();

    while let Some(v) = stack.pop() {
        if g.contains_vertex(v) && g.degree(v) < 2 && g.num_edges() > 1 {
            let neighbor = g.neighbors(v).next();
            g.remove_vertex(v);
            removals.push(Removal { vertex: v, neighbor });
            stack.extend(neighbor);
        }
    }

    info!(
        "removed {} vertices of degree < 2 ({} left)",
        removals.len(),
        g.num_vertices()
    );
    (g, removals)
}

/// Puts the vertices removed by [`strip`] back into a decomposition of the
/// reduced graph, most recent removal first.
///
/// Each vertex gets a new leaf, paired under a new node with the leaf of
/// its former neighbour. Isolated vertices pair with the last singleton leaf
/// of the tree. Every ancestor of the new pair gains the vertex.
pub fn reattach(tree: &mut DecompTree, removals: &[Removal]) -> Result<(), DecompError> {
    for r in removals.iter().rev() {
        let anchor = match r.neighbor {
            Some(u) => tree.find_leaf(u),
            None => tree
                .node_indices()
                .filter(|&n| tree.is_leaf(n) && tree.label(n).len() == 1)
                .last(),
        }
        .ok_or_else(|| {
            DecompError::Invariant(format!("no leaf to reattach vertex {} to", r.vertex))
        })?;

        let leaf = tree.add_leaf(r.vertex);
        let pair = tree.add_node(tree.label(anchor).union(tree.label(leaf)));
        if let Some(p) = tree.parent(anchor) {
            tree.disconnect_child(p, anchor);
            tree.connect_child(p, pair);
        }
        tree.connect_child(pair, anchor);
        tree.connect_child(pair, leaf);

        for a in tree.ancestors(pair) {
            let mut label = tree.label(a).clone();
            label.insert(r.vertex);
            tree.set_label(a, label);
        }
    }
    Ok(())
}
