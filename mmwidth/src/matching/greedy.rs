//! Fast greedy maximal matching.

use crate::bipartite::BipartiteGraph;
use crate::graph::V;

/// Computes a maximal (not necessarily maximum) matching by scanning side A
/// and pairing each vertex with its first unmatched neighbour.
pub fn greedy_matching(g: &BipartiteGraph) -> Vec<(V, V)> {
    let mut matched_b = vec![false; g.num_b()];
    let mut matching = Vec::new();
    for i in 0..g.num_a() {
        if let Some(&j) = g.a_neighbors(i).iter().find(|&&j| !matched_b[j]) {
            matched_b[j] = true;
            matching.push((g.a_vertex(i), g.b_vertex(j)));
        }
    }
    matching
}
