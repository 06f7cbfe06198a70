//! Hopcroft–Karp maximum matching.
//!
//! Each phase layers side A by a breadth-first search from the free side-A
//! vertices, stopping at the first layer that touches a free side-B vertex.
//! A depth-first search then extracts a maximal set of vertex-disjoint
//! shortest augmenting paths through the layers, and the matching is
//! flipped along all of them at once. Phases repeat until no augmenting path
//! is left.

use crate::bipartite::BipartiteGraph;
use crate::graph::V;

const UNLAYERED: usize = usize::MAX;

/// An augmenting path, given by its unmatched edges `(a, b)` in local
/// indices. Between two consecutive entries runs the matched edge joining
/// the first entry's `b` to the second entry's `a`.
type AugmentingPath = Vec<(usize, usize)>;

struct HopcroftKarp<'a> {
    g: &'a BipartiteGraph,
    mate_a: Vec<Option<usize>>,
    mate_b: Vec<Option<usize>>,
    layer: Vec<usize>,
}

impl<'a> HopcroftKarp<'a> {
    fn new(g: &'a BipartiteGraph) -> Self {
        HopcroftKarp {
            g,
            mate_a: vec![None; g.num_a()],
            mate_b: vec![None; g.num_b()],
            layer: vec![UNLAYERED; g.num_a()],
        }
    }

    fn size(&self) -> usize {
        self.mate_a.iter().filter(|m| m.is_some()).count()
    }

    /// Layers side A and returns the depth of the layer that reaches a free
    /// side-B vertex, if any. Isolated vertices never enter the layering.
    fn build_layers(&mut self) -> Option<usize> {
        let g = self.g;
        self.layer.fill(UNLAYERED);

        let mut frontier: Vec<usize> = (0..g.num_a())
            .filter(|&i| self.mate_a[i].is_none() && g.a_degree(i) > 0)
            .collect();
        let any_free_b = (0..g.num_b()).any(|j| self.mate_b[j].is_none() && g.b_degree(j) > 0);
        if frontier.is_empty() || !any_free_b {
            return None;
        }

        for &i in &frontier {
            self.layer[i] = 0;
        }

        let mut depth = 0;
        loop {
            let mut next = Vec::new();
            let mut reaches_free = false;
            for &i in &frontier {
                for &j in g.a_neighbors(i) {
                    match self.mate_b[j] {
                        None => reaches_free = true,
                        Some(i2) => {
                            if self.layer[i2] == UNLAYERED {
                                self.layer[i2] = depth + 1;
                                next.push(i2);
                            }
                        }
                    }
                }
            }

            if reaches_free {
                return Some(depth);
            }
            if next.is_empty() {
                return None;
            }
            frontier = next;
            depth += 1;
        }
    }

    /// Depth-first search for a shortest augmenting path from side-A vertex
    /// `i`, staying inside the layering. Vertices on a dead end are dropped
    /// from the layering so later searches in the same phase skip them.
    fn find_path(
        &mut self,
        i: usize,
        limit: usize,
        used_b: &mut [bool],
        path: &mut AugmentingPath,
    ) -> bool {
        let g = self.g;
        let depth = self.layer[i];
        for &j in g.a_neighbors(i) {
            if used_b[j] {
                continue;
            }
            match self.mate_b[j] {
                None if depth == limit => {
                    used_b[j] = true;
                    path.push((i, j));
                    return true;
                }
                Some(i2) if depth < limit && self.layer[i2] == depth + 1 => {
                    used_b[j] = true;
                    path.push((i, j));
                    if self.find_path(i2, limit, used_b, path) {
                        return true;
                    }
                    path.pop();
                }
                _ => {}
            }
        }
        self.layer[i] = UNLAYERED;
        false
    }

    /// Finds a maximal set of vertex-disjoint shortest augmenting paths for
    /// the current matching.
    fn augmenting_paths(&mut self) -> Vec<AugmentingPath> {
        let Some(limit) = self.build_layers() else {
            return Vec::new();
        };

        let mut used_b = vec![false; self.g.num_b()];
        let mut paths = Vec::new();
        for i in 0..self.g.num_a() {
            if self.mate_a[i].is_none() && self.layer[i] == 0 {
                let mut path = Vec::new();
                if self.find_path(i, limit, &mut used_b, &mut path) {
                    paths.push(path);
                }
            }
        }
        paths
    }

    /// Takes the symmetric difference of the matching with the given paths.
    fn augment(&mut self, paths: &[AugmentingPath]) {
        for path in paths {
            for &(i, j) in path {
                self.mate_a[i] = Some(j);
                self.mate_b[j] = Some(i);
            }
        }
    }

    fn run(&mut self) {
        loop {
            let paths = self.augmenting_paths();
            if paths.is_empty() {
                return;
            }

            let len = path_len(&paths[0]);
            assert!(
                paths.iter().all(|p| path_len(p) == len),
                "Algorithm error (Hopcroft-Karp): augmenting paths of unequal length in one phase"
            );

            let before = self.size();
            self.augment(&paths);
            debug_assert_eq!(self.size(), before + paths.len());
        }
    }

    fn matching(&self) -> Vec<(V, V)> {
        self.mate_a
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.map(|j| (self.g.a_vertex(i), self.g.b_vertex(j))))
            .collect()
    }
}

/// Number of edges on an augmenting path.
fn path_len(path: &AugmentingPath) -> usize {
    2 * path.len() - 1
}

/// Computes a maximum matching of the bipartite graph, returned as `(a, b)`
/// pairs of graph vertices.
pub fn hopcroft_karp(g: &BipartiteGraph) -> Vec<(V, V)> {
    let mut hk = HopcroftKarp::new(g);
    hk.run();
    hk.matching()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::partition::Partition;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rustc_hash::FxHashSet;

    /// Builds a bipartite graph with side A named `0..na`, side B named
    /// `na..na + nb`, and the given edges between local indices.
    fn bipartite(na: usize, nb: usize, edges: &[(usize, usize)]) -> (Graph, BipartiteGraph) {
        let mut g = Graph::new();
        for i in 0..na + nb {
            g.add_vertex(i);
        }
        for &(a, b) in edges {
            g.add_edge(a, na + b);
        }
        let part = Partition::from_vertices(g.vindex(), 0..na);
        let bg = BipartiteGraph::from_partition(&g, &part);
        (g, bg)
    }

    fn assert_is_matching(g: &Graph, m: &[(V, V)]) {
        let mut seen = FxHashSet::default();
        for &(a, b) in m {
            assert!(g.connected(a, b), "{}-{} is not an edge", a, b);
            assert!(seen.insert(a), "vertex {} matched twice", a);
            assert!(seen.insert(b), "vertex {} matched twice", b);
        }
    }

    /// Exhaustive maximum matching for small graphs.
    fn brute_force(na: usize, edges: &[(usize, usize)]) -> usize {
        fn go(i: usize, na: usize, edges: &[(usize, usize)], used: &mut Vec<usize>) -> usize {
            if i == na {
                return 0;
            }
            let mut best = go(i + 1, na, edges, used);
            for &(a, b) in edges {
                if a == i && !used.contains(&b) {
                    used.push(b);
                    best = best.max(1 + go(i + 1, na, edges, used));
                    used.pop();
                }
            }
            best
        }
        go(0, na, edges, &mut Vec::new())
    }

    #[test]
    fn four_cycle() {
        // A = {1, 2}, B = {3, 4}, edges 1-3, 1-4, 2-3, 2-4
        let (g, bg) = bipartite(2, 2, &[(0, 0), (0, 1), (1, 0), (1, 1)]);
        let m = hopcroft_karp(&bg);
        assert_eq!(m.len(), 2);
        assert_is_matching(&g, &m);
    }

    #[test]
    fn needs_augmentation() {
        // a greedy pass matching 0-0 first has to be repaired through 1-0
        let (g, bg) = bipartite(3, 3, &[(0, 0), (0, 1), (1, 0), (2, 1), (2, 2)]);
        let m = hopcroft_karp(&bg);
        assert_eq!(m.len(), 3);
        assert_is_matching(&g, &m);
    }

    #[test]
    fn no_edges() {
        let (_, bg) = bipartite(3, 2, &[]);
        assert!(hopcroft_karp(&bg).is_empty());
        let (_, bg) = bipartite(0, 0, &[]);
        assert!(hopcroft_karp(&bg).is_empty());
    }

    #[test]
    fn star() {
        let (_, bg) = bipartite(1, 5, &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)]);
        assert_eq!(hopcroft_karp(&bg).len(), 1);
    }

    #[test]
    fn phase_paths_have_equal_length() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let na = rng.random_range(1..8);
            let nb = rng.random_range(1..8);
            let edges: Vec<(usize, usize)> = (0..na)
                .flat_map(|a| (0..nb).map(move |b| (a, b)))
                .filter(|_| rng.random_bool(0.35))
                .collect();
            let (_, bg) = bipartite(na, nb, &edges);

            let mut hk = HopcroftKarp::new(&bg);
            let mut last_len = 0;
            loop {
                let paths = hk.augmenting_paths();
                if paths.is_empty() {
                    break;
                }
                let len = path_len(&paths[0]);
                assert!(paths.iter().all(|p| path_len(p) == len));
                // shortest augmenting paths never get shorter between phases
                assert!(len > last_len);
                last_len = len;
                hk.augment(&paths);
            }
        }
    }

    #[test]
    fn agrees_with_brute_force() {
        let mut rng = SmallRng::seed_from_u64(1234);
        for _ in 0..100 {
            let na = rng.random_range(0..7);
            let nb = rng.random_range(0..7);
            let edges: Vec<(usize, usize)> = (0..na)
                .flat_map(|a| (0..nb).map(move |b| (a, b)))
                .filter(|_| rng.random_bool(0.3))
                .collect();
            let (g, bg) = bipartite(na, nb, &edges);
            let m = hopcroft_karp(&bg);
            assert_is_matching(&g, &m);
            assert_eq!(m.len(), brute_force(na, &edges), "edges: {:?}", edges);
        }
    }
}
