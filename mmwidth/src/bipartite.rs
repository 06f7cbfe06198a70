//! The bipartite graph induced by cutting a graph along a vertex subset.

use crate::graph::{Graph, V};
use crate::partition::Partition;

/// Read-only view of the edges crossing a cut.
///
/// Side A holds the vertices of the partition, side B every other live vertex
/// of the graph. Only edges with one endpoint on each side are retained.
/// Vertices are addressed by local indices (`0..num_a()` and `0..num_b()`);
/// [`BipartiteGraph::a_vertex`] and [`BipartiteGraph::b_vertex`] map them
/// back to graph vertices.
#[derive(Debug, Clone)]
pub struct BipartiteGraph {
    a: Vec<V>,
    b: Vec<V>,
    adj: Vec<Vec<usize>>,
    b_degree: Vec<usize>,
    num_edges: usize,
}

impl BipartiteGraph {
    pub fn from_partition(graph: &Graph, part: &Partition) -> Self {
        let mut a = Vec::new();
        let mut b = Vec::new();
        // local index of every graph vertex on its own side
        let mut local = vec![usize::MAX; graph.vindex()];
        for v in graph.vertices() {
            if part.contains(v) {
                local[v] = a.len();
                a.push(v);
            } else {
                local[v] = b.len();
                b.push(v);
            }
        }

        let mut adj = vec![Vec::new(); a.len()];
        let mut b_degree = vec![0; b.len()];
        let mut num_edges = 0;
        for (i, &v) in a.iter().enumerate() {
            for w in graph.neighbors(v) {
                if !part.contains(w) {
                    let j = local[w];
                    adj[i].push(j);
                    b_degree[j] += 1;
                    num_edges += 1;
                }
            }
        }

        BipartiteGraph {
            a,
            b,
            adj,
            b_degree,
            num_edges,
        }
    }

    pub fn num_a(&self) -> usize {
        self.a.len()
    }

    pub fn num_b(&self) -> usize {
        self.b.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn a_vertex(&self, i: usize) -> V {
        self.a[i]
    }

    pub fn b_vertex(&self, j: usize) -> V {
        self.b[j]
    }

    /// Local indices of the side-B neighbours of side-A vertex `i`.
    pub fn a_neighbors(&self, i: usize) -> &[usize] {
        &self.adj[i]
    }

    pub fn a_degree(&self, i: usize) -> usize {
        self.adj[i].len()
    }

    pub fn b_degree(&self, j: usize) -> usize {
        self.b_degree[j]
    }

    /// The crossing edges as `(a, b)` pairs of graph vertices.
    pub fn edges(&self) -> impl Iterator<Item = (V, V)> + '_ {
        self.adj
            .iter()
            .enumerate()
            .flat_map(move |(i, nhd)| nhd.iter().map(move |&j| (self.a[i], self.b[j])))
    }
}
