//! Bipartite matchings across the cut of a vertex subset.
pub mod greedy;
pub mod hopcroft_karp;

pub use greedy::greedy_matching;
pub use hopcroft_karp::hopcroft_karp;

use derive_more::Display;
use rustc_hash::FxHashMap;

use crate::bipartite::BipartiteGraph;
use crate::graph::{Graph, V};
use crate::partition::Partition;

/// The matching algorithm used to score a cut.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
pub enum MatcherKind {
    /// Maximum matching (Hopcroft–Karp), cached by partition.
    #[default]
    #[display("HK")]
    HopcroftKarp,
    /// Greedy maximal matching. Cheaper, only an estimate, never cached.
    #[display("fastMax")]
    Greedy,
}

impl MatcherKind {
    /// The matched `(a, b)` pairs of graph vertices.
    pub fn matching(&self, g: &BipartiteGraph) -> Vec<(V, V)> {
        match self {
            MatcherKind::HopcroftKarp => hopcroft_karp(g),
            MatcherKind::Greedy => greedy_matching(g),
        }
    }
}

/// Maximum-matching sizes of cuts, memoized by the side-A subset.
///
/// Cache keys are bit patterns, not graph identities: one matcher must only
/// ever be used with a single graph. Call [`Matcher::clear`] before reusing it
/// on another one.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    cache: FxHashMap<Partition, usize>,
    hits: usize,
    misses: usize,
}

impl Matcher {
    pub fn new() -> Self {
        Matcher::default()
    }

    /// Size of a maximum matching between `part` and the rest of the graph.
    pub fn matching_size(&mut self, graph: &Graph, part: &Partition) -> usize {
        if let Some(&size) = self.cache.get(part) {
            self.hits += 1;
            return size;
        }
        self.misses += 1;
        let size = MatcherKind::HopcroftKarp
            .matching(&BipartiteGraph::from_partition(graph, part))
            .len();
        self.cache.insert(part.clone(), size);
        size
    }

    /// The larger of the two cut sizes of a candidate split.
    pub fn split_width(&mut self, graph: &Graph, a: &Partition, b: &Partition) -> usize {
        self.matching_size(graph, a).max(self.matching_size(graph, b))
    }

    /// Scores a cut with the given algorithm. Only maximum matchings go
    /// through the cache.
    pub fn score(&mut self, kind: MatcherKind, graph: &Graph, part: &Partition) -> usize {
        match kind {
            MatcherKind::HopcroftKarp => self.matching_size(graph, part),
            MatcherKind::Greedy => kind
                .matching(&BipartiteGraph::from_partition(graph, part))
                .len(),
        }
    }

    /// Get the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Get the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Number of cached cuts.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Forget every cached cut and reset the counters.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
