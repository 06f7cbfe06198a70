//! The full decomposition pipeline: strip, construct, optimize, reattach.

use std::time::{Duration, Instant};

use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::decomp::{Constructor, DecompTree};
use crate::error::DecompError;
use crate::graph::Graph;
use crate::matching::Matcher;
use crate::optimize::{Budget, Optimizer};
use crate::preprocess::{reattach, strip};
use crate::progress::ProgressSink;

/// A finished decomposition of a graph.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub tree: DecompTree,
    pub width: usize,
    pub fitness: usize,
    /// Vertices stripped before the search and reattached afterwards.
    pub removed: usize,
    pub elapsed: Duration,
}

/// Configures and runs one decomposition.
///
/// ```
/// use mmwidth::{Decomposer, Graph};
/// use mmwidth::optimize::Budget;
///
/// let g = Graph::grid(3, 3).unwrap();
/// let d = Decomposer::new()
///     .seed(1)
///     .budget(Budget::iterations(20))
///     .run(&g)
///     .unwrap();
/// assert_eq!(d.tree.len(), 17);
/// ```
#[derive(Debug, Clone)]
pub struct Decomposer {
    preprocess: bool,
    constructor: Constructor,
    optimizer: Option<Optimizer>,
    budget: Budget,
    seed: Option<u64>,
}

impl Default for Decomposer {
    fn default() -> Self {
        Decomposer {
            preprocess: false,
            constructor: Constructor::default(),
            optimizer: Some(Optimizer::default()),
            budget: Budget::time(Duration::from_secs(1)),
            seed: None,
        }
    }
}

impl Decomposer {
    pub fn new() -> Self {
        Decomposer::default()
    }

    /// Strip vertices of degree < 2 before the search.
    pub fn preprocess(&mut self, preprocess: bool) -> &mut Self {
        self.preprocess = preprocess;
        self
    }

    pub fn constructor(&mut self, constructor: Constructor) -> &mut Self {
        self.constructor = constructor;
        self
    }

    /// The optimizer run on the initial tree, or `None` to keep it.
    pub fn optimizer(&mut self, optimizer: Option<Optimizer>) -> &mut Self {
        self.optimizer = optimizer;
        self
    }

    /// Budget for the whole run. Construction counts against the time
    /// limit; the iteration cap applies to the optimizer only.
    pub fn budget(&mut self, budget: Budget) -> &mut Self {
        self.budget = budget;
        self
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    pub fn run(&self, graph: &Graph) -> Result<Decomposition, DecompError> {
        self.run_with_sink(graph, &mut ())
    }

    pub fn run_with_sink(
        &self,
        graph: &Graph,
        sink: &mut impl ProgressSink,
    ) -> Result<Decomposition, DecompError> {
        let start = Instant::now();
        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };

        let (reduced, removals) = if self.preprocess {
            strip(graph)
        } else {
            (graph.clone(), Vec::new())
        };

        let mut matcher = Matcher::new();
        let mut tree = self.constructor.construct(&reduced, &mut matcher, &mut rng)?;
        info!(
            "{}: initial width {} after {} ms",
            self.constructor,
            tree.mm_width(&reduced, &mut matcher),
            start.elapsed().as_millis()
        );

        if let Some(optimizer) = &self.optimizer {
            if reduced.num_vertices() > 2 {
                let budget = self.budget.remaining(start.elapsed());
                tree = optimizer.optimize(&reduced, &mut matcher, tree, &budget, &mut rng, sink)?;
            }
        }
        info!(
            "matcher cache: {} cuts, {} hits, {} misses",
            matcher.len(),
            matcher.hits(),
            matcher.misses()
        );

        reattach(&mut tree, &removals)?;
        tree.validate(&graph.vertex_set())?;

        // cuts of the reduced graph differ from those of the full graph
        let mut matcher = Matcher::new();
        let width = tree.mm_width(graph, &mut matcher);
        let fitness = tree.fitness(graph, &mut matcher);
        Ok(Decomposition {
            tree,
            width,
            fitness,
            removed: removals.len(),
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomp::{BottomUpHeuristic, Neighborhood};
    use crate::matching::MatcherKind;
    use crate::optimize::AnnealingParams;
    use crate::progress::Progress;
    use rstest::rstest;

    /// A 3x3 grid with a pendant path of length two on one corner.
    fn grid_with_tail() -> Graph {
        let mut g = Graph::grid(3, 3).unwrap();
        let corner = g.vertex_named(0).unwrap();
        let a = g.add_vertex(5000);
        let b = g.add_vertex(5001);
        g.add_edge(corner, a);
        g.add_edge(a, b);
        g
    }

    #[rstest]
    #[case(Constructor::default(), None)]
    #[case(Constructor::TopDown, Some(Optimizer::Sharmin { balanced: true }))]
    #[case(
        Constructor::BottomUp(BottomUpHeuristic::CompletelyRandom, MatcherKind::HopcroftKarp),
        Some(Optimizer::Annealing(AnnealingParams {
            operator: Neighborhood::UncleSwap,
            ..AnnealingParams::default()
        }))
    )]
    #[case(
        Constructor::BottomUp(BottomUpHeuristic::SmallestGreedy, MatcherKind::Greedy),
        Some(Optimizer::LocalSearch(Neighborhood::UncleSwap))
    )]
    fn pipeline_produces_full_trees(
        #[case] constructor: Constructor,
        #[case] optimizer: Option<Optimizer>,
        #[values(false, true)] preprocess: bool,
    ) {
        let g = grid_with_tail();
        let d = Decomposer::new()
            .constructor(constructor)
            .optimizer(optimizer)
            .preprocess(preprocess)
            .budget(Budget::iterations(25))
            .seed(42)
            .run(&g)
            .unwrap();
        assert_eq!(d.tree.len(), 2 * 11 - 1);
        assert!(d.tree.validate(&g.vertex_set()).is_ok());
        assert_eq!(d.removed, if preprocess { 2 } else { 0 });
        assert!(d.width >= 1);
    }

    #[test]
    fn same_seed_same_tree() {
        let g = Graph::grid(3, 4).unwrap();
        let mut dec = Decomposer::new();
        dec.constructor(Constructor::BottomUp(
            BottomUpHeuristic::RandomGreedy,
            MatcherKind::HopcroftKarp,
        ))
        .budget(Budget::iterations(30))
        .seed(7);
        let a = dec.run(&g).unwrap();
        let b = dec.run(&g).unwrap();
        assert_eq!(a.tree.edges(), b.tree.edges());
        assert_eq!(a.fitness, b.fitness);
    }

    #[test]
    fn progress_is_reported() {
        let g = Graph::grid(3, 3).unwrap();
        let mut events: Vec<Progress> = Vec::new();
        let d = Decomposer::new()
            .budget(Budget::iterations(10))
            .seed(3)
            .run_with_sink(&g, &mut events)
            .unwrap();
        assert!(!events.is_empty());
        assert_eq!(events.last().map(|p| p.width), Some(d.width));
    }

    #[test]
    fn tiny_graphs() {
        let mut g = Graph::new();
        let d = Decomposer::new().seed(0).run(&g).unwrap();
        assert!(d.tree.is_empty());
        assert_eq!(d.width, 0);

        g.add_vertex(1);
        let d = Decomposer::new().seed(0).preprocess(true).run(&g).unwrap();
        assert_eq!(d.tree.len(), 1);
    }
}
