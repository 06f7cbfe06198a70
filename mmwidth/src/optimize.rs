//! Local search over complete decomposition trees.
pub mod annealer;
pub mod local_search;
pub mod memo;

pub use annealer::Annealer;
pub use local_search::local_search;
pub use memo::SharminOptimizer;

use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::decomp::{DecompTree, Neighborhood};
use crate::error::DecompError;
use crate::graph::Graph;
use crate::matching::Matcher;
use crate::progress::ProgressSink;

/// When an optimizer has to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub time: Duration,
    pub max_iterations: Option<usize>,
}

impl Budget {
    /// Stop after `time` of wall-clock time.
    pub fn time(time: Duration) -> Self {
        Budget {
            time,
            max_iterations: None,
        }
    }

    /// Stop after `n` iterations, however long they take.
    pub fn iterations(n: usize) -> Self {
        Budget {
            time: Duration::MAX,
            max_iterations: Some(n),
        }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// What is left after `spent` has been used up.
    pub fn remaining(&self, spent: Duration) -> Self {
        Budget {
            time: self.time.saturating_sub(spent),
            max_iterations: self.max_iterations,
        }
    }

    pub fn exhausted(&self, start: Instant, iterations: usize) -> bool {
        self.max_iterations.is_some_and(|m| iterations >= m) || start.elapsed() >= self.time
    }
}

/// Parameters of simulated annealing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingParams {
    pub operator: Neighborhood,
    pub start_temp: f64,
    /// Factor applied to the temperature at each cooling step.
    pub multiplier: f64,
    /// Iterations between cooling steps; `None` means the square root of
    /// the number of vertices.
    pub period: Option<usize>,
    /// Once the temperature drops to this, it is reset to `start_temp`.
    pub floor: f64,
    pub restart_from_best: bool,
}

impl Default for AnnealingParams {
    fn default() -> Self {
        AnnealingParams {
            operator: Neighborhood::TwoSwap,
            start_temp: 15.0,
            multiplier: 0.99,
            period: None,
            floor: 1.0,
            restart_from_best: false,
        }
    }
}

/// How an initial decomposition is improved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Optimizer {
    Annealing(AnnealingParams),
    LocalSearch(Neighborhood),
    Sharmin { balanced: bool },
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::Annealing(AnnealingParams::default())
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Optimizer::Annealing(p) => write!(f, "SA{}", p.operator),
            Optimizer::LocalSearch(op) => write!(f, "ILS{}", op),
            Optimizer::Sharmin { balanced: true } => write!(f, "SharminHKb"),
            Optimizer::Sharmin { balanced: false } => write!(f, "SharminHKub"),
        }
    }
}

impl Optimizer {
    /// Improves `tree` within `budget` and returns the best decomposition
    /// found. New best solutions are reported to `sink`.
    pub fn optimize(
        &self,
        graph: &Graph,
        matcher: &mut Matcher,
        tree: DecompTree,
        budget: &Budget,
        rng: &mut impl Rng,
        sink: &mut impl ProgressSink,
    ) -> Result<DecompTree, DecompError> {
        match self {
            Optimizer::Annealing(params) => Annealer::from_decomp(graph, tree, rng)
                .set_params(params)
                .run(matcher, budget, sink),
            Optimizer::LocalSearch(op) => local_search(graph, matcher, tree, *op, budget, sink),
            Optimizer::Sharmin { balanced } => {
                SharminOptimizer::new(*balanced).optimize(graph, matcher, tree, budget, rng, sink)
            }
        }
    }
}
