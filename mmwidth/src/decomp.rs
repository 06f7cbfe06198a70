//! Decomposition trees and the heuristics that build them.
pub mod bottom_up;
pub mod decomp_tree;
pub mod neighborhood;
pub mod sharmin;

pub use bottom_up::{bottom_up, BottomUpHeuristic};
pub use decomp_tree::{DecompNode, DecompTree, WIDTH_WEIGHT};
pub use neighborhood::Neighborhood;
pub use sharmin::{split, top_down};

use std::fmt;

use rand::Rng;

use crate::error::DecompError;
use crate::graph::Graph;
use crate::matching::{Matcher, MatcherKind};

/// How an initial decomposition is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constructor {
    BottomUp(BottomUpHeuristic, MatcherKind),
    TopDown,
}

impl Default for Constructor {
    fn default() -> Self {
        Constructor::BottomUp(BottomUpHeuristic::default(), MatcherKind::default())
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constructor::BottomUp(h, k) => write!(f, "BU{}{}", h, k),
            Constructor::TopDown => write!(f, "Sharmin"),
        }
    }
}

impl Constructor {
    pub fn construct(
        &self,
        graph: &Graph,
        matcher: &mut Matcher,
        rng: &mut impl Rng,
    ) -> Result<DecompTree, DecompError> {
        match *self {
            Constructor::BottomUp(heuristic, kind) => bottom_up(graph, matcher, heuristic, kind, rng),
            Constructor::TopDown => top_down(graph, matcher, rng),
        }
    }
}
