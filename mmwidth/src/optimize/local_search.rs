use std::time::Instant;

use log::info;

use super::Budget;
use crate::decomp::{DecompTree, Neighborhood};
use crate::error::DecompError;
use crate::graph::Graph;
use crate::matching::Matcher;
use crate::progress::{Progress, ProgressSink};

/// Repeatedly moves to the best neighbour while that strictly lowers the
/// MM-width. Stops at a local optimum or when the budget runs out.
pub fn local_search(
    graph: &Graph,
    matcher: &mut Matcher,
    tree: DecompTree,
    operator: Neighborhood,
    budget: &Budget,
    sink: &mut impl ProgressSink,
) -> Result<DecompTree, DecompError> {
    let start = Instant::now();
    let mut best = tree;
    let mut best_width = best.mm_width(graph, matcher);
    let mut iterations = 0;
    sink.report(Progress {
        width: best_width,
        fitness: best.fitness(graph, matcher),
        elapsed: start.elapsed(),
        iterations,
    });

    while !budget.exhausted(start, iterations) {
        let neighbor = operator.best_neighbor(graph, matcher, &best)?;
        iterations += 1;
        let width = neighbor.mm_width(graph, matcher);
        if width >= best_width {
            break;
        }
        best = neighbor;
        best_width = width;
        sink.report(Progress {
            width,
            fitness: best.fitness(graph, matcher),
            elapsed: start.elapsed(),
            iterations,
        });
    }

    info!(
        "ILS{}: width {} after {} iterations",
        operator, best_width, iterations
    );
    Ok(best)
}
