//! Top-down construction by balanced, matching-minimizing splits.
//!
//! The split heuristic follows Sharmin's construction for boolean-width:
//! grow one side of the cut, first at random and then greedily, and keep
//! the best cut seen whose sides both hold at least a third of the vertices.

use log::debug;
use rand::Rng;

use super::DecompTree;
use crate::error::DecompError;
use crate::graph::{Graph, V};
use crate::matching::Matcher;
use crate::partition::Partition;

/// Splits `label` in two and returns one side; the other is its complement
/// within `label`. `label` must hold at least two vertices.
pub fn split(
    graph: &Graph,
    matcher: &mut Matcher,
    label: &Partition,
    rng: &mut impl Rng,
) -> Result<Partition, DecompError> {
    let k = label.len();
    let half = k.div_ceil(2);
    let third = k.div_ceil(3);

    let mut part = Partition::new(label.width());
    let mut rest = label.clone();
    let mut best: Option<(usize, Partition)> = None;

    if *label != graph.vertex_set() {
        let mut pool: Vec<V> = label.iter().collect();
        while part.len() < half {
            let v = pool.swap_remove(rng.random_range(0..pool.len()));
            part.insert(v);
            rest.remove(v);
            if part.len() >= third && rest.len() >= third {
                let size = matcher.split_width(graph, &part, &rest);
                if best.as_ref().map_or(true, |(s, _)| size < *s) {
                    best = Some((size, part.clone()));
                }
            }
        }
    }

    while rest.len() > third {
        let mut top = None;
        for v in rest.iter() {
            let mut p = part.clone();
            p.insert(v);
            let mut r = rest.clone();
            r.remove(v);
            let size = matcher.split_width(graph, &p, &r);
            if top.map_or(true, |(s, _)| size < s) {
                top = Some((size, v));
            }
        }
        let (size, v) = top.ok_or_else(|| {
            DecompError::Invariant(format!("no vertex left to move while splitting {}", label))
        })?;

        part.insert(v);
        rest.remove(v);
        if part.len() >= third
            && rest.len() >= third
            && best.as_ref().map_or(true, |(s, _)| size < *s)
        {
            best = Some((size, part.clone()));
        }
    }

    best.map(|(_, p)| p)
        .ok_or_else(|| DecompError::Invariant(format!("no balanced split of {}", label)))
}

/// Recursively splits the leaf `node` until every leaf below it is a
/// singleton.
pub fn split_below(
    graph: &Graph,
    matcher: &mut Matcher,
    tree: &mut DecompTree,
    node: usize,
    rng: &mut impl Rng,
) -> Result<(), DecompError> {
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        let label = tree.label(n).clone();
        if label.len() <= 1 {
            continue;
        }
        let a = split(graph, matcher, &label, rng)?;
        let b = label.difference(&a);
        for side in [a, b] {
            let child = tree.add_node(side);
            tree.connect_child(n, child);
            stack.push(child);
        }
    }
    Ok(())
}

/// Builds a decomposition from the root down.
pub fn top_down(
    graph: &Graph,
    matcher: &mut Matcher,
    rng: &mut impl Rng,
) -> Result<DecompTree, DecompError> {
    let all = graph.vertex_set();
    let n = all.len();
    let mut tree = DecompTree::new(graph.vindex());
    if n == 0 {
        return Ok(tree);
    }

    let root = tree.add_node(all);
    split_below(graph, matcher, &mut tree, root, rng)?;

    if tree.len() != 2 * n - 1 {
        return Err(DecompError::Invariant(format!(
            "top-down construction made {} nodes for {} vertices",
            tree.len(),
            n
        )));
    }
    debug!("Sharmin: built tree with {} nodes", tree.len());
    Ok(tree)
}

/// Proposes a new split of `y`'s parent by trading random vertices between
/// the siblings `y` and `z`. Returns the new side replacing `y`.
///
/// With `balanced`, each side keeps at least a third of the parent's
/// vertices.
pub fn random_swap(
    tree: &DecompTree,
    y: usize,
    z: usize,
    balanced: bool,
    rng: &mut impl Rng,
) -> Partition {
    let py = tree.label(y);
    let pz = tree.label(z);
    let (bound_y, bound_z) = if balanced {
        let parent = tree.parent(y).map_or(0, |p| tree.label(p).len());
        (
            py.len().saturating_sub(parent / 3),
            pz.len().saturating_sub(parent / 3),
        )
    } else {
        (py.len(), pz.len())
    };
    let i = if bound_y == 0 { 0 } else { rng.random_range(0..bound_y) };
    let j = if bound_z == 0 { 0 } else { rng.random_range(0..bound_z) };

    let from_y = random_subset(py, i, rng);
    let from_z = random_subset(pz, j, rng);
    let mut a = py.difference(&from_y);
    a.union_with(&from_z);
    a
}

/// `count` distinct vertices of `set`, chosen uniformly.
fn random_subset(set: &Partition, count: usize, rng: &mut impl Rng) -> Partition {
    let mut pool: Vec<V> = set.iter().collect();
    let mut chosen = Partition::new(set.width());
    for _ in 0..count {
        chosen.insert(pool.swap_remove(rng.random_range(0..pool.len())));
    }
    chosen
}
