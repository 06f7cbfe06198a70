//! Memoized top-down improvement of decomposition subtrees.
//!
//! The optimizer keeps, for every vertex subset it has seen as the label of
//! a complete subtree, the best such subtree found so far. Each round it
//! re-splits the root and works its way down, accepting a new split only if
//! both of its cuts are narrower than the best complete decomposition, and
//! reusing remembered subtrees wherever they already beat that width.

use std::time::Instant;

use log::{debug, info};
use rand::Rng;
use rustc_hash::FxHashMap;

use super::Budget;
use crate::decomp::sharmin::{random_swap, split};
use crate::decomp::DecompTree;
use crate::error::DecompError;
use crate::graph::Graph;
use crate::matching::Matcher;
use crate::partition::Partition;
use crate::progress::{Progress, ProgressSink};

#[derive(Debug, Clone)]
struct BestEntry {
    tree: DecompTree,
    width: usize,
    fitness: usize,
}

/// The best-subtree table plus the search that fills it.
///
/// Like the matcher cache, the table is keyed by bit pattern only. Call
/// [`SharminOptimizer::clear`] before reusing an optimizer on another graph.
#[derive(Debug, Clone, Default)]
pub struct SharminOptimizer {
    best: FxHashMap<Partition, BestEntry>,
    balanced: bool,
}

impl SharminOptimizer {
    /// With `balanced`, every re-split keeps at least a third of the
    /// parent's vertices on each side. Trees not built top-down usually
    /// violate that bound and should be optimized unbalanced.
    pub fn new(balanced: bool) -> Self {
        SharminOptimizer {
            best: FxHashMap::default(),
            balanced,
        }
    }

    /// Number of remembered subtrees.
    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// The best complete subtree known for `label`.
    pub fn best(&self, label: &Partition) -> Option<&DecompTree> {
        self.best.get(label).map(|e| &e.tree)
    }

    pub fn clear(&mut self) {
        self.best.clear();
    }

    /// Remembers `tree` under its root label if it beats what is known.
    fn record(&mut self, graph: &Graph, matcher: &mut Matcher, tree: DecompTree) {
        let Some(root) = tree.root() else {
            return;
        };
        let fitness = tree.fitness(graph, matcher);
        let label = tree.label(root).clone();
        if self
            .best
            .get(&label)
            .map_or(true, |e| fitness < e.fitness)
        {
            let width = tree.mm_width(graph, matcher);
            self.best.insert(
                label,
                BestEntry {
                    tree,
                    width,
                    fitness,
                },
            );
        }
    }

    /// Remembers every complete subtree of `tree` whose label is new.
    fn seed(&mut self, graph: &Graph, matcher: &mut Matcher, tree: &DecompTree) {
        for n in tree.node_indices() {
            if !self.best.contains_key(tree.label(n)) && tree.is_complete_below(n) {
                self.record(graph, matcher, tree.copy_subtree(n));
            }
        }
    }

    fn width_of(&self, label: &Partition) -> Result<usize, DecompError> {
        self.best
            .get(label)
            .map(|e| e.width)
            .ok_or_else(|| DecompError::Invariant(format!("no complete subtree known for {}", label)))
    }

    /// Improves `tree` until the budget runs out and returns the best
    /// complete decomposition found.
    pub fn optimize(
        &mut self,
        graph: &Graph,
        matcher: &mut Matcher,
        tree: DecompTree,
        budget: &Budget,
        rng: &mut impl Rng,
        sink: &mut impl ProgressSink,
    ) -> Result<DecompTree, DecompError> {
        let all = graph.vertex_set();
        if all.len() < 2 {
            return Ok(tree);
        }

        let start = Instant::now();
        self.seed(graph, matcher, &tree);
        let mut best_width = self.width_of(&all)?;
        let mut iterations = 0;
        sink.report(Progress {
            width: best_width,
            fitness: self.best[&all].fitness,
            elapsed: start.elapsed(),
            iterations,
        });

        let mut work = tree;
        while !budget.exhausted(start, iterations) {
            let root = work
                .root()
                .ok_or_else(|| DecompError::Invariant("working tree has no root".to_string()))?;
            self.try_improve(graph, matcher, &all, &mut work, root, rng)?;
            iterations += 1;

            let width = self.width_of(&all)?;
            if width < best_width {
                best_width = width;
                sink.report(Progress {
                    width,
                    fitness: self.best[&all].fitness,
                    elapsed: start.elapsed(),
                    iterations,
                });
            }
        }

        info!(
            "Sharmin{}: width {} after {} iterations, {} subtrees remembered",
            if self.balanced { "b" } else { "ub" },
            best_width,
            iterations,
            self.best.len()
        );
        Ok(self.best[&all].tree.clone())
    }

    fn try_improve(
        &mut self,
        graph: &Graph,
        matcher: &mut Matcher,
        all: &Partition,
        tree: &mut DecompTree,
        r: usize,
        rng: &mut impl Rng,
    ) -> Result<(), DecompError> {
        let label = tree.label(r).clone();
        if label.len() <= 1 {
            return Err(DecompError::Invariant(format!(
                "cannot improve the subtree of singleton {}",
                label
            )));
        }

        let a = match *tree.children(r) {
            [] => split(graph, matcher, &label, rng)?,
            [y, z] => random_swap(tree, y, z, self.balanced, rng),
            ref cs => {
                return Err(DecompError::Invariant(format!(
                    "node {} has {} children",
                    r,
                    cs.len()
                )))
            }
        };
        let b = label.difference(&a);

        if matcher.split_width(graph, &a, &b) >= self.width_of(all)? {
            return Ok(());
        }

        tree.remove_descendants(r);
        let va = tree.add_node(a);
        tree.connect_child(r, va);
        let vb = tree.add_node(b);
        tree.connect_child(r, vb);

        for child in [va, vb] {
            let side = tree.label(child).clone();
            let global = self.width_of(all)?;
            let known = self
                .best
                .get(&side)
                .filter(|e| e.width < global)
                .map(|e| e.tree.clone());
            if let Some(sub) = known {
                tree.graft(child, &sub);
            } else if side.len() > 1 {
                self.try_improve(graph, matcher, all, tree, child, rng)?;
            }
        }

        if tree.is_complete_below(r) {
            self.record(graph, matcher, tree.copy_subtree(r));
            debug!("Sharmin: completed subtree for {} vertices", label.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomp::{bottom_up, top_down, BottomUpHeuristic};
    use crate::graph::V;
    use crate::matching::MatcherKind;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn improves_top_down_trees(#[case] balanced: bool) {
        let g = Graph::grid(4, 4).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut m = Matcher::new();
        let init = top_down(&g, &mut m, &mut rng).unwrap();
        let init_width = init.mm_width(&g, &mut m);

        let mut opt = SharminOptimizer::new(balanced);
        let mut events = Vec::new();
        let best = opt
            .optimize(&g, &mut m, init, &Budget::iterations(40), &mut rng, &mut events)
            .unwrap();

        assert!(best.validate(&g.vertex_set()).is_ok());
        assert!(best.mm_width(&g, &mut m) <= init_width);
        assert!(!opt.is_empty());
        for w in events.windows(2) {
            assert!(w[1].width < w[0].width);
        }
    }

    #[test]
    fn seeds_every_complete_subtree() {
        let g = Graph::grid(3, 3).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut m = Matcher::new();
        let init = bottom_up(
            &g,
            &mut m,
            BottomUpHeuristic::CompletelyRandom,
            MatcherKind::HopcroftKarp,
            &mut rng,
        )
        .unwrap();

        let mut opt = SharminOptimizer::new(false);
        opt.seed(&g, &mut m, &init);
        assert_eq!(opt.len(), init.len());
        let sub = opt.best(&g.vertex_set()).unwrap();
        assert!(sub.validate(&g.vertex_set()).is_ok());

        opt.clear();
        assert!(opt.is_empty());
    }

    #[test]
    fn remembered_subtrees_are_complete() {
        let g = Graph::grid(3, 4).unwrap();
        let mut rng = SmallRng::seed_from_u64(8);
        let mut m = Matcher::new();
        let init = top_down(&g, &mut m, &mut rng).unwrap();
        let mut opt = SharminOptimizer::new(true);
        opt.optimize(&g, &mut m, init, &Budget::iterations(20), &mut rng, &mut ())
            .unwrap();

        for (label, entry) in &opt.best {
            let root = entry.tree.root().unwrap();
            assert_eq!(entry.tree.label(root), label);
            assert!(entry.tree.validate(label).is_ok());
        }
    }

    /// Every interior node has a leaf as its second child.
    fn caterpillar(width: usize, vs: &[V]) -> DecompTree {
        let mut tree = DecompTree::new(width);
        let mut top = tree.add_leaf(vs[0]);
        for &v in &vs[1..] {
            let leaf = tree.add_leaf(v);
            let label = tree.label(top).union(tree.label(leaf));
            let parent = tree.add_node(label);
            tree.connect_child(parent, top);
            tree.connect_child(parent, leaf);
            top = parent;
        }
        tree
    }

    fn labels_below(tree: &DecompTree, n: usize) -> Vec<Partition> {
        let mut labels: Vec<Partition> = tree
            .descendants(n)
            .into_iter()
            .map(|d| tree.label(d).clone())
            .collect();
        labels.sort();
        labels
    }

    #[test]
    fn remembered_subtrees_are_grafted() {
        let g = Graph::grid(3, 4).unwrap();
        let all = g.vertex_set();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut m = Matcher::new();
        let a = split(&g, &mut m, &all, &mut rng.clone()).unwrap();
        let b = all.difference(&a);
        assert!(a.len() >= 4);

        let mut opt = SharminOptimizer::new(true);
        let everything: Vec<V> = all.iter().collect();
        opt.best.insert(
            all.clone(),
            BestEntry {
                tree: caterpillar(g.vindex(), &everything),
                width: usize::MAX,
                fitness: usize::MAX,
            },
        );
        // balanced splits of `a` never cut off a single vertex at the top
        let sub = caterpillar(g.vindex(), &a.iter().collect::<Vec<_>>());
        let expected = labels_below(&sub, sub.root().unwrap());
        opt.best.insert(
            a.clone(),
            BestEntry {
                tree: sub,
                width: 0,
                fitness: 0,
            },
        );

        let mut work = DecompTree::new(g.vindex());
        let root = work.add_node(all.clone());
        opt.try_improve(&g, &mut m, &all, &mut work, root, &mut rng)
            .unwrap();

        let at = work.find(&a).unwrap();
        assert_eq!(work.parent(at), Some(root));
        assert_eq!(labels_below(&work, at), expected);
        assert!(work.validate(&all).is_ok());

        let rebuilt = work.find(&b).unwrap();
        assert!(work.is_complete_below(rebuilt));
        assert!(opt.best(&b).is_some());
        assert!(opt.width_of(&all).unwrap() < usize::MAX);
    }
}
