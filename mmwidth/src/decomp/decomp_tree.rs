use std::cell::Cell;
use std::collections::VecDeque;

use crate::error::DecompError;
use crate::graph::{Graph, V};
use crate::matching::Matcher;
use crate::partition::Partition;

/// Weight of the width in [`DecompTree::fitness`]. Large enough that the sum
/// of cut sizes only breaks ties between trees of equal width.
pub const WIDTH_WEIGHT: usize = 10000;

/// A node of a decomposition tree, labelled with the graph vertices below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompNode {
    label: Partition,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl DecompNode {
    pub fn label(&self) -> &Partition {
        &self.label
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A rooted binary decomposition tree.
///
/// Nodes live in an arena and refer to each other by index. Removing a node
/// leaves a hole that the next added node fills. A well-formed tree over `n`
/// graph vertices has `n` singleton leaves, `n - 1` interior nodes with two
/// children each, and every interior label is the disjoint union of its
/// children's labels; see [`DecompTree::validate`].
#[derive(Debug, Clone)]
pub struct DecompTree {
    nodes: Vec<Option<DecompNode>>,
    holes: Vec<usize>,
    width: usize,
    root: Cell<Option<usize>>,
}

impl DecompTree {
    /// Creates an empty tree whose labels have the given partition width.
    pub fn new(width: usize) -> Self {
        DecompTree {
            nodes: Vec::new(),
            holes: Vec::new(),
            width,
            root: Cell::new(None),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - self.holes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_leaves(&self) -> usize {
        self.node_indices().filter(|&n| self.node(n).is_leaf()).count()
    }

    /// Adds a detached node with the given label.
    pub fn add_node(&mut self, label: Partition) -> usize {
        assert_eq!(
            label.width(),
            self.width,
            "Label width does not match the tree"
        );
        let node = DecompNode {
            label,
            parent: None,
            children: Vec::new(),
        };
        self.root.set(None);
        if let Some(i) = self.holes.pop() {
            self.nodes[i] = Some(node);
            i
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    pub fn add_leaf(&mut self, v: V) -> usize {
        self.add_node(Partition::singleton(self.width, v))
    }

    pub fn contains(&self, n: usize) -> bool {
        matches!(self.nodes.get(n), Some(Some(_)))
    }

    pub fn node(&self, n: usize) -> &DecompNode {
        self.nodes
            .get(n)
            .and_then(|d| d.as_ref())
            .unwrap_or_else(|| panic!("Tree node {} not found", n))
    }

    fn node_mut(&mut self, n: usize) -> &mut DecompNode {
        self.nodes
            .get_mut(n)
            .and_then(|d| d.as_mut())
            .unwrap_or_else(|| panic!("Tree node {} not found", n))
    }

    pub fn label(&self, n: usize) -> &Partition {
        &self.node(n).label
    }

    pub fn set_label(&mut self, n: usize, label: Partition) {
        self.node_mut(n).label = label;
    }

    pub fn parent(&self, n: usize) -> Option<usize> {
        self.node(n).parent
    }

    pub fn children(&self, n: usize) -> &[usize] {
        &self.node(n).children
    }

    pub fn is_leaf(&self, n: usize) -> bool {
        self.node(n).is_leaf()
    }

    /// Indices of all nodes, in arena order.
    pub fn node_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| i))
    }

    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for p in self.node_indices() {
            for &c in self.children(p) {
                edges.push((p, c));
            }
        }
        edges
    }

    pub fn connect_child(&mut self, parent: usize, child: usize) {
        assert!(
            self.parent(child).is_none(),
            "Node {} already has a parent",
            child
        );
        assert!(
            self.children(parent).len() < 2,
            "Node {} already has two children (malformed tree)",
            parent
        );
        assert_ne!(parent, child, "A node cannot be its own child");
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        if self.root.get() == Some(child) {
            self.root.set(None);
        }
    }

    pub fn disconnect_child(&mut self, parent: usize, child: usize) {
        let children = &mut self.node_mut(parent).children;
        let i = children
            .iter()
            .position(|&c| c == child)
            .unwrap_or_else(|| panic!("Node {} is not a child of {}", child, parent));
        children.remove(i);
        self.node_mut(child).parent = None;
        self.root.set(None);
    }

    /// The unique node without a parent. Returns `None` if the tree is empty
    /// or currently has several parentless nodes.
    pub fn root(&self) -> Option<usize> {
        if let Some(r) = self.root.get() {
            return Some(r);
        }
        let mut parentless = self.node_indices().filter(|&n| self.parent(n).is_none());
        let r = parentless.next()?;
        if parentless.next().is_some() {
            return None;
        }
        self.root.set(Some(r));
        Some(r)
    }

    pub fn sibling(&self, n: usize) -> Option<usize> {
        let p = self.parent(n)?;
        self.children(p).iter().copied().find(|&c| c != n)
    }

    pub fn grandparent(&self, n: usize) -> Option<usize> {
        self.parent(self.parent(n)?)
    }

    /// The proper ancestors of `n`, nearest first.
    pub fn ancestors(&self, n: usize) -> Vec<usize> {
        let mut anc = Vec::new();
        let mut current = self.parent(n);
        while let Some(p) = current {
            anc.push(p);
            current = self.parent(p);
        }
        anc
    }

    /// Whether `a` is a proper ancestor of `b`.
    pub fn is_ancestor(&self, a: usize, b: usize) -> bool {
        let mut current = self.parent(b);
        while let Some(p) = current {
            if p == a {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// `n` and everything below it, in breadth-first order.
    pub fn descendants(&self, n: usize) -> Vec<usize> {
        let mut d = Vec::new();
        let mut queue = VecDeque::from([n]);
        while let Some(v) = queue.pop_front() {
            queue.extend(self.children(v).iter().copied());
            d.push(v);
        }
        d
    }

    pub fn find(&self, label: &Partition) -> Option<usize> {
        self.node_indices().find(|&n| self.label(n) == label)
    }

    pub fn find_leaf(&self, v: V) -> Option<usize> {
        self.node_indices().find(|&n| {
            let node = self.node(n);
            node.is_leaf() && node.label.len() == 1 && node.label.contains(v)
        })
    }

    /// Deletes everything below `n`, leaving `n` as a leaf.
    pub fn remove_descendants(&mut self, n: usize) {
        for d in self.descendants(n).into_iter().skip(1) {
            self.nodes[d] = None;
            self.holes.push(d);
        }
        self.node_mut(n).children.clear();
    }

    /// Copies the subtree rooted at `n` into a tree of its own.
    pub fn copy_subtree(&self, n: usize) -> DecompTree {
        let mut tree = DecompTree::new(self.width);
        let root = tree.add_node(self.label(n).clone());
        tree.copy_children(self, n, root);
        tree
    }

    /// Replaces the subtree below `at` by a copy of `sub`. The root of `sub`
    /// must carry the same label as `at`.
    pub fn graft(&mut self, at: usize, sub: &DecompTree) {
        let sub_root = sub.root().expect("Grafted tree has no root");
        assert_eq!(
            self.label(at),
            sub.label(sub_root),
            "Grafted subtree must carry the label of the node it replaces"
        );
        self.remove_descendants(at);
        self.copy_children(sub, sub_root, at);
    }

    fn copy_children(&mut self, from: &DecompTree, from_node: usize, to_node: usize) {
        let mut stack = vec![(from_node, to_node)];
        while let Some((old, new)) = stack.pop() {
            for &c in from.children(old) {
                let nc = self.add_node(from.label(c).clone());
                self.connect_child(new, nc);
                stack.push((c, nc));
            }
        }
    }

    /// Whether every node below `n` (inclusive) is either a singleton leaf
    /// or has exactly two children.
    pub fn is_complete_below(&self, n: usize) -> bool {
        self.descendants(n).into_iter().all(|d| {
            let node = self.node(d);
            match node.children.len() {
                0 => node.label.len() == 1,
                2 => true,
                _ => false,
            }
        })
    }

    /// Moves `v` up to take the place of its uncle, which moves down to take
    /// the place of `v`. Only the label of `v`'s parent changes: every label
    /// above it keeps the same vertex set.
    pub fn swap_uncle(&mut self, v: usize) {
        let dad = self.parent(v).expect("Node has no parent");
        let granddad = self.parent(dad).expect("Node has no grandparent");
        let uncle = self
            .sibling(dad)
            .expect("Parent has no sibling (malformed tree)");

        self.disconnect_child(granddad, uncle);
        self.disconnect_child(dad, v);
        self.connect_child(granddad, v);
        self.connect_child(dad, uncle);

        let label = self.label(dad).difference(self.label(v)).union(self.label(uncle));
        self.set_label(dad, label);
    }

    /// Exchanges the positions of two subtrees, neither containing the other,
    /// and updates the labels along both ancestor chains.
    pub fn swap_subtrees(&mut self, a: usize, b: usize) {
        assert!(
            a != b && !self.is_ancestor(a, b) && !self.is_ancestor(b, a),
            "Cannot swap nested subtrees"
        );
        let pa = self.parent(a).expect("Cannot swap the root");
        let pb = self.parent(b).expect("Cannot swap the root");

        let mut chain_a = vec![pa];
        chain_a.extend(self.ancestors(pa));
        let mut chain_b = vec![pb];
        chain_b.extend(self.ancestors(pb));
        let la = self.label(a).clone();
        let lb = self.label(b).clone();

        self.disconnect_child(pa, a);
        self.disconnect_child(pb, b);
        self.connect_child(pa, b);
        self.connect_child(pb, a);

        // shared ancestors lose and regain both subtrees
        for &n in &chain_a {
            self.node_mut(n).label.difference_with(&la);
        }
        for &n in &chain_b {
            let label = &mut self.node_mut(n).label;
            label.difference_with(&lb);
            label.union_with(&la);
        }
        for &n in &chain_a {
            self.node_mut(n).label.union_with(&lb);
        }
    }

    /// MM-width: the largest cut matching over all nodes of the tree.
    pub fn mm_width(&self, graph: &Graph, matcher: &mut Matcher) -> usize {
        self.node_indices()
            .map(|n| matcher.matching_size(graph, self.label(n)))
            .max()
            .unwrap_or(0)
    }

    /// `WIDTH_WEIGHT * width + sum of all cut matchings`. Lower is better.
    pub fn fitness(&self, graph: &Graph, matcher: &mut Matcher) -> usize {
        let mut width = 0;
        let mut total = 0;
        for n in self.node_indices() {
            let size = matcher.matching_size(graph, self.label(n));
            width = width.max(size);
            total += size;
        }
        WIDTH_WEIGHT * width + total
    }

    /// Checks that this is a full decomposition of `vertices`.
    pub fn validate(&self, vertices: &Partition) -> Result<(), DecompError> {
        let n = vertices.len();
        if n == 0 {
            return if self.is_empty() {
                Ok(())
            } else {
                Err(DecompError::Invariant(
                    "non-empty tree for an empty graph".to_string(),
                ))
            };
        }

        if self.len() != 2 * n - 1 {
            return Err(DecompError::Invariant(format!(
                "tree has {} nodes, expected {} for {} vertices",
                self.len(),
                2 * n - 1,
                n
            )));
        }

        let root = self
            .root()
            .ok_or_else(|| DecompError::Invariant("tree has no unique root".to_string()))?;
        if self.label(root) != vertices {
            return Err(DecompError::Invariant(format!(
                "root label {} is not the vertex set {}",
                self.label(root),
                vertices
            )));
        }

        let mut covered = Partition::new(self.width);
        for i in self.node_indices() {
            let node = self.node(i);
            match node.children.as_slice() {
                [] => {
                    if node.label.len() != 1 {
                        return Err(DecompError::Invariant(format!(
                            "leaf {} has label {}",
                            i, node.label
                        )));
                    }
                    if !covered.is_disjoint(&node.label) {
                        return Err(DecompError::Invariant(format!(
                            "vertex {} appears in two leaves",
                            node.label
                        )));
                    }
                    covered.union_with(&node.label);
                }
                &[l, r] => {
                    if self.parent(l) != Some(i) || self.parent(r) != Some(i) {
                        return Err(DecompError::Invariant(format!(
                            "children of node {} do not point back to it",
                            i
                        )));
                    }
                    let (ll, rl) = (self.label(l), self.label(r));
                    if !ll.is_disjoint(rl) || ll.union(rl) != node.label {
                        return Err(DecompError::Invariant(format!(
                            "label {} of node {} is not the disjoint union of {} and {}",
                            node.label, i, ll, rl
                        )));
                    }
                }
                cs => {
                    return Err(DecompError::Invariant(format!(
                        "node {} has {} children",
                        i,
                        cs.len()
                    )));
                }
            }
        }

        if covered != *vertices {
            return Err(DecompError::Invariant(format!(
                "leaves cover {} instead of {}",
                covered, vertices
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds this tree over the 4-cycle `0 - 1 - 2 - 3 - 0`:
    /// ```text
    ///          6
    ///        /   \
    ///       4     5
    ///      / \   / \
    ///     0   1 2   3
    /// ```
    fn cycle_tree() -> (Graph, DecompTree) {
        let mut g = Graph::new();
        let vs: Vec<V> = (0..4).map(|i| g.add_vertex(i)).collect();
        for i in 0..4 {
            g.add_edge(vs[i], vs[(i + 1) % 4]);
        }

        let mut tree = DecompTree::new(g.vindex());
        for &v in &vs {
            tree.add_leaf(v);
        }
        let l = tree.add_node(Partition::from_vertices(4, [0, 1]));
        let r = tree.add_node(Partition::from_vertices(4, [2, 3]));
        let root = tree.add_node(g.vertex_set());
        tree.connect_child(l, 0);
        tree.connect_child(l, 1);
        tree.connect_child(r, 2);
        tree.connect_child(r, 3);
        tree.connect_child(root, l);
        tree.connect_child(root, r);
        (g, tree)
    }

    #[test]
    fn structure() {
        let (g, tree) = cycle_tree();
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.num_leaves(), 4);
        assert_eq!(tree.root(), Some(6));
        assert_eq!(tree.sibling(0), Some(1));
        assert_eq!(tree.sibling(4), Some(5));
        assert_eq!(tree.sibling(6), None);
        assert_eq!(tree.grandparent(2), Some(6));
        assert_eq!(tree.ancestors(3), vec![5, 6]);
        assert!(tree.is_ancestor(6, 3));
        assert!(!tree.is_ancestor(4, 3));
        assert_eq!(tree.descendants(4), vec![4, 0, 1]);
        assert_eq!(tree.find(&Partition::from_vertices(4, [2, 3])), Some(5));
        assert_eq!(tree.find_leaf(2), Some(2));
        assert_eq!(tree.edges().len(), 6);
        assert!(tree.validate(&g.vertex_set()).is_ok());
        assert!(tree.is_complete_below(6));
    }

    #[test]
    fn width_and_fitness() {
        let (g, tree) = cycle_tree();
        let mut m = Matcher::new();
        // {0,1} | {2,3} cuts edges 1-2 and 3-0, leaves cut two edges each
        assert_eq!(tree.mm_width(&g, &mut m), 2);
        // 4 leaves of 1 + two halves of 2 + root of 0
        assert_eq!(tree.fitness(&g, &mut m), 2 * WIDTH_WEIGHT + 4 + 2 + 2);
    }

    #[test]
    fn uncle_swap_keeps_invariants() {
        let (g, mut tree) = cycle_tree();
        tree.swap_uncle(1);
        assert!(tree.validate(&g.vertex_set()).is_ok());
        assert_eq!(tree.parent(1), Some(6));
        assert_eq!(tree.parent(5), Some(4));
        assert_eq!(tree.label(4), &Partition::from_vertices(4, [0, 2, 3]));
        assert_eq!(tree.root(), Some(6));
    }

    #[test]
    fn swap_subtrees_updates_both_chains() {
        let (g, mut tree) = cycle_tree();
        tree.swap_subtrees(1, 2);
        assert!(tree.validate(&g.vertex_set()).is_ok());
        assert_eq!(tree.label(4), &Partition::from_vertices(4, [0, 2]));
        assert_eq!(tree.label(5), &Partition::from_vertices(4, [1, 3]));
        assert_eq!(tree.label(6), &g.vertex_set());

        // swapping siblings changes nothing
        tree.swap_subtrees(0, 2);
        assert!(tree.validate(&g.vertex_set()).is_ok());
        assert_eq!(tree.label(4), &Partition::from_vertices(4, [0, 2]));
    }

    #[test]
    #[should_panic]
    fn swap_nested_subtrees() {
        let (_, mut tree) = cycle_tree();
        tree.swap_subtrees(4, 1);
    }

    #[test]
    fn copy_and_graft() {
        let (g, mut tree) = cycle_tree();
        let sub = tree.copy_subtree(5);
        assert_eq!(sub.len(), 3);
        assert!(sub.is_complete_below(sub.root().unwrap()));

        tree.remove_descendants(5);
        assert_eq!(tree.len(), 5);
        assert!(!tree.is_complete_below(6));
        assert!(tree.validate(&g.vertex_set()).is_err());

        tree.graft(5, &sub);
        assert_eq!(tree.len(), 7);
        assert!(tree.validate(&g.vertex_set()).is_ok());
        assert!(tree.find_leaf(3).is_some());
    }

    #[test]
    fn holes_are_reused() {
        let (_, mut tree) = cycle_tree();
        tree.remove_descendants(4);
        let n = tree.add_leaf(0);
        assert!(n == 0 || n == 1);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn validate_rejects_broken_trees() {
        let (g, mut tree) = cycle_tree();

        // overlapping children
        tree.set_label(5, Partition::from_vertices(4, [1, 2, 3]));
        assert!(matches!(
            tree.validate(&g.vertex_set()),
            Err(DecompError::Invariant(_))
        ));

        // a detached second root
        let (g, mut tree) = cycle_tree();
        tree.disconnect_child(6, 5);
        assert_eq!(tree.root(), None);
        assert!(tree.validate(&g.vertex_set()).is_err());

        // wrong node count
        let (g, mut tree) = cycle_tree();
        tree.add_leaf(0);
        assert!(tree.validate(&g.vertex_set()).is_err());
    }

    #[test]
    fn root_cache_follows_edits() {
        let (_, mut tree) = cycle_tree();
        assert_eq!(tree.root(), Some(6));
        let top = tree.add_node(Partition::from_vertices(4, [0, 1, 2, 3]));
        assert_eq!(tree.root(), None);
        tree.connect_child(top, 6);
        assert_eq!(tree.root(), Some(top));
    }
}
