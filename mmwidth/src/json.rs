//! Json encoding of decomposition trees.
//!
//! A tree is stored as its nodes in post-order, so every node comes after
//! its children and the root comes last. A leaf is the external name of its
//! vertex; an interior node is the pair of positions of its children:
//!
//! ```json
//! {"nodes": [1, 2, [0, 1], 3, [2, 3]]}
//! ```

use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::decomp::DecompTree;
use crate::error::DecompError;
use crate::graph::Graph;

/// Returns the json-encoded representation of a tree.
pub fn encode_tree(graph: &Graph, tree: &DecompTree) -> Result<String, DecompError> {
    let jt = JsonTree::from_tree(graph, tree)?;
    Ok(serde_json::to_string(&jt)?)
}

/// Writes the json-encoded representation of a tree to a file.
pub fn write_tree(graph: &Graph, tree: &DecompTree, filename: &Path) -> Result<(), DecompError> {
    let jt = JsonTree::from_tree(graph, tree)?;
    let file = std::fs::File::create(filename)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer(writer, &jt)?;
    Ok(())
}

/// Reads a tree over `graph` from its json-encoded representation. The
/// result is not validated.
pub fn decode_tree(graph: &Graph, s: &str) -> Result<DecompTree, DecompError> {
    let jt: JsonTree = serde_json::from_str(s)?;
    jt.to_tree(graph)
}

/// Reads a tree over `graph` from a json-encoded file.
pub fn read_tree(graph: &Graph, filename: &Path) -> Result<DecompTree, DecompError> {
    let file = std::fs::File::open(filename)?;
    let reader = std::io::BufReader::new(file);
    let jt: JsonTree = serde_json::from_reader(reader)?;
    jt.to_tree(graph)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum JsonNode {
    Leaf(usize),
    Pair([usize; 2]),
}

/// The json-encoded format for decomposition trees.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct JsonTree {
    pub nodes: Vec<JsonNode>,
}

impl JsonTree {
    pub fn from_tree(graph: &Graph, tree: &DecompTree) -> Result<Self, DecompError> {
        let mut nodes = Vec::with_capacity(tree.len());
        let Some(root) = tree.root() else {
            return if tree.is_empty() {
                Ok(JsonTree { nodes })
            } else {
                Err(DecompError::Invariant("tree has no unique root".to_string()))
            };
        };

        let mut pos: FxHashMap<usize, usize> = FxHashMap::default();
        let mut stack = vec![(root, false)];
        while let Some((n, expanded)) = stack.pop() {
            if !expanded && !tree.is_leaf(n) {
                stack.push((n, true));
                stack.extend(tree.children(n).iter().rev().map(|&c| (c, false)));
                continue;
            }
            let node = match *tree.children(n) {
                [] => {
                    let v = tree.label(n).first().ok_or_else(|| {
                        DecompError::Invariant(format!("leaf {} has an empty label", n))
                    })?;
                    JsonNode::Leaf(graph.name(v))
                }
                [a, b] => JsonNode::Pair([pos[&a], pos[&b]]),
                ref cs => {
                    return Err(DecompError::Invariant(format!(
                        "node {} has {} children",
                        n,
                        cs.len()
                    )))
                }
            };
            pos.insert(n, nodes.len());
            nodes.push(node);
        }
        Ok(JsonTree { nodes })
    }

    pub fn to_tree(&self, graph: &Graph) -> Result<DecompTree, DecompError> {
        let mut tree = DecompTree::new(graph.vindex());
        let mut index = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let n = match *node {
                JsonNode::Leaf(name) => {
                    let v = graph.vertex_named(name).ok_or_else(|| {
                        DecompError::Format(format!("node {}: unknown vertex {}", i, name))
                    })?;
                    tree.add_leaf(v)
                }
                JsonNode::Pair([a, b]) => {
                    if a >= i || b >= i || a == b {
                        return Err(DecompError::Format(format!(
                            "node {}: children must be two distinct earlier nodes",
                            i
                        )));
                    }
                    let (ta, tb) = (index[a], index[b]);
                    if tree.parent(ta).is_some() || tree.parent(tb).is_some() {
                        return Err(DecompError::Format(format!(
                            "node {}: child already has a parent",
                            i
                        )));
                    }
                    let p = tree.add_node(tree.label(ta).union(tree.label(tb)));
                    tree.connect_child(p, ta);
                    tree.connect_child(p, tb);
                    p
                }
            };
            index.push(n);
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomp::top_down;
    use crate::matching::Matcher;
    use crate::partition::Partition;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::{fixture, rstest};

    /// A path on the vertices named 1, 2, 3.
    #[fixture]
    fn path() -> Graph {
        let mut g = Graph::new();
        let vs: Vec<_> = (1..=3).map(|i| g.add_vertex(i)).collect();
        g.add_edge(vs[0], vs[1]);
        g.add_edge(vs[1], vs[2]);
        g
    }

    #[rstest]
    fn decode_small_tree(path: Graph) {
        let tree = decode_tree(&path, r#"{"nodes": [1, 2, [0, 1], 3, [2, 3]]}"#).unwrap();
        assert!(tree.validate(&path.vertex_set()).is_ok());
        let root = tree.root().unwrap();
        let inner = tree.find(&Partition::from_vertices(path.vindex(), [0, 1]));
        assert!(inner.is_some());
        assert_eq!(tree.parent(inner.unwrap()), Some(root));
    }

    #[rstest]
    fn encode_matches_format(path: Graph) {
        let s = r#"{"nodes":[1,2,[0,1],3,[2,3]]}"#;
        let tree = decode_tree(&path, s).unwrap();
        assert_eq!(encode_tree(&path, &tree).unwrap(), s);
    }

    #[rstest]
    #[case(r#"{"nodes": [1, 4, [0, 1]]}"#)]
    #[case(r#"{"nodes": [1, 2, [0, 2]]}"#)]
    #[case(r#"{"nodes": [1, 2, [0, 1], [0, 1]]}"#)]
    #[case(r#"{"nodes": [1, [0, 0]]}"#)]
    fn malformed_trees(path: Graph, #[case] s: &str) {
        assert!(matches!(
            decode_tree(&path, s),
            Err(DecompError::Format(_))
        ));
    }

    #[rstest]
    fn invalid_json(path: Graph) {
        assert!(matches!(
            decode_tree(&path, "{\"nodes\": [1, \"two\"]}"),
            Err(DecompError::Json(_))
        ));
    }

    #[test]
    fn large_tree_through_file() {
        let g = Graph::grid(5, 6).unwrap();
        let mut m = Matcher::new();
        let mut rng = SmallRng::seed_from_u64(42);
        let tree = top_down(&g, &mut m, &mut rng).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tree.json");
        write_tree(&g, &tree, &file).unwrap();
        let back = read_tree(&g, &file).unwrap();
        assert!(back.validate(&g.vertex_set()).is_ok());
        assert_eq!(back.mm_width(&g, &mut m), tree.mm_width(&g, &mut m));
    }
}
