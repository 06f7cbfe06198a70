//! Simple undirected graphs.
//!
//! Vertices are dense indices into a slot table. The index of a vertex is
//! also its bit in every [`Partition`] over this graph, so removing a vertex
//! leaves a hole rather than compacting the table: the partition width stays
//! fixed for the lifetime of the graph and of every graph derived from it.

use rustc_hash::FxHashMap;

use crate::error::DecompError;
use crate::partition::Partition;

pub type V = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
struct VData {
    name: usize,
    nhd: Vec<V>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    vdata: Vec<Option<VData>>,
    names: FxHashMap<usize, V>,
    numv: usize,
    nume: usize,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Builds an `n` by `m` grid. Vertex `(i, j)` is named `1000 * i + j`.
    pub fn grid(n: usize, m: usize) -> Result<Self, DecompError> {
        if n >= 1000 || m >= 1000 {
            return Err(DecompError::Unsupported(format!(
                "grid of size {}x{} is too large",
                n, m
            )));
        }

        let mut g = Graph::new();
        for i in 0..n {
            for j in 0..m {
                let v = g.add_vertex(1000 * i + j);
                if i != 0 {
                    let up = g.vertex_named(1000 * (i - 1) + j).expect("grid vertex above");
                    g.add_edge(up, v);
                }
                if j != 0 {
                    let left = g.vertex_named(1000 * i + j - 1).expect("grid vertex left");
                    g.add_edge(left, v);
                }
            }
        }

        let expected_edges = n * m.saturating_sub(1) + m * n.saturating_sub(1);
        if g.num_vertices() != n * m || g.num_edges() != expected_edges {
            return Err(DecompError::Invariant(format!(
                "grid {}x{} has {} vertices and {} edges",
                n,
                m,
                g.num_vertices(),
                g.num_edges()
            )));
        }
        Ok(g)
    }

    /// Width of partitions over this graph, i.e. the next fresh vertex index.
    pub fn vindex(&self) -> usize {
        self.vdata.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.numv
    }

    pub fn num_edges(&self) -> usize {
        self.nume
    }

    /// Adds a vertex with the given external name and returns its index.
    ///
    /// Panics if the name is already in use.
    pub fn add_vertex(&mut self, name: usize) -> V {
        assert!(
            !self.names.contains_key(&name),
            "Vertex name {} already in use",
            name
        );
        let v = self.vdata.len();
        self.vdata.push(Some(VData {
            name,
            nhd: Vec::new(),
        }));
        self.names.insert(name, v);
        self.numv += 1;
        v
    }

    /// Removes a vertex and all of its edges. Its index is never reused.
    pub fn remove_vertex(&mut self, v: V) {
        let data = self.vdata[v].take().expect("Vertex not found");
        for &n in &data.nhd {
            self.remove_half_edge(n, v);
            self.nume -= 1;
        }
        self.names.remove(&data.name);
        self.numv -= 1;
    }

    /// Connects `s` and `t`. Returns `false` (and changes nothing) if the
    /// edge already exists or would be a self-loop.
    pub fn add_edge(&mut self, s: V, t: V) -> bool {
        if s == t || self.connected(s, t) {
            return false;
        }
        self.vdata_mut(s).nhd.push(t);
        self.vdata_mut(t).nhd.push(s);
        self.nume += 1;
        true
    }

    /// Disconnects `s` and `t`. Returns `false` if they were not connected.
    pub fn remove_edge(&mut self, s: V, t: V) -> bool {
        if !self.connected(s, t) {
            return false;
        }
        self.remove_half_edge(s, t);
        self.remove_half_edge(t, s);
        self.nume -= 1;
        true
    }

    fn remove_half_edge(&mut self, s: V, t: V) {
        let nhd = &mut self.vdata_mut(s).nhd;
        if let Some(i) = nhd.iter().position(|&n| n == t) {
            nhd.swap_remove(i);
        }
    }

    fn vdata(&self, v: V) -> &VData {
        self.vdata
            .get(v)
            .and_then(|d| d.as_ref())
            .unwrap_or_else(|| panic!("Vertex {} not found", v))
    }

    fn vdata_mut(&mut self, v: V) -> &mut VData {
        self.vdata
            .get_mut(v)
            .and_then(|d| d.as_mut())
            .unwrap_or_else(|| panic!("Vertex {} not found", v))
    }

    pub fn contains_vertex(&self, v: V) -> bool {
        matches!(self.vdata.get(v), Some(Some(_)))
    }

    pub fn connected(&self, s: V, t: V) -> bool {
        self.vdata(s).nhd.contains(&t)
    }

    /// External name of a vertex, as it appears in input files.
    pub fn name(&self, v: V) -> usize {
        self.vdata(v).name
    }

    /// Looks up a vertex by its external name.
    pub fn vertex_named(&self, name: usize) -> Option<V> {
        self.names.get(&name).copied()
    }

    pub fn degree(&self, v: V) -> usize {
        self.vdata(v).nhd.len()
    }

    pub fn neighbors(&self, v: V) -> impl Iterator<Item = V> + '_ {
        self.vdata(v).nhd.iter().copied()
    }

    pub fn vertices(&self) -> impl Iterator<Item = V> + '_ {
        self.vdata
            .iter()
            .enumerate()
            .filter_map(|(v, d)| d.as_ref().map(|_| v))
    }

    /// Iterates over the edges `(s, t)` with `s < t`.
    pub fn edges(&self) -> impl Iterator<Item = (V, V)> + '_ {
        self.vdata.iter().enumerate().flat_map(|(s, d)| {
            d.iter()
                .flat_map(move |d| d.nhd.iter().filter(move |&&t| s < t).map(move |&t| (s, t)))
        })
    }

    /// The subset containing every live vertex.
    pub fn vertex_set(&self) -> Partition {
        Partition::from_vertices(self.vindex(), self.vertices())
    }

    /// An empty subset of the right width for this graph.
    pub fn empty_set(&self) -> Partition {
        Partition::new(self.vindex())
    }

    /// Serializes the graph in DIMACS edge format, using external names.
    pub fn to_dimacs(&self) -> String {
        let mut s = format!("p edge {} {}\n", self.num_vertices(), self.num_edges());
        for v in self.vertices() {
            s.push_str(&format!("n {}\n", self.name(v)));
        }
        for (a, b) in self.edges() {
            s.push_str(&format!("e {} {}\n", self.name(a), self.name(b)));
        }
        s
    }
}
