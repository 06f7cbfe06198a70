//! Fixed-width vertex subsets.
//!
//! A [`Partition`] is a [`BitSet`] of vertex ids together with the number of
//! ids it may address. Every node of a decomposition tree is labelled by one,
//! and both the matching cache and the best-subtree table are keyed by them,
//! so equality and hashing only look at the elements: two structurally
//! identical subsets always collide, no matter which tree node produced them.

use bit_set::BitSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, Sub};

use crate::graph::V;

/// A subset of the vertices of a graph with a fixed number of addressable ids.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    bits: BitSet,
    width: usize,
}

impl Partition {
    /// Creates an empty subset over `width` vertex ids.
    pub fn new(width: usize) -> Self {
        Partition {
            bits: BitSet::with_capacity(width),
            width,
        }
    }

    /// Creates the subset `{v}`.
    pub fn singleton(width: usize, v: V) -> Self {
        let mut p = Self::new(width);
        p.insert(v);
        p
    }

    /// Creates a subset from an iterator of vertex ids.
    pub fn from_vertices(width: usize, vs: impl IntoIterator<Item = V>) -> Self {
        let mut p = Self::new(width);
        for v in vs {
            p.insert(v);
        }
        p
    }

    /// Number of addressable vertex ids.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn contains(&self, v: V) -> bool {
        self.bits.contains(v)
    }

    /// Adds `v`, returning `true` if it was not present.
    pub fn insert(&mut self, v: V) -> bool {
        assert!(
            v < self.width,
            "Vertex {} out of range for partition of width {}",
            v,
            self.width
        );
        self.bits.insert(v)
    }

    /// Removes `v`, returning `true` if it was present.
    pub fn remove(&mut self, v: V) -> bool {
        self.bits.remove(v)
    }

    /// Number of vertices in the subset.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The smallest vertex in the subset, if any.
    pub fn first(&self) -> Option<V> {
        self.bits.iter().next()
    }

    /// Iterates over the vertices of the subset in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = V> + '_ {
        self.bits.iter()
    }

    fn check_width(&self, other: &Partition) {
        assert_eq!(
            self.width, other.width,
            "Partitions of different widths cannot be combined"
        );
    }

    pub fn union_with(&mut self, other: &Partition) {
        self.check_width(other);
        self.bits.union_with(&other.bits);
    }

    pub fn difference_with(&mut self, other: &Partition) {
        self.check_width(other);
        self.bits.difference_with(&other.bits);
    }

    pub fn intersect_with(&mut self, other: &Partition) {
        self.check_width(other);
        self.bits.intersect_with(&other.bits);
    }

    pub fn union(&self, other: &Partition) -> Partition {
        let mut p = self.clone();
        p.union_with(other);
        p
    }

    pub fn difference(&self, other: &Partition) -> Partition {
        let mut p = self.clone();
        p.difference_with(other);
        p
    }

    pub fn intersection(&self, other: &Partition) -> Partition {
        let mut p = self.clone();
        p.intersect_with(other);
        p
    }

    pub fn is_disjoint(&self, other: &Partition) -> bool {
        self.check_width(other);
        self.bits.is_disjoint(&other.bits)
    }

    pub fn is_subset(&self, other: &Partition) -> bool {
        self.check_width(other);
        self.bits.is_subset(&other.bits)
    }
}

impl BitOr for &Partition {
    type Output = Partition;
    fn bitor(self, rhs: &Partition) -> Partition {
        self.union(rhs)
    }
}

impl BitAnd for &Partition {
    type Output = Partition;
    fn bitand(self, rhs: &Partition) -> Partition {
        self.intersection(rhs)
    }
}

impl Sub for &Partition {
    type Output = Partition;
    fn sub(self, rhs: &Partition) -> Partition {
        self.difference(rhs)
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}
