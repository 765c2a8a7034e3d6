//! Fixed-universe bitsets over [`Cell`](crate::cell::Cell) indices.
//!
//! Carriers, color sets, and consider-sets are all subsets of "every cell on
//! this board," so a word-packed bitset is both the natural representation
//! and the fast one; the teacher's `Position` keeps per-color membership
//! implicit in a byte array instead (Go's board is small enough that a
//! linear scan is fine), but the VC engine needs cheap carrier
//! intersection/union/subset tests, which is what this type is for.

use crate::cell::Cell;

#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct CellSet {
    words: Vec<u64>,
}

const BITS: usize = 64;

impl CellSet {
    pub fn new(universe_size: usize) -> CellSet {
        CellSet {
            words: vec![0u64; universe_size.div_ceil(BITS)],
        }
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        let i = cell.index();
        (self.words[i / BITS] >> (i % BITS)) & 1 != 0
    }

    #[inline]
    pub fn insert(&mut self, cell: Cell) {
        let i = cell.index();
        self.words[i / BITS] |= 1u64 << (i % BITS);
    }

    #[inline]
    pub fn remove(&mut self, cell: Cell) {
        let i = cell.index();
        self.words[i / BITS] &= !(1u64 << (i % BITS));
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn union_with(&mut self, other: &CellSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    pub fn intersect_with(&mut self, other: &CellSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= b;
        }
    }

    pub fn subtract(&mut self, other: &CellSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !b;
        }
    }

    pub fn union(&self, other: &CellSet) -> CellSet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    pub fn intersection(&self, other: &CellSet) -> CellSet {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    pub fn difference(&self, other: &CellSet) -> CellSet {
        let mut out = self.clone();
        out.subtract(other);
        out
    }

    /// True iff `self` and `other` share no members.
    pub fn is_disjoint(&self, other: &CellSet) -> bool {
        self.words.iter().zip(&other.words).all(|(a, b)| a & b == 0)
    }

    /// True iff every member of `self` is also a member of `other`.
    pub fn is_subset(&self, other: &CellSet) -> bool {
        self.words.iter().zip(&other.words).all(|(a, b)| a & !b == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            (0..BITS).filter(move |b| (w >> b) & 1 != 0).map(move |b| Cell::from_index(wi * BITS + b))
        })
    }
}

impl std::fmt::Debug for CellSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter().map(|c| c.index())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn insert_and_contains() {
        let mut s = CellSet::new(200);
        let c = Cell::from_index(130);
        assert!(!s.contains(c));
        s.insert(c);
        assert!(s.contains(c));
        s.remove(c);
        assert!(!s.contains(c));
    }

    #[test]
    fn union_intersection_difference() {
        let mut a = CellSet::new(128);
        let mut b = CellSet::new(128);
        a.insert(Cell::from_index(1));
        a.insert(Cell::from_index(2));
        b.insert(Cell::from_index(2));
        b.insert(Cell::from_index(3));

        assert_eq!(a.union(&b).len(), 3);
        assert_eq!(a.intersection(&b).len(), 1);
        assert_eq!(a.difference(&b).len(), 1);
        assert!(!a.is_disjoint(&b));
    }
}
