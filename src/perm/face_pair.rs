//! Unordered pairs of tetrahedron face numbers.
//!
//! The chain analysis of the closed-prime-minimal searcher repeatedly needs
//! "the two faces of this tetrahedron other than these two"; `FacePair`
//! keeps that arithmetic in one place.

use serde::{Deserialize, Serialize};

/// An unordered pair of distinct face numbers of a tetrahedron (0–3 each).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacePair {
    lower: u8,
    upper: u8,
}

impl FacePair {
    /// Creates the pair `{a, b}`.
    ///
    /// Debug builds assert that `a` and `b` are distinct face numbers.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        debug_assert!(a < 4 && b < 4 && a != b);
        if a < b {
            FacePair {
                lower: a as u8,
                upper: b as u8,
            }
        } else {
            FacePair {
                lower: b as u8,
                upper: a as u8,
            }
        }
    }

    /// The smaller face number of the pair.
    #[inline]
    #[must_use]
    pub const fn lower(&self) -> usize {
        self.lower as usize
    }

    /// The larger face number of the pair.
    #[inline]
    #[must_use]
    pub const fn upper(&self) -> usize {
        self.upper as usize
    }

    /// The pair of the two face numbers *not* in this pair.
    #[must_use]
    pub fn complement(&self) -> FacePair {
        let mut rest = (0u8..4).filter(|f| *f != self.lower && *f != self.upper);
        let lower = rest.next().expect("two faces remain");
        let upper = rest.next().expect("two faces remain");
        FacePair { lower, upper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_its_entries() {
        let pair = FacePair::new(3, 1);
        assert_eq!(pair.lower(), 1);
        assert_eq!(pair.upper(), 3);
    }

    #[test]
    fn complement_is_an_involution() {
        for a in 0..4 {
            for b in 0..4 {
                if a == b {
                    continue;
                }
                let pair = FacePair::new(a, b);
                assert_eq!(pair.complement().complement(), pair);
            }
        }
    }

    #[test]
    fn complement_of_01_is_23() {
        let comp = FacePair::new(0, 1).complement();
        assert_eq!((comp.lower(), comp.upper()), (2, 3));
    }
}
