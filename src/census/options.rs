//! Search options shared by every gluing-permutation searcher.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Classes of triangulation that a census may avoid constructing.
///
/// Purging is an optimisation hint, not a filter: a searcher given these
/// flags may still emit some permutation sets of the named classes, but it
/// will never suppress a permutation set *outside* them.
///
/// ```
/// use simplex_census::census::CensusPurge;
///
/// let purge = CensusPurge::NON_MINIMAL | CensusPurge::NON_PRIME;
/// assert!(purge.has(CensusPurge::NON_PRIME));
/// assert!(!purge.has(CensusPurge::P2_REDUCIBLE));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusPurge(u8);

impl CensusPurge {
    /// Avoid nothing.
    pub const NONE: CensusPurge = CensusPurge(0);
    /// Avoid non-minimal triangulations.
    pub const NON_MINIMAL: CensusPurge = CensusPurge(1);
    /// Avoid non-prime triangulations (and, in the non-orientable case,
    /// reducible ones).
    pub const NON_PRIME: CensusPurge = CensusPurge(2);
    /// Avoid P²-reducible triangulations.
    pub const P2_REDUCIBLE: CensusPurge = CensusPurge(4);
    /// Avoid anything that is not a minimal ideal triangulation of a cusped
    /// finite-volume hyperbolic manifold.
    pub const NON_MINIMAL_HYP: CensusPurge = CensusPurge(8);

    /// Whether every flag of `other` is present in this set.
    #[inline]
    #[must_use]
    pub const fn has(self, other: CensusPurge) -> bool {
        self.0 & other.0 == other.0
    }

    /// The raw bit pattern, as stored in checkpoint dumps.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Rebuilds a flag set from its bit pattern, discarding unknown bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> CensusPurge {
        CensusPurge(bits & 0x0f)
    }
}

impl BitOr for CensusPurge {
    type Output = CensusPurge;

    #[inline]
    fn bitor(self, rhs: CensusPurge) -> CensusPurge {
        CensusPurge(self.0 | rhs.0)
    }
}

/// The constraint flags of a dimension-3 search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Generate only gluing permutation sets corresponding to orientable
    /// triangulations.
    pub orientable_only: bool,
    /// Generate only gluing permutation sets corresponding to finite
    /// (non-ideal) triangulations.  Some non-finite sets may still slip
    /// through; none of the finite ones are lost.
    pub finite_only: bool,
    /// Classes of triangulation that may be skipped.
    pub purge: CensusPurge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_bits_round_trip() {
        let purge = CensusPurge::NON_MINIMAL | CensusPurge::NON_MINIMAL_HYP;
        assert_eq!(CensusPurge::from_bits(purge.bits()), purge);
        assert_eq!(CensusPurge::from_bits(0xff).bits(), 0x0f);
    }
}
