//! Immutable pairings of simplex facets.
//!
//! A facet pairing is the input to every gluing-permutation search: it fixes
//! *which* facets are identified, leaving the search to enumerate *how*.
//!
//! # Fundamental invariant
//!
//! A pairing is a fixed-point-free partial involution on the facets: each
//! facet either maps to a different facet (whose image is the original
//! facet) or to itself, in which case it is a *boundary* facet.  The
//! constructor enforces this shape; it cannot be violated afterwards
//! because pairings are immutable.
//!
//! # Preconditions left to the caller
//!
//! The searchers additionally require their pairing to be **connected** and
//! in **canonical form** (lexicographically minimal under simplex
//! relabelling).  Connectivity is checkable via
//! [`FacetPairing::is_connected`]; canonical form is a documented
//! precondition of the external pairing generator and is not re-verified
//! here.

use super::collections::{FastHashMap, SmallBuffer};
use super::facet_spec::FacetSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for facet pairing construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PairingError {
    /// A facet reference lies outside the triangulation.
    #[error("facet {facet} of simplex {simp} is out of range for {size} simplices")]
    FacetOutOfRange {
        /// The simplex index supplied.
        simp: usize,
        /// The facet number supplied.
        facet: usize,
        /// The number of simplices in the pairing.
        size: usize,
    },
    /// A facet was paired with itself.
    #[error("facet {facet} of simplex {simp} cannot be paired with itself")]
    SelfPaired {
        /// The simplex index supplied.
        simp: usize,
        /// The facet number supplied.
        facet: usize,
    },
    /// A facet appeared in more than one pair.
    #[error("facet {facet} of simplex {simp} appears in more than one pair")]
    AlreadyMatched {
        /// The simplex index supplied.
        simp: usize,
        /// The facet number supplied.
        facet: usize,
    },
}

/// A pairing of the facets of `size` simplices (see the module notes).
///
/// Facets not mentioned in any pair are boundary facets and map to
/// themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetPairing<const DIM: usize> {
    size: usize,
    dest: Vec<FacetSpec<DIM>>,
}

impl<const DIM: usize> FacetPairing<DIM> {
    /// Creates a pairing on `size` simplices from a list of facet pairs.
    ///
    /// Every facet not mentioned becomes a boundary facet.
    ///
    /// # Errors
    ///
    /// Returns a [`PairingError`] if any referenced facet is out of range,
    /// paired with itself, or mentioned twice.
    pub fn from_pairs(
        size: usize,
        pairs: &[((usize, usize), (usize, usize))],
    ) -> Result<Self, PairingError> {
        let mut dest: Vec<FacetSpec<DIM>> = FacetSpec::all(size).collect();
        let mut matched = vec![false; size * (DIM + 1)];

        for &((s1, f1), (s2, f2)) in pairs {
            for (simp, facet) in [(s1, f1), (s2, f2)] {
                if simp >= size || facet > DIM {
                    return Err(PairingError::FacetOutOfRange { simp, facet, size });
                }
            }
            if (s1, f1) == (s2, f2) {
                return Err(PairingError::SelfPaired { simp: s1, facet: f1 });
            }
            for (simp, facet) in [(s1, f1), (s2, f2)] {
                let idx = simp * (DIM + 1) + facet;
                if matched[idx] {
                    return Err(PairingError::AlreadyMatched { simp, facet });
                }
                matched[idx] = true;
            }
            dest[s1 * (DIM + 1) + f1] = FacetSpec::new(s2, f2);
            dest[s2 * (DIM + 1) + f2] = FacetSpec::new(s1, f1);
        }

        Ok(FacetPairing { size, dest })
    }

    /// The number of simplices under consideration.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The partner of the given facet (the facet itself if boundary).
    #[inline]
    #[must_use]
    pub fn dest(&self, simp: usize, facet: usize) -> FacetSpec<DIM> {
        self.dest[simp * (DIM + 1) + facet]
    }

    /// The partner of the given facet (the facet itself if boundary).
    #[inline]
    #[must_use]
    pub fn dest_spec(&self, spec: FacetSpec<DIM>) -> FacetSpec<DIM> {
        self.dest[spec.index()]
    }

    /// Whether the given facet is a boundary facet.
    #[inline]
    #[must_use]
    pub fn is_unmatched(&self, spec: FacetSpec<DIM>) -> bool {
        self.dest[spec.index()] == spec
    }

    /// Whether every facet is matched (no boundary facets).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        FacetSpec::all(self.size).all(|spec| !self.is_unmatched(spec))
    }

    /// Whether every simplex is reachable from simplex 0 through matched
    /// facet pairs.
    ///
    /// An empty pairing is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        if self.size == 0 {
            return true;
        }
        let mut seen = vec![false; self.size];
        seen[0] = true;
        let mut queue: SmallBuffer<usize> = SmallBuffer::new();
        queue.push(0);
        let mut reached = 1;
        while let Some(simp) = queue.pop() {
            for facet in 0..=DIM {
                let adj = self.dest(simp, facet).simp;
                if !seen[adj] {
                    seen[adj] = true;
                    reached += 1;
                    queue.push(adj);
                }
            }
        }
        reached == self.size
    }

    /// Whether some pair of simplices is joined along three or more facet
    /// pairs.
    ///
    /// A pairing with a triple edge admits no closed prime minimal
    /// P²-irreducible triangulation, so the closed-prime-minimal searcher
    /// rejects such pairings outright.
    #[must_use]
    pub fn has_triple_edge(&self) -> bool {
        let mut counts: FastHashMap<(usize, usize), u8> = FastHashMap::default();
        for spec in FacetSpec::all(self.size) {
            let adj = self.dest_spec(spec);
            if adj == spec || adj.simp == spec.simp || adj < spec {
                continue;
            }
            let entry = counts.entry((spec.simp, adj.simp)).or_insert(0);
            *entry += 1;
            if *entry >= 3 {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tet_closed() -> FacetPairing<3> {
        // Both tetrahedra glued to each other along all four facets.
        FacetPairing::from_pairs(
            2,
            &[
                ((0, 0), (1, 0)),
                ((0, 1), (1, 1)),
                ((0, 2), (1, 2)),
                ((0, 3), (1, 3)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn boundary_facets_map_to_themselves() {
        let pairing: FacetPairing<3> =
            FacetPairing::from_pairs(1, &[((0, 0), (0, 1))]).unwrap();
        assert_eq!(pairing.dest(0, 0), FacetSpec::new(0, 1));
        assert_eq!(pairing.dest(0, 1), FacetSpec::new(0, 0));
        assert!(pairing.is_unmatched(FacetSpec::new(0, 2)));
        assert!(!pairing.is_closed());
    }

    #[test]
    fn closedness_and_connectivity() {
        let pairing = two_tet_closed();
        assert!(pairing.is_closed());
        assert!(pairing.is_connected());
    }

    #[test]
    fn disconnected_pairing_detected() {
        // Two tetrahedra, each glued only to itself.
        let pairing: FacetPairing<3> =
            FacetPairing::from_pairs(2, &[((0, 0), (0, 1)), ((1, 0), (1, 1))]).unwrap();
        assert!(!pairing.is_connected());
    }

    #[test]
    fn triple_edge_detected() {
        assert!(two_tet_closed().has_triple_edge());
        let pairing: FacetPairing<3> = FacetPairing::from_pairs(
            2,
            &[((0, 2), (1, 2)), ((0, 3), (1, 3)), ((0, 0), (0, 1)), ((1, 0), (1, 1))],
        )
        .unwrap();
        assert!(!pairing.has_triple_edge());
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert_eq!(
            FacetPairing::<3>::from_pairs(1, &[((0, 0), (0, 0))]),
            Err(PairingError::SelfPaired { simp: 0, facet: 0 })
        );
        assert_eq!(
            FacetPairing::<3>::from_pairs(1, &[((0, 0), (1, 0))]),
            Err(PairingError::FacetOutOfRange {
                simp: 1,
                facet: 0,
                size: 1
            })
        );
        assert_eq!(
            FacetPairing::<3>::from_pairs(1, &[((0, 0), (0, 1)), ((0, 1), (0, 2))]),
            Err(PairingError::AlreadyMatched { simp: 0, facet: 1 })
        );
    }
}
