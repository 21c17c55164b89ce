//! Combinatorial isomorphisms of facet pairings.
//!
//! An isomorphism relabels simplices and, within each simplex, its
//! vertices.  The searchers consume a caller-supplied list of isomorphisms
//! that fix the pairing (its automorphism group, typically); each gluing
//! permutation set is emitted once per orbit under that list.  Generating
//! the list is the job of an external collaborator.

use super::facet_pairing::FacetPairing;
use super::facet_spec::FacetSpec;
use crate::perm::Perm;
use serde::{Deserialize, Serialize};

/// A relabelling of `N`-vertex simplices: a permutation of the simplices
/// plus one vertex permutation per simplex.
///
/// `N` is the number of vertices per simplex (4 for tetrahedra, 5 for
/// pentachora).  Since facet `f` is opposite vertex `f`, the vertex
/// permutation of a simplex is also its facet permutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Isomorphism<const N: usize> {
    simp_image: Vec<usize>,
    facet_perm: Vec<Perm<N>>,
}

/// Isomorphisms of tetrahedron facet pairings.
pub type Isomorphism3 = Isomorphism<4>;
/// Isomorphisms of pentachoron facet pairings.
pub type Isomorphism4 = Isomorphism<5>;

impl<const N: usize> Isomorphism<N> {
    /// Creates an isomorphism from its simplex images and facet
    /// permutations (one per simplex).
    ///
    /// Debug builds assert that `simp_image` is a permutation and the two
    /// vectors agree in length.
    #[must_use]
    pub fn new(simp_image: Vec<usize>, facet_perm: Vec<Perm<N>>) -> Self {
        debug_assert_eq!(simp_image.len(), facet_perm.len());
        debug_assert!({
            let mut seen = vec![false; simp_image.len()];
            simp_image.iter().all(|&s| {
                let fresh = s < seen.len() && !seen[s];
                if fresh {
                    seen[s] = true;
                }
                fresh
            })
        });
        Isomorphism {
            simp_image,
            facet_perm,
        }
    }

    /// The identity isomorphism on `size` simplices.
    #[must_use]
    pub fn identity(size: usize) -> Self {
        Isomorphism {
            simp_image: (0..size).collect(),
            facet_perm: vec![Perm::IDENTITY; size],
        }
    }

    /// The number of simplices acted upon.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.simp_image.len()
    }

    /// The image of the given simplex.
    #[inline]
    #[must_use]
    pub fn simp_image(&self, simp: usize) -> usize {
        self.simp_image[simp]
    }

    /// The vertex/facet permutation applied within the given simplex.
    #[inline]
    #[must_use]
    pub fn facet_perm(&self, simp: usize) -> Perm<N> {
        self.facet_perm[simp]
    }

    /// The image of a facet under this isomorphism.
    #[inline]
    #[must_use]
    pub fn image_of<const DIM: usize>(&self, spec: FacetSpec<DIM>) -> FacetSpec<DIM> {
        debug_assert_eq!(DIM + 1, N);
        FacetSpec::new(
            self.simp_image[spec.simp],
            self.facet_perm[spec.simp].image(spec.facet),
        )
    }

    /// Whether this isomorphism maps the given pairing onto itself.
    ///
    /// Every element of a searcher's automorphism list must satisfy this.
    #[must_use]
    pub fn is_automorphism<const DIM: usize>(&self, pairing: &FacetPairing<DIM>) -> bool {
        if pairing.size() != self.size() {
            return false;
        }
        FacetSpec::all(pairing.size()).all(|spec| {
            let mapped_dest = self.image_of(pairing.dest_spec(spec));
            pairing.dest_spec(self.image_of(spec)) == mapped_dest
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_an_automorphism() {
        let pairing: FacetPairing<3> =
            FacetPairing::from_pairs(2, &[((0, 0), (1, 0)), ((0, 1), (1, 1))]).unwrap();
        let id = Isomorphism3::identity(2);
        assert!(id.is_automorphism(&pairing));
    }

    #[test]
    fn simplex_swap_fixes_symmetric_pairing() {
        let pairing: FacetPairing<3> = FacetPairing::from_pairs(
            2,
            &[
                ((0, 0), (1, 0)),
                ((0, 1), (1, 1)),
                ((0, 2), (1, 2)),
                ((0, 3), (1, 3)),
            ],
        )
        .unwrap();
        let swap = Isomorphism3::new(vec![1, 0], vec![Perm::IDENTITY; 2]);
        assert!(swap.is_automorphism(&pairing));
    }

    #[test]
    fn facet_twist_can_break_an_automorphism() {
        // One tetrahedron with facets 0-1 paired; swapping facets 0 and 2
        // moves the matched pair elsewhere.
        let pairing: FacetPairing<3> =
            FacetPairing::from_pairs(1, &[((0, 0), (0, 1))]).unwrap();
        let twist = Isomorphism3::new(vec![0], vec![Perm::transposition(0, 2)]);
        assert!(!twist.is_automorphism(&pairing));
        let swap01 = Isomorphism3::new(vec![0], vec![Perm::transposition(0, 1)]);
        assert!(swap01.is_automorphism(&pairing));
    }
}
