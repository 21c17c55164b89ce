//! Identification of a single simplex facet within a triangulation-to-be.

use serde::{Deserialize, Serialize};

/// One facet of one simplex: a triangle of a tetrahedron (`DIM == 3`) or a
/// tetrahedron of a pentachoron (`DIM == 4`).
///
/// Facets are totally ordered by simplex index and then facet number; this
/// order fixes the traversal order of the facet pairing graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FacetSpec<const DIM: usize> {
    /// The simplex containing this facet.
    pub simp: usize,
    /// The facet number within the simplex, `0 ..= DIM`.
    pub facet: usize,
}

impl<const DIM: usize> FacetSpec<DIM> {
    /// The number of facets per simplex.
    pub const FACETS: usize = DIM + 1;

    /// Creates a facet specifier.
    #[must_use]
    pub fn new(simp: usize, facet: usize) -> Self {
        debug_assert!(facet <= DIM);
        FacetSpec { simp, facet }
    }

    /// The position of this facet in the linear facet ordering.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.simp * (DIM + 1) + self.facet
    }

    /// Iterates over every facet of a triangulation with `size` simplices,
    /// in the traversal order.
    pub fn all(size: usize) -> impl Iterator<Item = FacetSpec<DIM>> {
        (0..size).flat_map(|simp| (0..=DIM).map(move |facet| FacetSpec { simp, facet }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_simplex_major() {
        let a: FacetSpec<3> = FacetSpec::new(0, 3);
        let b: FacetSpec<3> = FacetSpec::new(1, 0);
        assert!(a < b);
        assert_eq!(a.index() + 1, b.index());
    }

    #[test]
    fn all_enumerates_in_order() {
        let specs: Vec<FacetSpec<3>> = FacetSpec::all(2).collect();
        assert_eq!(specs.len(), 8);
        assert!(specs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(specs[5], FacetSpec::new(1, 1));
    }
}
