//! The gluing-permutation tableau: the object being enumerated.
//!
//! For each facet, the tableau holds a signed index: negative while the
//! gluing is undecided, otherwise an index into the sign-alternating
//! permutation tables of [`crate::perm`].  Both facets of a matched pair
//! hold indices simultaneously, each the inverse of the other.
//!
//! Search actions receive the tableau by shared borrow; a callback that
//! wants to keep an emitted permutation set must clone it before returning,
//! because the searcher will keep mutating the same storage.

use super::facet_pairing::FacetPairing;
use super::facet_spec::FacetSpec;
use crate::perm::Perm;
use std::fmt;

/// Sentinel for a facet whose gluing has not been decided.
pub(crate) const UNDECIDED: i8 = -1;

/// A (possibly partial) assignment of gluing permutations to every matched
/// facet of a pairing.
#[derive(Clone, PartialEq, Eq)]
pub struct GluingPerms<const DIM: usize> {
    pairing: FacetPairing<DIM>,
    indices: Vec<i8>,
}

impl<const DIM: usize> GluingPerms<DIM> {
    /// Creates an all-undecided tableau over the given pairing.
    #[must_use]
    pub fn new(pairing: FacetPairing<DIM>) -> Self {
        let indices = vec![UNDECIDED; pairing.size() * (DIM + 1)];
        GluingPerms { pairing, indices }
    }

    /// The underlying facet pairing.
    #[inline]
    #[must_use]
    pub fn pairing(&self) -> &FacetPairing<DIM> {
        &self.pairing
    }

    /// The number of simplices under consideration.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.pairing.size()
    }

    /// The raw signed index for the given facet: negative if undecided.
    #[inline]
    #[must_use]
    pub fn perm_index(&self, spec: FacetSpec<DIM>) -> i8 {
        self.indices[spec.index()]
    }

    /// Whether the given facet's gluing has been decided.
    #[inline]
    #[must_use]
    pub fn is_decided(&self, spec: FacetSpec<DIM>) -> bool {
        self.indices[spec.index()] >= 0
    }

    /// Whether every matched facet is decided.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        FacetSpec::all(self.size())
            .all(|spec| self.pairing.is_unmatched(spec) || self.is_decided(spec))
    }

    #[inline]
    pub(crate) fn set_perm_index(&mut self, spec: FacetSpec<DIM>, index: i8) {
        self.indices[spec.index()] = index;
    }

    pub(crate) fn raw_indices(&self) -> &[i8] {
        &self.indices
    }

    pub(crate) fn from_parts(pairing: FacetPairing<DIM>, indices: Vec<i8>) -> Self {
        debug_assert_eq!(indices.len(), pairing.size() * (DIM + 1));
        GluingPerms { pairing, indices }
    }
}

impl GluingPerms<3> {
    /// The gluing permutation denoted by index `index` on the given facet:
    /// the bijection from the vertices of the source tetrahedron to the
    /// vertices of its partner.
    #[must_use]
    pub fn index_to_gluing(&self, spec: FacetSpec<3>, index: i8) -> Perm<4> {
        let dest = self.pairing.dest_spec(spec);
        Perm::transposition(dest.facet, 3)
            * Perm::<3>::S3[index as usize].extend()
            * Perm::transposition(spec.facet, 3)
    }

    /// The index denoting the given gluing permutation on the given facet.
    #[must_use]
    pub fn gluing_to_index(&self, spec: FacetSpec<3>, gluing: Perm<4>) -> i8 {
        let dest = self.pairing.dest_spec(spec);
        let inner = Perm::transposition(dest.facet, 3) * gluing * Perm::transposition(spec.facet, 3);
        inner.restrict::<3>().s3_index() as i8
    }

    /// The decided gluing permutation on the given facet.
    ///
    /// # Panics
    ///
    /// Panics if the facet is undecided (callers consult
    /// [`GluingPerms::is_decided`] first).
    #[must_use]
    pub fn gluing(&self, spec: FacetSpec<3>) -> Perm<4> {
        let index = self.perm_index(spec);
        assert!(index >= 0, "gluing queried on an undecided facet");
        self.index_to_gluing(spec, index)
    }
}

impl GluingPerms<4> {
    /// The gluing permutation denoted by index `index` on the given facet.
    #[must_use]
    pub fn index_to_gluing(&self, spec: FacetSpec<4>, index: i8) -> Perm<5> {
        let dest = self.pairing.dest_spec(spec);
        Perm::transposition(dest.facet, 4)
            * Perm::<4>::S4[index as usize].extend()
            * Perm::transposition(spec.facet, 4)
    }

    /// The index denoting the given gluing permutation on the given facet.
    #[must_use]
    pub fn gluing_to_index(&self, spec: FacetSpec<4>, gluing: Perm<5>) -> i8 {
        let dest = self.pairing.dest_spec(spec);
        let inner = Perm::transposition(dest.facet, 4) * gluing * Perm::transposition(spec.facet, 4);
        inner.restrict::<4>().s4_index() as i8
    }

    /// The decided gluing permutation on the given facet.
    ///
    /// # Panics
    ///
    /// Panics if the facet is undecided.
    #[must_use]
    pub fn gluing(&self, spec: FacetSpec<4>) -> Perm<5> {
        let index = self.perm_index(spec);
        assert!(index >= 0, "gluing queried on an undecided facet");
        self.index_to_gluing(spec, index)
    }
}

impl<const DIM: usize> fmt::Debug for GluingPerms<DIM> {
    /// One signed index per facet, simplex-major.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.indices.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_tet_self() -> GluingPerms<3> {
        let pairing = FacetPairing::from_pairs(1, &[((0, 0), (0, 1))]).unwrap();
        GluingPerms::new(pairing)
    }

    #[test]
    fn index_round_trips_through_gluing() {
        let perms = one_tet_self();
        let spec = FacetSpec::new(0, 0);
        for index in 0..6 {
            let gluing = perms.index_to_gluing(spec, index);
            assert_eq!(perms.gluing_to_index(spec, gluing), index);
            // A gluing maps its source facet number to the partner's.
            assert_eq!(gluing.image(0), 1);
        }
    }

    #[test]
    fn partner_index_is_the_inverse_gluing() {
        let perms = one_tet_self();
        let spec = FacetSpec::new(0, 0);
        let partner = FacetSpec::new(0, 1);
        for index in 0..6i8 {
            let gluing = perms.index_to_gluing(spec, index);
            let inverse_index = Perm::<3>::INV_S3[index as usize] as i8;
            assert_eq!(perms.index_to_gluing(partner, inverse_index), gluing.inverse());
        }
    }

    #[test]
    fn dim4_index_round_trips() {
        let pairing: FacetPairing<4> = FacetPairing::from_pairs(1, &[((0, 0), (0, 2))]).unwrap();
        let perms = GluingPerms::new(pairing);
        let spec = FacetSpec::new(0, 0);
        for index in 0..24 {
            let gluing = perms.index_to_gluing(spec, index);
            assert_eq!(perms.gluing_to_index(spec, gluing), index);
            assert_eq!(gluing.image(0), 2);
        }
    }

    #[test]
    fn fresh_tableau_is_undecided_everywhere() {
        let perms = one_tet_self();
        assert!(!perms.is_decided(FacetSpec::new(0, 0)));
        assert!(!perms.is_complete());
    }
}
