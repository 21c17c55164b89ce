//! The general-purpose dimension-3 searcher.
//!
//! This variant imposes no union-find machinery: it prunes by walking the
//! partially decided gluings around each edge of the freshly glued facet,
//! rejecting edges identified with themselves in reverse and (when purging
//! permits) edges of forbidden low degree.  Slower than the specialised
//! searchers, but valid for every combination of constraint flags.

use super::driver::{EngineCore, EngineParts, SearcherBase3};
use super::options::{CensusPurge, SearchOptions};
use super::textio::{PersistenceError, TokenReader};
use crate::core::{FacetPairing, FacetSpec, GluingPerms, Isomorphism};
use crate::perm::Perm;

/// A gluing-permutation search over a tetrahedron facet pairing, using the
/// default (fully general) algorithm.
///
/// Prefer [`super::GluingPermSearcher3::best_searcher`], which selects an
/// optimised variant whenever the constraint flags allow one.
#[derive(Clone, Debug)]
pub struct GenericSearcher3 {
    pub(crate) base: SearcherBase3,
}

impl GenericSearcher3 {
    /// The tagged-data class marker for this searcher.
    pub const DATA_TAG: char = 'g';

    /// Creates a new search over the given pairing.
    ///
    /// Every element of `autos` must be an automorphism of `pairing`; the
    /// pairing must be connected and in canonical form.
    #[must_use]
    pub fn new(
        pairing: FacetPairing<3>,
        autos: Vec<Isomorphism<4>>,
        options: SearchOptions,
    ) -> Self {
        GenericSearcher3 {
            base: SearcherBase3::new(pairing, autos, options),
        }
    }

    /// The tableau under construction.
    #[must_use]
    pub fn perms(&self) -> &GluingPerms<3> {
        &self.base.perms
    }

    pub(crate) fn read_body(reader: &mut TokenReader<'_>) -> Result<Self, PersistenceError> {
        Ok(GenericSearcher3 {
            base: SearcherBase3::read(reader, 6)?,
        })
    }

    /// Whether the gluings already chosen force an edge of the given facet
    /// to be identified with itself in reverse.
    ///
    /// With `finite_only` set, the walk additionally rejects some
    /// configurations that force non-orientable vertex links; the test is
    /// nearly free at this point and cuts non-finite triangulations early.
    fn bad_edge_link(&self, face: FacetSpec<3>) -> bool {
        let perms = &self.base.perms;
        let pairing = perms.pairing();
        let mut start = Perm::<4>::transposition(face.facet, 3);

        for _ in 0..3 {
            start = start * Perm::from_images([1, 2, 0, 3]);
            // start maps (0,1,2) to the vertices of this facet, with (0,1)
            // on the edge under examination.

            let mut current = start;
            let mut tet = face.simp;
            let mut walking = false;
            let mut incomplete = false;

            while !walking
                || tet != face.simp
                || start.image(2) != current.image(2)
                || start.image(3) != current.image(3)
            {
                if walking
                    && self.base.finite_only
                    && tet == face.simp
                    && start.image(3) == current.image(3)
                    && start.sign() != current.sign()
                {
                    // Returned to the original tetrahedron with reversed
                    // orientation: a bad edge or vertex link either way.
                    return true;
                }

                walking = true;
                current = current * Perm::transposition(2, 3);

                let exit = FacetSpec::new(tet, current.image(3));
                if pairing.is_unmatched(exit) {
                    incomplete = true;
                    break;
                }
                let adj = pairing.dest_spec(exit);

                if perms.is_decided(exit) {
                    current = perms.gluing(exit) * current;
                } else if perms.is_decided(adj) {
                    current = perms.gluing(adj).inverse() * current;
                } else {
                    incomplete = true;
                    break;
                }
                tet = adj.simp;
            }

            if !incomplete && start != current {
                return true;
            }
        }
        false
    }

    /// Whether the gluings already chosen produce a completed edge of
    /// forbidden low degree around the given facet.
    fn low_degree_edge(&self, face: FacetSpec<3>, test_degree_12: bool, test_degree_3: bool) -> bool {
        let perms = &self.base.perms;
        let pairing = perms.pairing();
        let mut start = Perm::<4>::transposition(face.facet, 3);

        for _ in 0..3 {
            start = start * Perm::from_images([1, 2, 0, 3]);

            let mut current = start;
            let mut tet = face.simp;
            let mut walking = false;
            let mut incomplete = false;
            let mut degree = 0u32;

            while !walking
                || tet != face.simp
                || start.image(2) != current.image(2)
                || start.image(3) != current.image(3)
            {
                walking = true;

                if degree >= 3 {
                    incomplete = true;
                    break;
                }

                current = current * Perm::transposition(2, 3);

                let exit = FacetSpec::new(tet, current.image(3));
                if pairing.is_unmatched(exit) {
                    incomplete = true;
                    break;
                }
                let adj = pairing.dest_spec(exit);

                if perms.is_decided(exit) {
                    current = perms.gluing(exit) * current;
                } else if perms.is_decided(adj) {
                    current = perms.gluing(adj).inverse() * current;
                } else {
                    incomplete = true;
                    break;
                }
                tet = adj.simp;
                degree += 1;
            }

            if !incomplete {
                if test_degree_12 && degree < 3 {
                    return true;
                }
                if test_degree_3 && degree == 3 {
                    // A degree-three edge is only discardable when it meets
                    // three distinct tetrahedra.
                    let tet1 = pairing.dest(face.simp, start.image(2)).simp;
                    let tet2 = pairing.dest(face.simp, start.image(3)).simp;
                    if face.simp != tet1 && tet1 != tet2 && tet2 != face.simp {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Whether the purge flags let us reject the gluing just made at the
    /// given facet on low-degree-edge grounds.
    fn may_purge(&self, face: FacetSpec<3>) -> bool {
        // Degree-three edges may go whenever minimality is purged.
        let purge_deg_3 = self.base.purge.has(CensusPurge::NON_MINIMAL);

        // Squashing a degree-one or -two edge can lose primality, a
        // projective plane, or a small piece (ball, sphere, L(3,1)), so
        // every corresponding purge flag must be present.
        let purge_deg_12 = purge_deg_3
            && self.base.purge.has(CensusPurge::NON_PRIME)
            && (self.base.purge.has(CensusPurge::P2_REDUCIBLE) || self.base.orientable_only)
            && self.base.finite_only
            && self.base.perms.size() > 2;

        if purge_deg_12 || purge_deg_3 {
            self.low_degree_edge(face, purge_deg_12, purge_deg_3)
        } else {
            false
        }
    }
}

impl EngineCore for GenericSearcher3 {
    fn started(&self) -> bool {
        self.base.started
    }

    fn start(&mut self) {
        self.base.started = true;
        if !self.base.orientation.is_empty() {
            self.base.orientation[0] = 1;
        }
    }

    fn order_size(&self) -> usize {
        self.base.order.len()
    }

    fn order_elt(&self) -> isize {
        self.base.order_elt
    }

    fn bump_order_elt(&mut self, delta: isize) {
        self.base.order_elt += delta;
    }

    fn advance_perm(&mut self) -> bool {
        self.base.advance_perm_standard()
    }

    fn clear_current_pair(&mut self) {
        self.base.clear_current_pair();
    }

    fn step(&mut self) -> bool {
        let face = self.base.current_face();
        if self.may_purge(face) {
            return false;
        }
        if !self.base.orientable_only && self.bad_edge_link(face) {
            return false;
        }
        true
    }

    fn unstep(&mut self) {
        // Nothing to undo: this variant keeps no incremental state.
    }

    fn assign_orientation(&mut self) {
        self.base.assign_orientation_standard();
    }

    fn seed_orientation(&mut self) {
        self.base.seed_orientation_standard();
    }

    fn clear_seed(&mut self) {
        self.base.clear_seed();
    }

    fn is_canonical(&self) -> bool {
        self.base.is_canonical()
    }
}

impl EngineParts for GenericSearcher3 {
    type Emitted = GluingPerms<3>;

    fn tableau(&self) -> &GluingPerms<3> {
        &self.base.perms
    }

    fn data_tag(&self) -> char {
        Self::DATA_TAG
    }

    fn dump_body(&self, out: &mut String) {
        self.base.dump(out);
    }
}
