//! Searcher for a prescribed vertex-link Euler characteristic.
//!
//! Every vertex link must close off with the target Euler characteristic
//! (with punctures filled); on pairings with boundary facets this makes
//! boundary vertex links the once-punctured surfaces of characteristic
//! target − 1.  Every edge must additionally be valid, i.e. not identified
//! with itself in reverse.
//!
//! The search maintains the union-find link machinery of
//! [`super::classes3`] and prunes the moment a link's running Euler
//! characteristic drops below the target: no later closure can climb back.

use super::classes3::{EdgeRules, LinkClasses3, MergeCtx, VLINK_BAD_EULER};
use super::driver::{EngineCore, EngineParts, SearcherBase3};
use super::options::{CensusPurge, SearchOptions};
use super::textio::{PersistenceError, TokenReader};
use crate::core::{FacetPairing, GluingPerms, Isomorphism};
use std::fmt::Write as _;

/// A gluing-permutation search restricting all vertex links to a fixed
/// Euler characteristic.
#[derive(Clone, Debug)]
pub struct EulerSearcher3 {
    pub(crate) base: SearcherBase3,
    pub(crate) classes: LinkClasses3,
    pub(crate) euler: i32,
}

impl EulerSearcher3 {
    /// The tagged-data class marker for this searcher.
    pub const DATA_TAG: char = 'e';

    /// Creates a new search whose vertex links must realise Euler
    /// characteristic `euler` (at most 2).
    ///
    /// Every element of `autos` must be an automorphism of `pairing`; the
    /// pairing must be connected and in canonical form.
    #[must_use]
    pub fn new(
        euler: i32,
        pairing: FacetPairing<3>,
        autos: Vec<Isomorphism<4>>,
        orientable_only: bool,
        purge: CensusPurge,
    ) -> Self {
        assert!(euler <= 2, "no surface has Euler characteristic above 2");
        let options = SearchOptions {
            orientable_only,
            finite_only: true,
            purge,
        };
        let base = SearcherBase3::new(pairing, autos, options);
        let classes = LinkClasses3::new(base.perms.size(), base.order.len());
        EulerSearcher3 {
            base,
            classes,
            euler,
        }
    }

    /// The Euler characteristic that vertex links must attain.
    #[must_use]
    pub fn target_euler(&self) -> i32 {
        self.euler
    }

    /// The tableau under construction.
    #[must_use]
    pub fn perms(&self) -> &GluingPerms<3> {
        &self.base.perms
    }

    pub(crate) fn read_body(reader: &mut TokenReader<'_>) -> Result<Self, PersistenceError> {
        let base = SearcherBase3::read(reader, 6)?;
        let euler = reader.next_in_range("euler target", i64::MIN, 2)? as i32;
        let classes = LinkClasses3::read(reader, base.perms.size(), base.order.len())?;
        Ok(EulerSearcher3 {
            base,
            classes,
            euler,
        })
    }
}

impl EngineCore for EulerSearcher3 {
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
        let ctx = MergeCtx {
            perms: &self.base.perms,
            order: &self.base.order,
            order_elt: self.base.order_elt as usize,
        };

        if self.classes.merge_edge_classes(&ctx, EdgeRules::default(), None) != 0 {
            // An edge identified with itself in reverse.
            self.classes.split_edge_classes(&ctx, EdgeRules::default(), None);
            return false;
        }

        let verdict = self.classes.merge_vertex_classes(&ctx, self.euler);
        if verdict & VLINK_BAD_EULER != 0 {
            // This link can never attain the target characteristic.
            self.classes.split_vertex_classes(&ctx);
            self.classes.split_edge_classes(&ctx, EdgeRules::default(), None);
            return false;
        }

        #[cfg(feature = "self-test")]
        {
            self.classes.check_vertex_boundary_rings();
            self.classes.check_union_find(&self.base.perms);
        }

        true
    }

    fn unstep(&mut self) {
        let ctx = MergeCtx {
            perms: &self.base.perms,
            order: &self.base.order,
            order_elt: self.base.order_elt as usize,
        };
        self.classes.split_vertex_classes(&ctx);
        self.classes.split_edge_classes(&ctx, EdgeRules::default(), None);
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

    fn end_of_search_check(&self) {
        self.classes.check_all_reset(self.base.perms.size());
    }
}

impl EngineParts for EulerSearcher3 {
    type Emitted = GluingPerms<3>;

    fn tableau(&self) -> &GluingPerms<3> {
        &self.base.perms
    }

    fn data_tag(&self) -> char {
        Self::DATA_TAG
    }

    fn dump_body(&self, out: &mut String) {
        self.base.dump(out);
        let _ = writeln!(out, "{}", self.euler);
        self.classes.dump(out, self.base.perms.size());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::driver::CensusSearch;
    use crate::core::FacetSpec;

    fn closed_two_tets() -> FacetPairing<3> {
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

    /// Strips the ring backup cursors, which are scratch space outside the
    /// reversibility contract.
    fn normalised(classes: &LinkClasses3) -> LinkClasses3 {
        let mut copy = classes.clone();
        for state in &mut copy.vertex {
            state.bdry_next_old = [-1, -1];
            state.bdry_twist_old = [0, 0];
        }
        copy
    }

    /// Every advance must be matched by an exact retreat: after the search
    /// tree is exhausted, the class state is bit-identical to the initial
    /// state.
    #[test]
    fn search_restores_all_state() {
        for pairing in [
            closed_two_tets(),
            FacetPairing::from_pairs(1, &[((0, 0), (0, 1)), ((0, 2), (0, 3))]).unwrap(),
            FacetPairing::from_pairs(1, &[((0, 0), (0, 1))]).unwrap(),
        ] {
            for euler in [2, 0] {
                let mut searcher =
                    EulerSearcher3::new(euler, pairing.clone(), Vec::new(), false, Default::default());
                let pristine = normalised(&searcher.classes);
                let tableau = searcher.base.perms.clone();
                searcher.run_search(|_| {});
                assert_eq!(normalised(&searcher.classes), pristine);
                assert_eq!(searcher.base.perms, tableau);
                // The restored state also passes the structural self-tests.
                searcher.classes.check_vertex_boundary_rings();
                searcher.classes.check_union_find(&searcher.base.perms);
            }
        }
    }

    /// Emitted tableaus are always complete and mutually distinct.
    #[test]
    fn torus_cusped_census_closes_all_links() {
        let mut searcher =
            EulerSearcher3::new(0, closed_two_tets(), Vec::new(), true, Default::default());
        let mut count = 0;
        searcher.partial_search(8, |snapshot| {
            if !snapshot.is_complete() {
                return;
            }
            count += 1;
            // Every vertex link in the resumed state is closed with χ = 0.
            let resumed = match crate::census::tagged::GluingPermSearcher3::from_tagged_data(
                snapshot.data(),
            )
            .unwrap()
            {
                crate::census::tagged::GluingPermSearcher3::Euler(searcher) => searcher,
                _ => unreachable!("tag 'e' parses to the Euler variant"),
            };
            for root in 0..resumed.classes.vertex.len() {
                if resumed.classes.vertex[root].parent >= 0 {
                    continue;
                }
                assert_eq!(resumed.classes.vertex[root].bdry, 0);
                assert_eq!(resumed.classes.vertex[root].euler, 0);
            }
            for spec in FacetSpec::all(2) {
                assert!(resumed.base.perms.is_decided(spec));
            }
        });
        assert!(count > 0, "the two-tetrahedron cusped census is not empty");
    }
}
