//! Searcher for minimal ideal triangulations of cusped hyperbolic
//! 3-manifolds.
//!
//! Vertex links must be tori or Klein bottles (χ = 0).  On top of the
//! Euler-characteristic machinery, edge merges reject structures that
//! cannot occur in a minimal ideal triangulation of a finite-volume
//! hyperbolic manifold: invalid edges, edges of low degree, and conical
//! face identifications.  Non-hyperbolic and non-minimal triangulations may
//! still be emitted; nothing hyperbolic and minimal is lost.

use super::classes3::{EdgeRules, LinkClasses3, MergeCtx, VLINK_BAD_EULER};
use super::driver::{EngineCore, EngineParts, SearcherBase3};
use super::options::{CensusPurge, SearchOptions};
use super::textio::{PersistenceError, TokenReader};
use crate::core::{FacetPairing, GluingPerms, Isomorphism};

/// Vertex links of an ideal hyperbolic triangulation: tori and Klein
/// bottles.
const CUSP_EULER: i32 = 0;

const EDGE_RULES: EdgeRules = EdgeRules {
    low_deg: true,
    masks: true,
    cone: true,
    l31: false,
};

/// A gluing-permutation search for minimal cusped hyperbolic censuses.
#[derive(Clone, Debug)]
pub struct HyperbolicMinSearcher3 {
    pub(crate) base: SearcherBase3,
    pub(crate) classes: LinkClasses3,
}

impl HyperbolicMinSearcher3 {
    /// The tagged-data class marker for this searcher.
    pub const DATA_TAG: char = 'h';

    /// Creates a new search over the given closed pairing.
    ///
    /// Every element of `autos` must be an automorphism of `pairing`; the
    /// pairing must be connected, closed and in canonical form.
    #[must_use]
    pub fn new(
        pairing: FacetPairing<3>,
        autos: Vec<Isomorphism<4>>,
        orientable_only: bool,
    ) -> Self {
        debug_assert!(pairing.is_closed());
        let options = SearchOptions {
            orientable_only,
            finite_only: false,
            purge: CensusPurge::NON_MINIMAL_HYP,
        };
        let base = SearcherBase3::new(pairing, autos, options);
        let classes = LinkClasses3::new(base.perms.size(), base.order.len());
        HyperbolicMinSearcher3 { base, classes }
    }

    /// The tableau under construction.
    #[must_use]
    pub fn perms(&self) -> &GluingPerms<3> {
        &self.base.perms
    }

    pub(crate) fn read_body(reader: &mut TokenReader<'_>) -> Result<Self, PersistenceError> {
        let base = SearcherBase3::read(reader, 6)?;
        let classes = LinkClasses3::read(reader, base.perms.size(), base.order.len())?;
        Ok(HyperbolicMinSearcher3 { base, classes })
    }
}

impl EngineCore for HyperbolicMinSearcher3 {
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

        if self.classes.merge_edge_classes(&ctx, EDGE_RULES, None) != 0 {
            self.classes.split_edge_classes(&ctx, EDGE_RULES, None);
            return false;
        }

        let verdict = self.classes.merge_vertex_classes(&ctx, CUSP_EULER);
        if verdict & VLINK_BAD_EULER != 0 {
            self.classes.split_vertex_classes(&ctx);
            self.classes.split_edge_classes(&ctx, EDGE_RULES, None);
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
        self.classes.split_edge_classes(&ctx, EDGE_RULES, None);
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

impl EngineParts for HyperbolicMinSearcher3 {
    type Emitted = GluingPerms<3>;

    fn tableau(&self) -> &GluingPerms<3> {
        &self.base.perms
    }

    fn data_tag(&self) -> char {
        Self::DATA_TAG
    }

    fn dump_body(&self, out: &mut String) {
        self.base.dump(out);
        self.classes.dump(out, self.base.perms.size());
    }
}
