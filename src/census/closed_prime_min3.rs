//! Searcher for closed prime minimal P²-irreducible censuses.
//!
//! This variant leans on structural results about the facet pairing graphs
//! of such triangulations.  The traversal order is rebuilt around the
//! graph's one-ended chains (layered solid tori), whose gluings admit only
//! two candidate permutations each — and the second half of each internal
//! chain edge is forced outright by the first.  Edge merges reject
//! low-degree edges, cone and L(3,1) face identifications, and degree sums
//! that force a low-degree edge later; vertex merges reject anything that
//! cannot close into the census's single sphere link.
//!
//! Unwanted triangulations (non-prime, non-minimal) may still be emitted,
//! just far fewer of them; nothing wanted is ever lost.

use super::classes3::{
    EdgeRules, HighDegree, LinkClasses3, MergeCtx, VLINK_BAD_EULER, VLINK_CLOSED,
};
use super::compact3::SPHERE_EULER;
use super::driver::{EngineCore, EngineParts, SearcherBase3};
use super::options::{CensusPurge, SearchOptions};
use super::textio::{PersistenceError, TokenReader};
use crate::core::{FacetPairing, FacetSpec, GluingPerms, Isomorphism};
use crate::perm::{FacePair, Perm};
use std::fmt::Write as _;
use tracing::warn;

const EDGE_RULES: EdgeRules = EdgeRules {
    low_deg: true,
    masks: true,
    cone: true,
    l31: true,
};

/// Classification of the traversal-order edges of the pairing graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdgeType {
    /// The loop closing the end of a one-ended chain.
    ChainEnd,
    /// First half of a double edge internal to a one-ended chain; the
    /// order entry holds the facet nearest the chain's loop.
    ChainInternalFirst,
    /// Second half of the same double edge; its gluing is forced by the
    /// first half's choice.
    ChainInternalSecond,
    /// First half of a double edge outside any chain; the order entry
    /// holds the facet of the lower-numbered tetrahedron.
    DoubleFirst,
    /// Second half of a double edge outside any chain.
    DoubleSecond,
    /// Any other pairing graph edge.
    Misc,
}

impl EdgeType {
    fn encode(self) -> u8 {
        match self {
            EdgeType::ChainEnd => 1,
            EdgeType::ChainInternalFirst => 2,
            EdgeType::ChainInternalSecond => 3,
            EdgeType::DoubleFirst => 4,
            EdgeType::DoubleSecond => 5,
            EdgeType::Misc => 6,
        }
    }

    fn decode(value: u8) -> Option<Self> {
        match value {
            1 => Some(EdgeType::ChainEnd),
            2 => Some(EdgeType::ChainInternalFirst),
            3 => Some(EdgeType::ChainInternalSecond),
            4 => Some(EdgeType::DoubleFirst),
            5 => Some(EdgeType::DoubleSecond),
            6 => Some(EdgeType::Misc),
            _ => None,
        }
    }
}

fn perm_from_pairs(pairs: [(usize, usize); 4]) -> Perm<4> {
    let mut images = [0u8; 4];
    for (from, to) in pairs {
        images[from] = to as u8;
    }
    Perm::from_images(images)
}

/// A gluing-permutation search specialised to closed prime minimal
/// P²-irreducible triangulations of at least three tetrahedra.
#[derive(Clone, Debug)]
pub struct ClosedPrimeMinSearcher3 {
    pub(crate) base: SearcherBase3,
    pub(crate) classes: LinkClasses3,
    pub(crate) order_type: Vec<EdgeType>,
    pub(crate) n_chain_edges: usize,
    /// The two candidate gluing indices per chain-end / chain-internal
    /// first edge; for second halves, the forced gluing matching each of
    /// the first half's candidates.
    pub(crate) chain_perm_indices: Vec<i8>,
    pub(crate) high_deg: HighDegree,
}

impl ClosedPrimeMinSearcher3 {
    /// The tagged-data class marker for this searcher.
    pub const DATA_TAG: char = 'c';

    /// Creates a new closed prime minimal P²-irreducible search.
    ///
    /// Every element of `autos` must be an automorphism of `pairing`; the
    /// pairing must be connected, closed, of size at least three, and in
    /// canonical form.
    #[must_use]
    pub fn new(
        pairing: FacetPairing<3>,
        autos: Vec<Isomorphism<4>>,
        orientable_only: bool,
    ) -> Self {
        assert!(
            pairing.is_closed() && pairing.size() >= 3,
            "this searcher requires a closed pairing of at least three tetrahedra"
        );

        let options = SearchOptions {
            orientable_only,
            finite_only: true,
            purge: CensusPurge::NON_MINIMAL | CensusPurge::NON_PRIME | CensusPurge::P2_REDUCIBLE,
        };
        let mut base = SearcherBase3::new(pairing, autos, options);
        let n_tets = base.perms.size();
        let pairing = base.perms.pairing().clone();

        // Rebuild the traversal order around the pairing graph's
        // structures: one-ended chains first (loop outwards, chains may
        // interlace), then everything else facet by facet.  Both halves of
        // each double edge sit consecutively.
        let mut order = vec![FacetSpec::new(0, 0); 2 * n_tets];
        let mut order_type = vec![EdgeType::Misc; 2 * n_tets];
        let mut order_assigned = vec![false; 4 * n_tets];
        let mut order_done = 0;

        // Tetrahedra glued to themselves are the chain ends.  Each
        // tetrahedron is glued to itself at most once, since the pairing is
        // connected with at least three tetrahedra.
        for face in FacetSpec::all(n_tets) {
            if order_assigned[face.index()] {
                continue;
            }
            let adj = pairing.dest_spec(face);
            if adj.simp != face.simp {
                continue;
            }
            order[order_done] = face;
            order_type[order_done] = EdgeType::ChainEnd;
            order_assigned[face.index()] = true;
            order_assigned[adj.index()] = true;
            order_done += 1;
        }
        let n_chains = order_done;

        // Follow each chain from its loop towards its boundary.
        for i in 0..n_chains {
            let mut tet = order[i].simp;
            let mut faces =
                FacePair::new(order[i].facet, pairing.dest_spec(order[i]).facet).complement();
            let mut dest1 = pairing.dest(tet, faces.lower());
            let mut dest2 = pairing.dest(tet, faces.upper());

            while dest1.simp == dest2.simp
                && dest1.simp != tet
                && !order_assigned[tet * 4 + faces.lower()]
                && !order_assigned[tet * 4 + faces.upper()]
            {
                order_type[order_done] = EdgeType::ChainInternalFirst;
                order_type[order_done + 1] = EdgeType::ChainInternalSecond;

                if tet < dest1.simp {
                    order[order_done] = FacetSpec::new(tet, faces.lower());
                    order[order_done + 1] = FacetSpec::new(tet, faces.upper());
                }

                order_assigned[tet * 4 + faces.lower()] = true;
                order_assigned[tet * 4 + faces.upper()] = true;
                order_assigned[dest1.index()] = true;
                order_assigned[dest2.index()] = true;

                let next_faces = FacePair::new(dest1.facet, dest2.facet);
                if dest1.simp < tet {
                    order[order_done] = FacetSpec::new(dest1.simp, next_faces.lower());
                    order[order_done + 1] = FacetSpec::new(dest1.simp, next_faces.upper());
                }

                faces = next_faces.complement();
                tet = dest1.simp;
                dest1 = pairing.dest(tet, faces.lower());
                dest2 = pairing.dest(tet, faces.upper());

                order_done += 2;
            }
        }
        let n_chain_edges = order_done;

        // Everything else, with double edges tagged.
        for face in FacetSpec::all(n_tets) {
            if order_assigned[face.index()] {
                continue;
            }
            let adj = pairing.dest_spec(face);
            order[order_done] = face;
            order_type[order_done] = if face.facet < 3
                && pairing.dest(face.simp, face.facet + 1).simp == adj.simp
            {
                EdgeType::DoubleFirst
            } else if face.facet > 0 && pairing.dest(face.simp, face.facet - 1).simp == adj.simp {
                EdgeType::DoubleSecond
            } else {
                EdgeType::Misc
            };
            order_done += 1;
            order_assigned[face.index()] = true;
            order_assigned[adj.index()] = true;
        }
        debug_assert_eq!(order_done, 2 * n_tets);
        base.order = order;

        // The two gluings to try for each chain-end and chain-internal
        // first edge; second halves record the forced partner of each.
        let mut chain_perm_indices = vec![0i8; 2 * n_chain_edges];
        let perms = &base.perms;
        for i in 0..n_chain_edges {
            match order_type[i] {
                EdgeType::ChainEnd => {
                    let faces =
                        FacePair::new(base.order[i].facet, pairing.dest_spec(base.order[i]).facet);
                    let comp = faces.complement();
                    chain_perm_indices[2 * i] = perms.gluing_to_index(
                        base.order[i],
                        perm_from_pairs([
                            (faces.lower(), faces.upper()),
                            (faces.upper(), comp.lower()),
                            (comp.lower(), comp.upper()),
                            (comp.upper(), faces.lower()),
                        ]),
                    );
                    chain_perm_indices[2 * i + 1] = perms.gluing_to_index(
                        base.order[i],
                        perm_from_pairs([
                            (faces.lower(), faces.upper()),
                            (faces.upper(), comp.upper()),
                            (comp.upper(), comp.lower()),
                            (comp.lower(), faces.lower()),
                        ]),
                    );
                }
                EdgeType::ChainInternalFirst => {
                    let faces = FacePair::new(base.order[i].facet, base.order[i + 1].facet);
                    let comp = faces.complement();
                    let faces_adj = FacePair::new(
                        pairing.dest_spec(base.order[i]).facet,
                        pairing.dest_spec(base.order[i + 1]).facet,
                    );
                    let comp_adj = faces_adj.complement();

                    let trial1 = perm_from_pairs([
                        (faces.lower(), faces_adj.lower()),
                        (faces.upper(), comp_adj.lower()),
                        (comp.lower(), comp_adj.upper()),
                        (comp.upper(), faces_adj.upper()),
                    ]);
                    let trial2 = perm_from_pairs([
                        (faces.lower(), faces_adj.lower()),
                        (faces.upper(), comp_adj.upper()),
                        (comp.lower(), comp_adj.lower()),
                        (comp.upper(), faces_adj.upper()),
                    ]);
                    if trial1 < trial2 {
                        chain_perm_indices[2 * i] = perms.gluing_to_index(base.order[i], trial1);
                        chain_perm_indices[2 * i + 2] = perms.gluing_to_index(
                            base.order[i + 1],
                            perm_from_pairs([
                                (faces.lower(), comp_adj.upper()),
                                (faces.upper(), faces_adj.upper()),
                                (comp.lower(), faces_adj.lower()),
                                (comp.upper(), comp_adj.lower()),
                            ]),
                        );
                    } else {
                        chain_perm_indices[2 * i] = perms.gluing_to_index(base.order[i], trial2);
                        chain_perm_indices[2 * i + 2] = perms.gluing_to_index(
                            base.order[i + 1],
                            perm_from_pairs([
                                (faces.lower(), comp_adj.lower()),
                                (faces.upper(), faces_adj.upper()),
                                (comp.lower(), faces_adj.lower()),
                                (comp.upper(), comp_adj.upper()),
                            ]),
                        );
                    }

                    let trial1 = perm_from_pairs([
                        (faces.lower(), faces_adj.lower()),
                        (faces.upper(), comp_adj.lower()),
                        (comp.lower(), faces_adj.upper()),
                        (comp.upper(), comp_adj.upper()),
                    ]);
                    let trial2 = perm_from_pairs([
                        (faces.lower(), faces_adj.lower()),
                        (faces.upper(), comp_adj.upper()),
                        (comp.lower(), faces_adj.upper()),
                        (comp.upper(), comp_adj.lower()),
                    ]);
                    if trial1 < trial2 {
                        chain_perm_indices[2 * i + 1] =
                            perms.gluing_to_index(base.order[i], trial1);
                        chain_perm_indices[2 * i + 3] = perms.gluing_to_index(
                            base.order[i + 1],
                            perm_from_pairs([
                                (faces.lower(), comp_adj.upper()),
                                (faces.upper(), faces_adj.upper()),
                                (comp.lower(), comp_adj.lower()),
                                (comp.upper(), faces_adj.lower()),
                            ]),
                        );
                    } else {
                        chain_perm_indices[2 * i + 1] =
                            perms.gluing_to_index(base.order[i], trial2);
                        chain_perm_indices[2 * i + 3] = perms.gluing_to_index(
                            base.order[i + 1],
                            perm_from_pairs([
                                (faces.lower(), comp_adj.lower()),
                                (faces.upper(), faces_adj.upper()),
                                (comp.lower(), comp_adj.upper()),
                                (comp.upper(), faces_adj.lower()),
                            ]),
                        );
                    }
                }
                _ => {}
            }
        }

        // Degree-three edges can survive only when the pairing supports a
        // (1,3,4) layered solid torus, which canonical form lets us read
        // off the first tetrahedron's destinations.
        let high_deg_limit: u32 = if pairing.dest(0, 0).simp == 0
            && pairing.dest(0, 2).simp == 1
            && pairing.dest(0, 3).simp == 1
        {
            3
        } else {
            4
        };
        let high_deg = HighDegree {
            limit: high_deg_limit,
            sum: 0,
            bound: (6 - high_deg_limit) * n_tets as u32 - high_deg_limit,
        };

        let classes = LinkClasses3::new(n_tets, base.order.len());
        ClosedPrimeMinSearcher3 {
            base,
            classes,
            order_type,
            n_chain_edges,
            chain_perm_indices,
            high_deg,
        }
    }

    /// The tableau under construction.
    #[must_use]
    pub fn perms(&self) -> &GluingPerms<3> {
        &self.base.perms
    }

    pub(crate) fn read_body(reader: &mut TokenReader<'_>) -> Result<Self, PersistenceError> {
        let base = SearcherBase3::read(reader, 6)?;
        let n_tets = base.perms.size();
        let classes = LinkClasses3::read(reader, n_tets, base.order.len())?;

        let mut order_type = Vec::with_capacity(base.order.len());
        for _ in 0..base.order.len() {
            let raw = reader.next_in_range("order edge type", 1, 6)? as u8;
            order_type.push(EdgeType::decode(raw).expect("range checked"));
        }

        let n_chain_edges = reader.next_usize("chain edge count", base.order.len())?;
        let mut chain_perm_indices = Vec::with_capacity(2 * n_chain_edges);
        for _ in 0..2 * n_chain_edges {
            chain_perm_indices.push(reader.next_in_range("chain permutation", 0, 5)? as i8);
        }

        let limit = reader.next_in_range("high degree limit", 3, 4)? as u32;
        let sum = reader.next_usize("high degree sum", 6 * n_tets)? as u32;
        let bound = reader.next_i64("high degree bound")?;
        if bound != i64::from((6 - limit) * n_tets as u32 - limit) {
            return Err(PersistenceError::OutOfRange {
                field: "high degree bound",
                value: bound,
            });
        }
        let high_deg = HighDegree {
            limit,
            sum,
            bound: bound as u32,
        };

        Ok(ClosedPrimeMinSearcher3 {
            base,
            classes,
            order_type,
            n_chain_edges,
            chain_perm_indices,
            high_deg,
        })
    }
}

impl EngineCore for ClosedPrimeMinSearcher3 {
    fn started(&self) -> bool {
        self.base.started
    }

    fn start(&mut self) {
        self.base.started = true;
        // Chain-internal tetrahedra never carry orientations; pin the
        // first generic one instead.
        if self.n_chain_edges < self.base.order.len() {
            let simp = self.base.order[self.n_chain_edges].simp;
            self.base.orientation[simp] = 1;
        }
    }

    fn pre_search_reject(&self) -> bool {
        // No closed prime minimal P²-irreducible triangulation has a
        // pairing graph with a triple edge.
        self.base.perms.pairing().has_triple_edge()
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
        let i = self.base.order_elt as usize;
        let face = self.base.current_face();
        let adj = self.base.current_adj();
        match self.order_type[i] {
            EdgeType::ChainEnd | EdgeType::ChainInternalFirst => {
                // Only the two precomputed candidates need trying.
                let current = self.base.perms.perm_index(face);
                let next = if current < 0 {
                    self.chain_perm_indices[2 * i]
                } else if current == self.chain_perm_indices[2 * i] {
                    self.chain_perm_indices[2 * i + 1]
                } else {
                    return false;
                };
                self.base.perms.set_perm_index(face, next);
                self.base
                    .perms
                    .set_perm_index(adj, Perm::<3>::INV_S3[next as usize] as i8);
                true
            }
            EdgeType::ChainInternalSecond => {
                // Forced by the partner edge's choice; one candidate only.
                if self.base.perms.perm_index(face) >= 0 {
                    return false;
                }
                let first = self.base.perms.perm_index(self.base.order[i - 1]);
                let next = if first == self.chain_perm_indices[2 * i - 2] {
                    self.chain_perm_indices[2 * i]
                } else {
                    self.chain_perm_indices[2 * i + 1]
                };
                self.base.perms.set_perm_index(face, next);
                self.base
                    .perms
                    .set_perm_index(adj, Perm::<3>::INV_S3[next as usize] as i8);
                true
            }
            _ => self.base.advance_perm_standard(),
        }
    }

    fn clear_current_pair(&mut self) {
        self.base.clear_current_pair();
    }

    fn step(&mut self) -> bool {
        let n_tets = self.base.perms.size();
        let order_size = self.base.order.len();
        let order_elt = self.base.order_elt as usize;

        let ctx = MergeCtx {
            perms: &self.base.perms,
            order: &self.base.order,
            order_elt,
        };
        let edge_verdict =
            self.classes
                .merge_edge_classes(&ctx, EDGE_RULES, Some(&mut self.high_deg));
        if edge_verdict != 0 {
            self.classes
                .split_edge_classes(&ctx, EDGE_RULES, Some(&mut self.high_deg));
            return false;
        }

        // A one-vertex triangulation has exactly n + 1 edges; prune as soon
        // as that count is unreachable in either direction.
        if self.classes.n_edge_classes < n_tets + 1 {
            self.classes
                .split_edge_classes(&ctx, EDGE_RULES, Some(&mut self.high_deg));
            return false;
        }
        if self.classes.n_edge_classes > n_tets + 1 + 3 * (order_size - order_elt - 1) {
            // Each remaining gluing closes at most three edge classes.
            self.classes
                .split_edge_classes(&ctx, EDGE_RULES, Some(&mut self.high_deg));
            return false;
        }

        let verdict = self.classes.merge_vertex_classes(&ctx, SPHERE_EULER);
        if verdict & VLINK_CLOSED != 0 && order_elt + 1 < order_size {
            // Closing a link before the last gluing leaves more than one
            // vertex in the final triangulation.
            self.classes.split_vertex_classes(&ctx);
            self.classes
                .split_edge_classes(&ctx, EDGE_RULES, Some(&mut self.high_deg));
            return false;
        }
        if verdict & VLINK_BAD_EULER != 0 {
            self.classes.split_vertex_classes(&ctx);
            self.classes
                .split_edge_classes(&ctx, EDGE_RULES, Some(&mut self.high_deg));
            return false;
        }
        if self.classes.n_vertex_classes > 1 + 3 * (order_size - order_elt - 1) {
            self.classes.split_vertex_classes(&ctx);
            self.classes
                .split_edge_classes(&ctx, EDGE_RULES, Some(&mut self.high_deg));
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
        self.classes
            .split_edge_classes(&ctx, EDGE_RULES, Some(&mut self.high_deg));
    }

    fn assign_orientation(&mut self) {
        // Chain gluings carry no orientation information.
        if matches!(
            self.order_type[self.base.order_elt as usize],
            EdgeType::DoubleFirst | EdgeType::DoubleSecond | EdgeType::Misc
        ) {
            self.base.assign_orientation_standard();
        }
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
        if self.high_deg.sum != 0 {
            warn!(sum = self.high_deg.sum, "high-degree sum not restored at end of search");
        }
    }
}

impl EngineParts for ClosedPrimeMinSearcher3 {
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

        for edge_type in &self.order_type {
            let _ = write!(out, "{} ", edge_type.encode());
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "{}", self.n_chain_edges);
        for index in &self.chain_perm_indices {
            let _ = write!(out, "{index} ");
        }
        let _ = writeln!(out);

        let _ = writeln!(
            out,
            "{} {} {}",
            self.high_deg.limit, self.high_deg.sum, self.high_deg.bound
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::simplex::{CONE_EDGE, CONE_NO_TWIST, TET_EDGE_FACE_DIRECTIONS};

    /// The trit-mask cone detection must agree with the explicit table of
    /// the twelve conical edge identifications.
    #[test]
    fn cone_table_matches_mask_detection() {
        for (i, pair) in CONE_EDGE.iter().enumerate() {
            let [e, f] = *pair;
            let mut classes = LinkClasses3::new(1, 1);

            // Identify the two edges with the stated twist and combine the
            // masks exactly as a merge would.
            let twist = 1 - CONE_NO_TWIST[i];
            let (f_pos, f_neg) = (classes.edge[f].faces_pos, classes.edge[f].faces_neg);
            if twist != 0 {
                classes.edge[e].faces_pos += f_neg;
                classes.edge[e].faces_neg += f_pos;
            } else {
                classes.edge[e].faces_pos += f_pos;
                classes.edge[e].faces_neg += f_neg;
            }
            assert!(
                classes.edge[e]
                    .faces_pos
                    .has_nonzero_match(&classes.edge[e].faces_neg),
                "cone {i} not detected"
            );
        }
    }

    /// Identifying two edges of a common face with the *wrong* twist must
    /// not read as a cone.
    #[test]
    fn non_cone_twists_stay_clean() {
        for (i, pair) in CONE_EDGE.iter().enumerate() {
            let [e, f] = *pair;
            // Only meaningful when the two edges share exactly one face.
            let shared: Vec<usize> = TET_EDGE_FACE_DIRECTIONS[e]
                .iter()
                .filter(|(face, _)| TET_EDGE_FACE_DIRECTIONS[f].iter().any(|(g, _)| g == face))
                .map(|(face, _)| *face)
                .collect();
            if shared.len() != 1 {
                continue;
            }

            let mut classes = LinkClasses3::new(1, 1);
            let twist = CONE_NO_TWIST[i];
            let (f_pos, f_neg) = (classes.edge[f].faces_pos, classes.edge[f].faces_neg);
            if twist != 0 {
                classes.edge[e].faces_pos += f_neg;
                classes.edge[e].faces_neg += f_pos;
            } else {
                classes.edge[e].faces_pos += f_pos;
                classes.edge[e].faces_neg += f_neg;
            }
            assert!(
                !classes.edge[e]
                    .faces_pos
                    .has_nonzero_match(&classes.edge[e].faces_neg),
                "false cone at entry {i}"
            );
        }
    }
}

#[cfg(test)]
mod chain_tests {
    use super::*;
    use crate::census::driver::CensusSearch;

    fn chain_of_three() -> FacetPairing<3> {
        FacetPairing::from_pairs(
            3,
            &[
                ((0, 0), (0, 1)),
                ((0, 2), (1, 0)),
                ((0, 3), (1, 1)),
                ((1, 2), (2, 0)),
                ((1, 3), (2, 1)),
                ((2, 2), (2, 3)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn traversal_order_follows_the_chains() {
        let searcher = ClosedPrimeMinSearcher3::new(chain_of_three(), Vec::new(), true);

        // Two chain ends, then the interleaved internal double edges.
        assert_eq!(searcher.order_type[0], EdgeType::ChainEnd);
        assert_eq!(searcher.order_type[1], EdgeType::ChainEnd);
        assert_eq!(searcher.n_chain_edges, 6);
        assert_eq!(
            searcher
                .order_type
                .iter()
                .filter(|t| matches!(t, EdgeType::ChainInternalFirst))
                .count(),
            2
        );
        // Every chain edge carries two candidate permutations.
        assert_eq!(searcher.chain_perm_indices.len(), 12);
        for pair in searcher.chain_perm_indices.chunks(2) {
            assert!((0..6).contains(&pair[0]));
            assert!((0..6).contains(&pair[1]));
        }
    }

    #[test]
    fn high_degree_sum_is_restored_after_the_search() {
        let mut searcher = ClosedPrimeMinSearcher3::new(chain_of_three(), Vec::new(), true);
        searcher.run_search(|_| {});
        assert_eq!(searcher.high_deg.sum, 0);
        assert_eq!(searcher.classes.n_edge_classes, 18);
        assert_eq!(searcher.classes.n_vertex_classes, 12);
    }

    #[test]
    fn triple_edge_pairings_are_rejected_outright() {
        // Three tetrahedra with a triple edge between the first two.
        let pairing = FacetPairing::from_pairs(
            3,
            &[
                ((0, 0), (1, 0)),
                ((0, 1), (1, 1)),
                ((0, 2), (1, 2)),
                ((0, 3), (2, 0)),
                ((1, 3), (2, 1)),
                ((2, 2), (2, 3)),
            ],
        )
        .unwrap();
        assert!(pairing.has_triple_edge());
        let mut searcher = ClosedPrimeMinSearcher3::new(pairing, Vec::new(), true);
        let mut emitted = 0;
        searcher.run_search(|_| emitted += 1);
        assert_eq!(emitted, 0);
    }
}
