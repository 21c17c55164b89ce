//! The dimension-4 gluing-permutation searcher.
//!
//! Pentachoron facets are tetrahedra, glued by one of 24 permutations.
//! The union-find machinery tracks the two kinds of lower-dimensional face
//! that can go wrong as gluings are chosen:
//!
//! - **Edges.**  The link of a pentachoron edge is a 2-complex; each edge
//!   contributes one triangle (its corners are the three facets containing
//!   the edge), and the boundary of the link is tracked exactly as for
//!   dimension-3 vertex links — a cyclic ring of boundary edges with
//!   per-node cursors, a root boundary count and a running Euler
//!   characteristic.  In any valid triangulation an edge link is a sphere
//!   or disc, so a link that drops below χ = 2 or an edge identified with
//!   itself in reverse prunes the subtree immediately.
//! - **Triangles.**  A pentachoron triangle carries a full `Perm<3>` twist
//!   (rotation or reflection of the triangle) on its union-find arcs; a
//!   triangle identified with itself by a non-trivial permutation is
//!   invalid.

use super::classes3::VertexJoin;
use super::driver::{EngineCore, EngineParts, SearcherBase4};
use super::options::SearchOptions;
use super::textio::{PersistenceError, TokenReader};
use crate::core::simplex::{
    EDGE_LINK_NEXT_FACET, EDGE_LINK_PREV_FACET, PENT_EDGE_NUMBER, PENT_EDGE_VERTEX,
    PENT_TRIANGLE_VERTEX,
};
use crate::core::{FacetPairing, FacetSpec, GluingPerms, Isomorphism};
use crate::perm::Perm;
use std::fmt::Write as _;
use tracing::{error, warn};

// Edge-merge verdict flags.
const ELINK_CLOSED: u8 = 1;
const ELINK_BAD_LINK: u8 = 2;
const ELINK_REVERSED: u8 = 4;

/// Edge links must close into spheres (discs while boundary remains).
const EDGE_LINK_EULER: i32 = 2;

/// Equivalence state of one pentachoron edge (edge `e` of pentachoron `t`
/// has index `10t + e`).
///
/// The ring fields mirror the dimension-3 vertex-link cursors; see
/// [`super::classes3::TetVertexState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PentEdgeState {
    pub parent: i32,
    pub rank: u32,
    /// Boundary edges of the class link.  Root-only.
    pub bdry: u32,
    /// Euler characteristic of the link with punctures filled.  Root-only.
    pub euler: i32,
    /// Orientation agreement of link triangles with the parent's.
    pub twist_up: u8,
    /// Low-to-high agreement of the edge itself with the parent's; an edge
    /// identified with itself in reverse is invalid.
    pub twist_up_edge: u8,
    pub had_equal_rank: bool,
    pub bdry_edges: u8,
    pub bdry_next: [u32; 2],
    pub bdry_twist: [u8; 2],
    pub bdry_next_old: [i32; 2],
    pub bdry_twist_old: [u8; 2],
}

impl PentEdgeState {
    fn new(id: u32) -> Self {
        PentEdgeState {
            parent: -1,
            rank: 0,
            bdry: 3,
            euler: 2,
            twist_up: 0,
            twist_up_edge: 0,
            had_equal_rank: false,
            bdry_edges: 3,
            bdry_next: [id, id],
            bdry_twist: [0, 0],
            bdry_next_old: [-1, -1],
            bdry_twist_old: [0, 0],
        }
    }
}

/// Equivalence state of one pentachoron triangle (triangle `t` of
/// pentachoron `p` has index `10p + t`; triangle `t` is opposite edge `t`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PentTriangleState {
    pub parent: i32,
    pub rank: u32,
    pub size: u32,
    pub bounded: bool,
    /// The triangle-relabelling twist between this node and its parent
    /// (undefined at a root).
    pub twist_up: Perm<3>,
    pub had_equal_rank: bool,
}

impl PentTriangleState {
    fn new() -> Self {
        PentTriangleState {
            parent: -1,
            rank: 0,
            size: 1,
            bounded: true,
            twist_up: Perm::IDENTITY,
            had_equal_rank: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LinkClasses4 {
    pub n_edge_classes: usize,
    pub edge: Vec<PentEdgeState>,
    pub edge_changed: Vec<VertexJoin>,
    pub n_triangle_classes: usize,
    pub triangle: Vec<PentTriangleState>,
    pub triangle_changed: Vec<i32>,
}

struct MergeCtx4<'a> {
    perms: &'a GluingPerms<4>,
    order: &'a [FacetSpec<4>],
    order_elt: usize,
}

impl MergeCtx4<'_> {
    fn face(&self) -> FacetSpec<4> {
        self.order[self.order_elt]
    }

    fn adj(&self) -> FacetSpec<4> {
        self.perms.pairing().dest_spec(self.face())
    }
}

impl LinkClasses4 {
    fn new(n_pents: usize, order_size: usize) -> Self {
        LinkClasses4 {
            n_edge_classes: 10 * n_pents,
            edge: (0..10 * n_pents as u32).map(PentEdgeState::new).collect(),
            edge_changed: vec![VertexJoin::Init; 10 * order_size],
            n_triangle_classes: 10 * n_pents,
            triangle: (0..10 * n_pents).map(|_| PentTriangleState::new()).collect(),
            triangle_changed: vec![-1; 5 * order_size],
        }
    }

    // ---------- triangle classes ----------

    fn find_triangle_class(&self, mut id: usize) -> usize {
        while self.triangle[id].parent >= 0 {
            id = self.triangle[id].parent as usize;
        }
        id
    }

    fn find_triangle_class_twist(&self, mut id: usize, twist: &mut Perm<3>) -> usize {
        while self.triangle[id].parent >= 0 {
            *twist = self.triangle[id].twist_up * *twist;
            id = self.triangle[id].parent as usize;
        }
        id
    }

    /// Merges the four triangle pairs of the current gluing; returns true
    /// if a triangle ends up identified with itself non-trivially.
    fn merge_triangle_classes(&mut self, ctx: &MergeCtx4<'_>) -> bool {
        let facet = ctx.face();
        let adj = ctx.adj();
        let p = ctx.perms.gluing(facet);
        let mut invalid = false;

        let v1 = facet.facet;
        let w1 = p.image(v1);

        for v2 in 0..5 {
            if v2 == v1 {
                continue;
            }
            let w2 = p.image(v2);

            // The triangle opposite edge v1-v2 glues to the one opposite
            // w1-w2 (triangles and their opposite edges share numbering).
            let e = PENT_EDGE_NUMBER[v1][v2] as usize;
            let f = PENT_EDGE_NUMBER[w1][w2] as usize;
            let order_idx = v2 + 5 * ctx.order_elt;

            // How the gluing relabels the sorted vertices of triangle e as
            // sorted vertices of triangle f.
            let mut images = [0u8; 3];
            for (j, slot) in images.iter_mut().enumerate() {
                let target = p.image(PENT_TRIANGLE_VERTEX[e][j]);
                *slot = PENT_TRIANGLE_VERTEX[f]
                    .iter()
                    .position(|&x| x == target)
                    .expect("gluing maps triangle onto its partner") as u8;
            }
            let direct_twist = Perm::from_images(images);

            let mut e_twist = Perm::IDENTITY;
            let mut f_twist = Perm::IDENTITY;
            let e_rep = self.find_triangle_class_twist(e + 10 * facet.simp, &mut e_twist);
            let f_rep = self.find_triangle_class_twist(f + 10 * adj.simp, &mut f_twist);

            if e_rep == f_rep {
                self.triangle[e_rep].bounded = false;
                if e_twist != f_twist * direct_twist {
                    invalid = true;
                }
                self.triangle_changed[order_idx] = -1;
            } else {
                if self.triangle[e_rep].rank < self.triangle[f_rep].rank {
                    self.triangle[e_rep].parent = f_rep as i32;
                    self.triangle[e_rep].twist_up = f_twist * direct_twist * e_twist.inverse();
                    self.triangle[f_rep].size += self.triangle[e_rep].size;
                    self.triangle_changed[order_idx] = e_rep as i32;
                } else {
                    self.triangle[f_rep].parent = e_rep as i32;
                    self.triangle[f_rep].twist_up =
                        e_twist * direct_twist.inverse() * f_twist.inverse();
                    if self.triangle[e_rep].rank == self.triangle[f_rep].rank {
                        self.triangle[e_rep].rank += 1;
                        self.triangle[f_rep].had_equal_rank = true;
                    }
                    self.triangle[e_rep].size += self.triangle[f_rep].size;
                    self.triangle_changed[order_idx] = f_rep as i32;
                }
                self.n_triangle_classes -= 1;
            }
        }

        invalid
    }

    fn split_triangle_classes(&mut self, ctx: &MergeCtx4<'_>) {
        let facet = ctx.face();
        let v1 = facet.facet;

        for v2 in (0..5).rev() {
            if v2 == v1 {
                continue;
            }
            let f = PENT_EDGE_NUMBER[v1][v2] as usize;
            let f_idx = f + 10 * facet.simp;
            let order_idx = v2 + 5 * ctx.order_elt;

            if self.triangle_changed[order_idx] < 0 {
                let rep = self.find_triangle_class(f_idx);
                self.triangle[rep].bounded = true;
            } else {
                let sub = self.triangle_changed[order_idx] as usize;
                let root = self.triangle[sub].parent as usize;

                self.triangle[sub].parent = -1;
                if self.triangle[sub].had_equal_rank {
                    self.triangle[sub].had_equal_rank = false;
                    self.triangle[root].rank -= 1;
                }
                self.triangle[root].size -= self.triangle[sub].size;

                self.triangle_changed[order_idx] = -1;
                self.n_triangle_classes += 1;
            }
        }
    }

    // ---------- edge-link boundary ring ----------

    fn edge_bdry_join(&mut self, edge_id: u32, end: usize, adj_id: u32, twist: u8) {
        self.edge[edge_id as usize].bdry_next[end] = adj_id;
        self.edge[edge_id as usize].bdry_twist[end] = twist;
        let back = (end ^ 1) ^ twist as usize;
        self.edge[adj_id as usize].bdry_next[back] = edge_id;
        self.edge[adj_id as usize].bdry_twist[back] = twist;
    }

    fn edge_bdry_fix_adj(&mut self, edge_id: u32) {
        let e = edge_id as usize;
        if self.edge[e].bdry_next[0] == edge_id {
            return;
        }
        let [next0, next1] = self.edge[e].bdry_next;
        let [twist0, twist1] = self.edge[e].bdry_twist;
        self.edge[next0 as usize].bdry_next[1 ^ twist0 as usize] = edge_id;
        self.edge[next0 as usize].bdry_twist[1 ^ twist0 as usize] = twist0;
        self.edge[next1 as usize].bdry_next[twist1 as usize] = edge_id;
        self.edge[next1 as usize].bdry_twist[twist1 as usize] = twist1;
    }

    fn edge_bdry_backup(&mut self, edge_id: u32) {
        let e = edge_id as usize;
        self.edge[e].bdry_next_old = [
            self.edge[e].bdry_next[0] as i32,
            self.edge[e].bdry_next[1] as i32,
        ];
        self.edge[e].bdry_twist_old = self.edge[e].bdry_twist;
    }

    fn edge_bdry_restore(&mut self, edge_id: u32) {
        let e = edge_id as usize;
        self.edge[e].bdry_next = [
            self.edge[e].bdry_next_old[0] as u32,
            self.edge[e].bdry_next_old[1] as u32,
        ];
        self.edge[e].bdry_twist = self.edge[e].bdry_twist_old;
    }

    fn edge_bdry_next(
        &self,
        ctx: &MergeCtx4<'_>,
        edge_id: u32,
        pent: usize,
        edge: usize,
        bdry_facet: usize,
    ) -> ([u32; 2], [u8; 2]) {
        let state = &self.edge[edge_id as usize];
        match state.bdry_edges {
            3 => ([edge_id, edge_id], [0, 0]),
            2 => {
                let next_facet = EDGE_LINK_NEXT_FACET[edge][bdry_facet] as usize;
                let prev_facet = EDGE_LINK_PREV_FACET[edge][bdry_facet] as usize;
                if ctx.perms.perm_index(FacetSpec::new(pent, next_facet)) < 0 {
                    ([state.bdry_next[0], edge_id], [state.bdry_twist[0], 0])
                } else if ctx.perms.perm_index(FacetSpec::new(pent, prev_facet)) < 0 {
                    ([edge_id, state.bdry_next[1]], [0, state.bdry_twist[1]])
                } else {
                    // Self-gluing in progress: the boundary edge not yet
                    // visible must lie in the facet being glued or its
                    // partner.
                    let order_facet = ctx.face();
                    let ghost_facet = if bdry_facet == order_facet.facet {
                        ctx.adj().facet
                    } else {
                        order_facet.facet
                    };
                    if next_facet == ghost_facet {
                        ([state.bdry_next[0], edge_id], [state.bdry_twist[0], 0])
                    } else {
                        if prev_facet != ghost_facet {
                            error!(edge_id, "inconsistent edge link boundary information");
                        }
                        ([edge_id, state.bdry_next[1]], [0, state.bdry_twist[1]])
                    }
                }
            }
            1 => (state.bdry_next, state.bdry_twist),
            _ => {
                error!(edge_id, "boundary query on an internal link triangle");
                ([edge_id, edge_id], [0, 0])
            }
        }
    }

    fn edge_bdry_length1(&self, edge_id: u32) -> bool {
        let e = edge_id as usize;
        self.edge[e].bdry_next[0] == edge_id && self.edge[e].bdry_edges == 1
    }

    fn edge_bdry_length2(&self, e1: u32, e2: u32) -> bool {
        let e = e1 as usize;
        self.edge[e].bdry_next[0] == e2
            && self.edge[e].bdry_next[1] == e2
            && self.edge[e].bdry_edges == 1
            && self.edge[e2 as usize].bdry_edges == 1
    }

    // ---------- edge-class merge / split ----------

    fn find_edge_class(&self, mut id: usize) -> usize {
        while self.edge[id].parent >= 0 {
            id = self.edge[id].parent as usize;
        }
        id
    }

    fn find_edge_class_twists(&self, mut id: usize, link: &mut u8, dir: &mut u8) -> usize {
        while self.edge[id].parent >= 0 {
            *link ^= self.edge[id].twist_up;
            *dir ^= self.edge[id].twist_up_edge;
            id = self.edge[id].parent as usize;
        }
        id
    }

    /// Merges the six edge pairs of the current gluing, maintaining link
    /// boundaries.  Returns ELINK_ flags.
    fn merge_edge_classes(&mut self, ctx: &MergeCtx4<'_>) -> u8 {
        let facet = ctx.face();
        let adj = ctx.adj();
        let p = ctx.perms.gluing(facet);
        let mut verdict = 0;

        let v1 = facet.facet;
        let w1 = p.image(v1);

        for e in 0..10 {
            let [x, y] = PENT_EDGE_VERTEX[e];
            if x == v1 || y == v1 {
                continue;
            }
            let (px, py) = (p.image(x), p.image(y));
            let f = PENT_EDGE_NUMBER[px][py] as usize;
            let e_idx = (e + 10 * facet.simp) as u32;
            let f_idx = (f + 10 * adj.simp) as u32;
            let order_idx = e + 10 * ctx.order_elt;

            // The edge itself reverses exactly when the gluing swaps the
            // order of its endpoints.
            let dir_twist: u8 = u8::from(px > py);

            // The glued link-triangle sides run from the `next` corner to
            // the `prev` corner; the join is untwisted exactly when the
            // gluing reverses that direction.
            let a1 = EDGE_LINK_NEXT_FACET[e][v1] as usize;
            let b2 = EDGE_LINK_PREV_FACET[f][w1] as usize;
            let has_twist: u8 = u8::from(p.image(a1) != b2);

            let mut link_parent_twists = 0;
            let mut dir_parent_twists = 0;
            let e_rep = self.find_edge_class_twists(
                e_idx as usize,
                &mut link_parent_twists,
                &mut dir_parent_twists,
            );
            let f_rep = self.find_edge_class_twists(
                f_idx as usize,
                &mut link_parent_twists,
                &mut dir_parent_twists,
            );

            if e_rep == f_rep {
                if dir_twist ^ dir_parent_twists != 0 {
                    verdict |= ELINK_REVERSED;
                }

                self.edge[e_rep].bdry -= 2;

                if e_idx == f_idx {
                    if has_twist != 0 {
                        self.edge_changed[order_idx] = VertexJoin::Twist;
                        self.edge[e_rep].euler -= 1;
                    } else {
                        self.edge_changed[order_idx] = VertexJoin::Bridge;
                    }

                    if self.edge[e_idx as usize].bdry_edges < 3 {
                        if self.edge[e_idx as usize].bdry_next[0] != e_idx {
                            let [n0, n1] = self.edge[e_idx as usize].bdry_next;
                            let [t0, t1] = self.edge[e_idx as usize].bdry_twist;
                            self.edge_bdry_join(n0, 1 ^ t0 as usize, n1, t1 ^ t0);
                        }
                    }
                    self.edge[e_idx as usize].bdry_edges -= 2;
                } else {
                    if self.edge[e_idx as usize].bdry_edges == 2 {
                        self.edge_bdry_backup(e_idx);
                    }
                    if self.edge[f_idx as usize].bdry_edges == 2 {
                        self.edge_bdry_backup(f_idx);
                    }

                    if self.edge_bdry_length1(e_idx) {
                        self.edge_changed[order_idx] = VertexJoin::Handle;
                        self.edge[e_rep].euler -= 2;
                        if !self.edge_bdry_length1(f_idx)
                            && self.edge[f_idx as usize].bdry_edges == 1
                        {
                            let [n0, n1] = self.edge[f_idx as usize].bdry_next;
                            let [t0, t1] = self.edge[f_idx as usize].bdry_twist;
                            self.edge_bdry_join(n0, 1 ^ t0 as usize, n1, t0 ^ t1);
                        }
                    } else if self.edge_bdry_length1(f_idx) {
                        self.edge_changed[order_idx] = VertexJoin::Handle;
                        self.edge[e_rep].euler -= 2;
                        if self.edge[e_idx as usize].bdry_edges == 1 {
                            let [n0, n1] = self.edge[e_idx as usize].bdry_next;
                            let [t0, t1] = self.edge[e_idx as usize].bdry_twist;
                            self.edge_bdry_join(n0, 1 ^ t0 as usize, n1, t0 ^ t1);
                        }
                    } else if self.edge_bdry_length2(e_idx, f_idx) {
                        if has_twist ^ self.edge[e_idx as usize].bdry_twist[0] != 0 {
                            self.edge_changed[order_idx] = VertexJoin::Twist;
                            self.edge[e_rep].euler -= 1;
                        } else {
                            self.edge_changed[order_idx] = VertexJoin::Bridge;
                        }
                    } else {
                        let (e_next, e_twist) =
                            self.edge_bdry_next(ctx, e_idx, facet.simp, e, v1);
                        let (f_next, f_twist) = self.edge_bdry_next(ctx, f_idx, adj.simp, f, w1);

                        if e_next[0] == f_idx && f_next[1 ^ e_twist[0] as usize] == e_idx {
                            if has_twist ^ e_twist[0] != 0 {
                                self.edge_changed[order_idx] = VertexJoin::Twist;
                                self.edge[e_rep].euler -= 1;
                            } else {
                                self.edge_changed[order_idx] = VertexJoin::Bridge;
                            }
                            let side = e_twist[0] as usize;
                            self.edge_bdry_join(
                                e_next[1],
                                e_twist[1] as usize,
                                f_next[side],
                                (e_twist[0] ^ f_twist[side]) ^ e_twist[1],
                            );
                        } else if e_next[1] == f_idx && f_next[e_twist[1] as usize] == e_idx {
                            if has_twist ^ e_twist[1] != 0 {
                                self.edge_changed[order_idx] = VertexJoin::Twist;
                                self.edge[e_rep].euler -= 1;
                            } else {
                                self.edge_changed[order_idx] = VertexJoin::Bridge;
                            }
                            let side = 1 ^ e_twist[1] as usize;
                            self.edge_bdry_join(
                                e_next[0],
                                1 ^ e_twist[0] as usize,
                                f_next[side],
                                (e_twist[1] ^ f_twist[side]) ^ e_twist[0],
                            );
                        } else {
                            let mut tmp_idx = self.edge[e_idx as usize].bdry_next[0];
                            let mut tmp_twist = self.edge[e_idx as usize].bdry_twist[0];
                            while tmp_idx != e_idx && tmp_idx != f_idx {
                                let slot = tmp_twist as usize;
                                let next = self.edge[tmp_idx as usize].bdry_next[slot];
                                tmp_twist ^= self.edge[tmp_idx as usize].bdry_twist[slot];
                                tmp_idx = next;
                            }

                            if tmp_idx == e_idx {
                                self.edge_changed[order_idx] = VertexJoin::Handle;
                                self.edge[e_rep].euler -= 2;
                            } else if has_twist ^ tmp_twist != 0 {
                                self.edge_changed[order_idx] = VertexJoin::Twist;
                                self.edge[e_rep].euler -= 1;
                            } else {
                                self.edge_changed[order_idx] = VertexJoin::Bridge;
                            }

                            let side1 = 1 ^ has_twist as usize;
                            let side0 = has_twist as usize;
                            self.edge_bdry_join(
                                e_next[0],
                                1 ^ e_twist[0] as usize,
                                f_next[side1],
                                e_twist[0] ^ (has_twist ^ f_twist[side1]),
                            );
                            self.edge_bdry_join(
                                e_next[1],
                                e_twist[1] as usize,
                                f_next[side0],
                                e_twist[1] ^ (has_twist ^ f_twist[side0]),
                            );
                        }
                    }

                    self.edge[e_idx as usize].bdry_edges -= 1;
                    self.edge[f_idx as usize].bdry_edges -= 1;
                }

                if self.edge[e_rep].bdry == 0 {
                    verdict |= ELINK_CLOSED;
                    if self.edge[e_rep].euler != EDGE_LINK_EULER {
                        verdict |= ELINK_BAD_LINK;
                    }
                } else if self.edge[e_rep].euler < EDGE_LINK_EULER {
                    verdict |= ELINK_BAD_LINK;
                }
            } else {
                let (sub, root) = if self.edge[e_rep].rank < self.edge[f_rep].rank {
                    (e_rep, f_rep)
                } else {
                    (f_rep, e_rep)
                };
                self.edge[sub].parent = root as i32;
                self.edge[sub].twist_up = has_twist ^ link_parent_twists;
                self.edge[sub].twist_up_edge = dir_twist ^ dir_parent_twists;
                if sub == f_rep && self.edge[e_rep].rank == self.edge[f_rep].rank {
                    self.edge[root].rank += 1;
                    self.edge[sub].had_equal_rank = true;
                }

                self.edge[root].bdry = self.edge[root].bdry + self.edge[sub].bdry - 2;
                self.edge[root].euler = self.edge[root].euler + self.edge[sub].euler - 2;

                if self.edge[root].bdry == 0 {
                    verdict |= ELINK_CLOSED;
                    if self.edge[root].euler != EDGE_LINK_EULER {
                        verdict |= ELINK_BAD_LINK;
                    }
                } else if self.edge[root].euler < EDGE_LINK_EULER {
                    verdict |= ELINK_BAD_LINK;
                }

                self.edge_changed[order_idx] = VertexJoin::Graft(sub as u32);
                self.n_edge_classes -= 1;

                if self.edge[e_idx as usize].bdry_edges == 2 {
                    self.edge_bdry_backup(e_idx);
                }
                if self.edge[f_idx as usize].bdry_edges == 2 {
                    self.edge_bdry_backup(f_idx);
                }

                if self.edge_bdry_length1(e_idx) {
                    if !self.edge_bdry_length1(f_idx) && self.edge[f_idx as usize].bdry_edges == 1
                    {
                        let [n0, n1] = self.edge[f_idx as usize].bdry_next;
                        let [t0, t1] = self.edge[f_idx as usize].bdry_twist;
                        self.edge_bdry_join(n0, 1 ^ t0 as usize, n1, t0 ^ t1);
                    }
                } else if self.edge_bdry_length1(f_idx) {
                    if self.edge[e_idx as usize].bdry_edges == 1 {
                        let [n0, n1] = self.edge[e_idx as usize].bdry_next;
                        let [t0, t1] = self.edge[e_idx as usize].bdry_twist;
                        self.edge_bdry_join(n0, 1 ^ t0 as usize, n1, t0 ^ t1);
                    }
                } else {
                    let (e_next, e_twist) = self.edge_bdry_next(ctx, e_idx, facet.simp, e, v1);
                    let (f_next, f_twist) = self.edge_bdry_next(ctx, f_idx, adj.simp, f, w1);

                    let side1 = 1 ^ has_twist as usize;
                    let side0 = has_twist as usize;
                    self.edge_bdry_join(
                        e_next[0],
                        1 ^ e_twist[0] as usize,
                        f_next[side1],
                        e_twist[0] ^ (has_twist ^ f_twist[side1]),
                    );
                    self.edge_bdry_join(
                        e_next[1],
                        e_twist[1] as usize,
                        f_next[side0],
                        e_twist[1] ^ (has_twist ^ f_twist[side0]),
                    );
                }

                self.edge[e_idx as usize].bdry_edges -= 1;
                self.edge[f_idx as usize].bdry_edges -= 1;
            }
        }

        verdict
    }

    /// Exactly reverses [`Self::merge_edge_classes`] for the same step.
    fn split_edge_classes(&mut self, ctx: &MergeCtx4<'_>) {
        let facet = ctx.face();
        let adj = ctx.adj();
        let p = ctx.perms.gluing(facet);
        let v1 = facet.facet;

        for e in (0..10).rev() {
            let [x, y] = PENT_EDGE_VERTEX[e];
            if x == v1 || y == v1 {
                continue;
            }
            let f = PENT_EDGE_NUMBER[p.image(x)][p.image(y)] as usize;
            let e_idx = (e + 10 * facet.simp) as u32;
            let f_idx = (f + 10 * adj.simp) as u32;
            let order_idx = e + 10 * ctx.order_elt;

            match self.edge_changed[order_idx] {
                VertexJoin::Graft(sub) => {
                    let sub = sub as usize;
                    let root = self.edge[sub].parent as usize;

                    self.edge[sub].parent = -1;
                    if self.edge[sub].had_equal_rank {
                        self.edge[sub].had_equal_rank = false;
                        self.edge[root].rank -= 1;
                    }

                    self.edge[root].bdry = self.edge[root].bdry + 2 - self.edge[sub].bdry;
                    self.edge[root].euler = self.edge[root].euler + 2 - self.edge[sub].euler;

                    self.n_edge_classes += 1;
                }
                join => {
                    let rep = self.find_edge_class(e_idx as usize);
                    self.edge[rep].bdry += 2;
                    match join {
                        VertexJoin::Handle => self.edge[rep].euler += 2,
                        VertexJoin::Twist => self.edge[rep].euler += 1,
                        _ => {}
                    }
                }
            }
            self.edge_changed[order_idx] = VertexJoin::Init;

            if e_idx == f_idx {
                self.edge[e_idx as usize].bdry_edges += 2;
                if self.edge[e_idx as usize].bdry_edges == 2 {
                    self.edge_bdry_fix_adj(e_idx);
                }
            } else {
                for idx in [f_idx, e_idx] {
                    self.edge[idx as usize].bdry_edges += 1;
                    match self.edge[idx as usize].bdry_edges {
                        3 => {
                            self.edge[idx as usize].bdry_next = [idx, idx];
                            self.edge[idx as usize].bdry_twist = [0, 0];
                        }
                        2 => {
                            self.edge_bdry_restore(idx);
                            self.edge_bdry_fix_adj(idx);
                        }
                        _ => {
                            self.edge_bdry_fix_adj(idx);
                        }
                    }
                }
            }
        }
    }

    // ---------- diagnostics ----------

    #[cfg_attr(not(any(test, feature = "self-test")), allow(dead_code))]
    fn check_edge_boundary_rings(&self) {
        for id in 0..self.edge.len() {
            if self.edge[id].bdry_edges == 0 {
                continue;
            }
            for end in 0..2 {
                let adj = self.edge[id].bdry_next[end] as usize;
                let twist = self.edge[id].bdry_twist[end];
                if self.edge[adj].bdry_edges == 0 {
                    error!(id, end, "edge link boundary runs into an internal edge");
                }
                let back = (1 ^ end) ^ twist as usize;
                if self.edge[adj].bdry_next[back] as usize != id {
                    error!(id, end, "edge link boundary has a mismatched adjacency");
                }
                if self.edge[adj].bdry_twist[back] != twist {
                    error!(id, end, "edge link boundary has a mismatched twist");
                }
            }
        }
    }

    fn check_all_reset(&self, n_pents: usize) {
        if self.n_edge_classes != 10 * n_pents {
            warn!(count = self.n_edge_classes, "edge classes not restored at end of search");
        }
        for (id, state) in self.edge.iter().enumerate() {
            if state.parent != -1
                || state.rank != 0
                || state.bdry != 3
                || state.euler != 2
                || state.had_equal_rank
                || state.bdry_edges != 3
                || state.bdry_next != [id as u32, id as u32]
                || state.bdry_twist != [0, 0]
            {
                warn!(id, "edge state not restored at end of search");
            }
        }
        if self.n_triangle_classes != 10 * n_pents {
            warn!(
                count = self.n_triangle_classes,
                "triangle classes not restored at end of search"
            );
        }
        for (id, state) in self.triangle.iter().enumerate() {
            if state.parent != -1
                || state.rank != 0
                || state.size != 1
                || !state.bounded
                || state.had_equal_rank
            {
                warn!(id, "triangle state not restored at end of search");
            }
        }
    }

    // ---------- checkpoint plumbing ----------

    fn dump(&self, out: &mut String) {
        let _ = writeln!(out, "{}", self.n_edge_classes);
        for state in &self.edge {
            let _ = writeln!(
                out,
                "{} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
                state.parent,
                state.rank,
                state.bdry,
                state.euler,
                state.twist_up,
                state.twist_up_edge,
                u8::from(state.had_equal_rank),
                state.bdry_edges,
                state.bdry_next[0],
                state.bdry_next[1],
                state.bdry_twist[0],
                state.bdry_twist[1],
                state.bdry_next_old[0],
                state.bdry_next_old[1],
                state.bdry_twist_old[0],
                state.bdry_twist_old[1],
            );
        }
        for join in &self.edge_changed {
            let _ = write!(out, "{} ", join.encode());
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "{}", self.n_triangle_classes);
        for state in &self.triangle {
            let _ = writeln!(
                out,
                "{} {} {} {} {} {} {} {}",
                state.parent,
                state.rank,
                state.size,
                u8::from(state.bounded),
                state.twist_up.image(0),
                state.twist_up.image(1),
                state.twist_up.image(2),
                u8::from(state.had_equal_rank),
            );
        }
        for changed in &self.triangle_changed {
            let _ = write!(out, "{changed} ");
        }
        let _ = writeln!(out);
    }

    fn read(
        reader: &mut TokenReader<'_>,
        n_pents: usize,
        order_size: usize,
    ) -> Result<Self, PersistenceError> {
        let n_states = 10 * n_pents;

        let n_edge_classes = reader.next_usize("edge class count", n_states)?;
        let mut edge = Vec::with_capacity(n_states);
        for _ in 0..n_states {
            let parent = reader.next_in_range("edge parent", -1, n_states as i64 - 1)? as i32;
            let rank = reader.next_usize("edge rank", n_states)? as u32;
            let bdry = reader.next_usize("edge boundary count", 3 * n_states)? as u32;
            let euler = reader.next_in_range("edge euler", i64::MIN, 2)? as i32;
            let twist_up = reader.next_in_range("edge link twist", 0, 1)? as u8;
            let twist_up_edge = reader.next_in_range("edge direction twist", 0, 1)? as u8;
            let had_equal_rank = reader.next_bool("edge rank flag")?;
            let bdry_edges = reader.next_in_range("edge boundary edges", 0, 3)? as u8;
            let mut bdry_next = [0u32; 2];
            for slot in &mut bdry_next {
                *slot = reader.next_usize("edge ring", n_states - 1)? as u32;
            }
            let mut bdry_twist = [0u8; 2];
            for slot in &mut bdry_twist {
                *slot = reader.next_in_range("edge ring twist", 0, 1)? as u8;
            }
            let mut bdry_next_old = [0i32; 2];
            for slot in &mut bdry_next_old {
                *slot = reader.next_in_range("edge ring backup", -1, n_states as i64 - 1)? as i32;
            }
            let mut bdry_twist_old = [0u8; 2];
            for slot in &mut bdry_twist_old {
                *slot = reader.next_in_range("edge ring backup twist", 0, 1)? as u8;
            }
            edge.push(PentEdgeState {
                parent,
                rank,
                bdry,
                euler,
                twist_up,
                twist_up_edge,
                had_equal_rank,
                bdry_edges,
                bdry_next,
                bdry_twist,
                bdry_next_old,
                bdry_twist_old,
            });
        }

        let mut edge_changed = Vec::with_capacity(10 * order_size);
        for _ in 0..10 * order_size {
            let raw = reader.next_i64("edge journal")?;
            edge_changed.push(VertexJoin::decode(raw, n_states).ok_or(
                PersistenceError::OutOfRange {
                    field: "edge journal",
                    value: raw,
                },
            )?);
        }

        let n_triangle_classes = reader.next_usize("triangle class count", n_states)?;
        let mut triangle = Vec::with_capacity(n_states);
        for _ in 0..n_states {
            let parent = reader.next_in_range("triangle parent", -1, n_states as i64 - 1)? as i32;
            let rank = reader.next_usize("triangle rank", n_states)? as u32;
            let size = reader.next_usize("triangle class size", n_states)? as u32;
            let bounded = reader.next_bool("triangle bounded flag")?;
            let mut images = [0u8; 3];
            let mut seen = [false; 3];
            for slot in &mut images {
                let image = reader.next_usize("triangle twist", 2)?;
                if seen[image] {
                    return Err(PersistenceError::OutOfRange {
                        field: "triangle twist",
                        value: image as i64,
                    });
                }
                seen[image] = true;
                *slot = image as u8;
            }
            let twist_up = Perm::from_images(images);
            let had_equal_rank = reader.next_bool("triangle rank flag")?;
            triangle.push(PentTriangleState {
                parent,
                rank,
                size,
                bounded,
                twist_up,
                had_equal_rank,
            });
        }

        let mut triangle_changed = Vec::with_capacity(5 * order_size);
        for _ in 0..5 * order_size {
            triangle_changed
                .push(reader.next_in_range("triangle journal", -1, n_states as i64 - 1)? as i32);
        }

        Ok(LinkClasses4 {
            n_edge_classes,
            edge,
            edge_changed,
            n_triangle_classes,
            triangle,
            triangle_changed,
        })
    }
}

/// A gluing-permutation search over a pentachoron facet pairing.
///
/// Bad edges (reversed self-identifications, links that are not punctured
/// spheres) and bad triangles (non-trivial self-identifications) prune the
/// search through the union-find machinery; vertex links are not tracked,
/// so with `finite_only` some ideal triangulations may still be emitted and
/// must be filtered downstream.
#[derive(Clone, Debug)]
pub struct GluingPermSearcher4 {
    pub(crate) base: SearcherBase4,
    pub(crate) classes: LinkClasses4,
}

impl GluingPermSearcher4 {
    /// The tagged-data class marker for this searcher.
    pub const DATA_TAG: char = 'g';

    /// Creates a new search over the given pairing.
    ///
    /// Every element of `autos` must be an automorphism of `pairing`; the
    /// pairing must be connected and in canonical form.
    #[must_use]
    pub fn new(
        pairing: FacetPairing<4>,
        autos: Vec<Isomorphism<5>>,
        orientable_only: bool,
        finite_only: bool,
    ) -> Self {
        let options = SearchOptions {
            orientable_only,
            finite_only,
            purge: Default::default(),
        };
        let base = SearcherBase4::new(pairing, autos, options);
        let classes = LinkClasses4::new(base.perms.size(), base.order.len());
        GluingPermSearcher4 { base, classes }
    }

    /// The tableau under construction.
    #[must_use]
    pub fn perms(&self) -> &GluingPerms<4> {
        &self.base.perms
    }

    /// Rebuilds a searcher from the tagged checkpoint text produced by
    /// [`super::CensusSearch::tagged_data`].
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the text is truncated, malformed
    /// or fails validation.
    pub fn from_tagged_data(data: &str) -> Result<Self, PersistenceError> {
        let mut reader = TokenReader::new(data);
        let tag = reader
            .next_char("class tag")
            .map_err(|_| PersistenceError::MissingTag)?;
        if tag != Self::DATA_TAG {
            return Err(PersistenceError::UnknownTag { tag });
        }
        let base = SearcherBase4::read(&mut reader, 24)?;
        let classes = LinkClasses4::read(&mut reader, base.perms.size(), base.order.len())?;
        Ok(GluingPermSearcher4 { base, classes })
    }
}

impl EngineCore for GluingPermSearcher4 {
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
        let ctx = MergeCtx4 {
            perms: &self.base.perms,
            order: &self.base.order,
            order_elt: self.base.order_elt as usize,
        };

        if self.classes.merge_triangle_classes(&ctx) {
            self.classes.split_triangle_classes(&ctx);
            return false;
        }

        let verdict = self.classes.merge_edge_classes(&ctx);
        if verdict & (ELINK_BAD_LINK | ELINK_REVERSED) != 0 {
            self.classes.split_edge_classes(&ctx);
            self.classes.split_triangle_classes(&ctx);
            return false;
        }

        #[cfg(feature = "self-test")]
        self.classes.check_edge_boundary_rings();

        true
    }

    fn unstep(&mut self) {
        let ctx = MergeCtx4 {
            perms: &self.base.perms,
            order: &self.base.order,
            order_elt: self.base.order_elt as usize,
        };
        self.classes.split_edge_classes(&ctx);
        self.classes.split_triangle_classes(&ctx);
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

impl EngineParts for GluingPermSearcher4 {
    type Emitted = GluingPerms<4>;

    fn tableau(&self) -> &GluingPerms<4> {
        &self.base.perms
    }

    fn data_tag(&self) -> char {
        Self::DATA_TAG
    }

    fn dump_body(&self, out: &mut String) {
        self.base.dump(out);
        self.classes.dump(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::driver::CensusSearch;

    fn two_pent_closed() -> FacetPairing<4> {
        FacetPairing::from_pairs(
            2,
            &[
                ((0, 0), (1, 0)),
                ((0, 1), (1, 1)),
                ((0, 2), (1, 2)),
                ((0, 3), (1, 3)),
                ((0, 4), (1, 4)),
            ],
        )
        .unwrap()
    }

    /// Orientable finite emissions must leave every triangle class with a
    /// trivial accumulated twist on all of its members.
    #[test]
    fn emitted_triangle_classes_carry_identity_twists() {
        let mut searcher =
            GluingPermSearcher4::new(two_pent_closed(), Vec::new(), true, true);
        let mut emissions = 0;

        // Snapshot-based probing would lose the class state, so check it
        // from inside the search loop through a partial search at full
        // depth: complete states pass through the same emission path.
        let order_size = searcher.base.order.len();
        let mut states = Vec::new();
        searcher.partial_search(order_size, |snapshot| {
            if snapshot.is_complete() {
                states.push(snapshot.data().to_owned());
            }
        });

        for data in states {
            emissions += 1;
            let resumed = GluingPermSearcher4::from_tagged_data(&data).unwrap();
            for id in 0..resumed.classes.triangle.len() {
                let mut twist = Perm::IDENTITY;
                resumed.classes.find_triangle_class_twist(id, &mut twist);
                assert_eq!(twist, Perm::IDENTITY, "triangle {id} carries a twist");
            }
        }
        assert!(emissions > 0, "the two-pentachoron census is not empty");
    }

    /// The search machinery must restore every class structure exactly
    /// once the search tree has been exhausted.  The ring backup slots are
    /// scratch space outside the reversibility contract, so they are
    /// normalised away before comparing.
    #[test]
    fn search_restores_all_state() {
        fn normalised(classes: &LinkClasses4) -> LinkClasses4 {
            let mut copy = classes.clone();
            for state in &mut copy.edge {
                state.bdry_next_old = [-1, -1];
                state.bdry_twist_old = [0, 0];
            }
            copy
        }

        let mut searcher = GluingPermSearcher4::new(two_pent_closed(), Vec::new(), true, true);
        let pristine = normalised(&searcher.classes);
        searcher.run_search(|_| {});
        assert_eq!(normalised(&searcher.classes), pristine);
    }

    #[test]
    fn boundary_pairing_emits_and_respects_edges() {
        // One pentachoron with a single self-gluing; everything else
        // boundary.
        let pairing: FacetPairing<4> =
            FacetPairing::from_pairs(1, &[((0, 0), (0, 1))]).unwrap();
        let mut searcher = GluingPermSearcher4::new(pairing, Vec::new(), false, false);
        let mut count = 0;
        searcher.run_search(|perms| {
            assert!(perms.is_complete());
            count += 1;
        });
        assert!(count > 0);
    }
}
