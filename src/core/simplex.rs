//! Compile-time combinatorial tables for tetrahedra and pentachora.
//!
//! Everything here is a fixed consequence of simplex combinatorics; the
//! tables exist so that the search inner loops never recompute them.  The
//! unit tests rebuild each table from first principles.

/// Edge numbering of a tetrahedron: `TET_EDGE_NUMBER[i][j]` is the edge
/// joining vertices `i` and `j`, with edges ordered
/// 01, 02, 03, 12, 13, 23.  Diagonal entries are -1.
pub const TET_EDGE_NUMBER: [[i8; 4]; 4] = [
    [-1, 0, 1, 2],
    [0, -1, 3, 4],
    [1, 3, -1, 5],
    [2, 4, 5, -1],
];

/// The two vertices of each tetrahedron edge, in increasing order.
pub const TET_EDGE_VERTEX: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Ordering of the three faces surrounding a vertex of a tetrahedron.
///
/// For vertex `v`, the face following `f` in the orientation used by the
/// vertex-link twist bookkeeping is `VERTEX_LINK_NEXT_FACE[v][f]`; the
/// entries at `f == v` are -1.
pub const VERTEX_LINK_NEXT_FACE: [[i8; 4]; 4] = [
    [-1, 2, 3, 1],
    [3, -1, 0, 2],
    [1, 3, -1, 0],
    [1, 2, 0, -1],
];

/// Backwards links for [`VERTEX_LINK_NEXT_FACE`].
pub const VERTEX_LINK_PREV_FACE: [[i8; 4]; 4] = [
    [-1, 3, 1, 2],
    [2, -1, 3, 0],
    [3, 0, -1, 1],
    [2, 0, 1, -1],
];

/// For each tetrahedron edge, the two faces whose boundary it runs along,
/// with the direction of traversal (`true` = positive).
///
/// The choice of positive direction per face is arbitrary but fixed; the
/// trit masks that count boundary traversals depend only on consistency.
pub const TET_EDGE_FACE_DIRECTIONS: [[(usize, bool); 2]; 6] = [
    [(3, true), (2, true)],
    [(3, false), (1, true)],
    [(2, false), (1, false)],
    [(3, true), (0, true)],
    [(2, true), (0, false)],
    [(1, true), (0, true)],
];

/// The twelve ways in which two edges of a tetrahedron can be identified to
/// cone a face: for the `i`th method, edges `CONE_EDGE[i][0]` and
/// `CONE_EDGE[i][1]` are identified.
pub const CONE_EDGE: [[usize; 2]; 12] = [
    [0, 1],
    [0, 2],
    [1, 2],
    [0, 3],
    [0, 4],
    [3, 4],
    [1, 3],
    [1, 5],
    [3, 5],
    [2, 4],
    [2, 5],
    [4, 5],
];

/// Companion to [`CONE_EDGE`]: `1` if the `i`th identification follows the
/// natural low-to-high edge orientations, `0` if one edge must be reversed.
pub const CONE_NO_TWIST: [u8; 12] = [1, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 1];

/// Edge numbering of a pentachoron: `PENT_EDGE_NUMBER[i][j]` is the edge
/// joining vertices `i` and `j`, with edges ordered
/// 01, 02, 03, 04, 12, 13, 14, 23, 24, 34.  Diagonal entries are -1.
pub const PENT_EDGE_NUMBER: [[i8; 5]; 5] = [
    [-1, 0, 1, 2, 3],
    [0, -1, 4, 5, 6],
    [1, 4, -1, 7, 8],
    [2, 5, 7, -1, 9],
    [3, 6, 8, 9, -1],
];

/// The two vertices of each pentachoron edge, in increasing order.
pub const PENT_EDGE_VERTEX: [[usize; 2]; 10] = [
    [0, 1],
    [0, 2],
    [0, 3],
    [0, 4],
    [1, 2],
    [1, 3],
    [1, 4],
    [2, 3],
    [2, 4],
    [3, 4],
];

/// The three vertices of each pentachoron triangle, in increasing order.
///
/// Triangle `t` is spanned by the vertices *not* on edge `t`; the shared
/// numbering is what lets the merge routines pass between an edge and its
/// opposite triangle without a lookup.
pub const PENT_TRIANGLE_VERTEX: [[usize; 3]; 10] = [
    [2, 3, 4],
    [1, 3, 4],
    [1, 2, 4],
    [1, 2, 3],
    [0, 3, 4],
    [0, 2, 4],
    [0, 2, 3],
    [0, 1, 4],
    [0, 1, 3],
    [0, 1, 2],
];

/// Ring ordering of the three facets containing a pentachoron edge.
///
/// The link of edge `e` is a triangle whose sides correspond to the three
/// facets containing `e` (equivalently, the three vertices not on `e`).
/// `EDGE_LINK_NEXT_FACET[e][f]` is the facet following `f` in the ascending
/// cyclic order on those three facets; entries at the two endpoints of `e`
/// are -1.  [`EDGE_LINK_PREV_FACET`] provides the backwards links.
pub const EDGE_LINK_NEXT_FACET: [[i8; 5]; 10] = pent_edge_link_table(true);

/// Backwards links for [`EDGE_LINK_NEXT_FACET`].
pub const EDGE_LINK_PREV_FACET: [[i8; 5]; 10] = pent_edge_link_table(false);

const fn pent_edge_link_table(forward: bool) -> [[i8; 5]; 10] {
    let mut table = [[-1i8; 5]; 10];
    let mut e = 0;
    while e < 10 {
        // The three facets containing edge e, in increasing order.
        let mut comp = [0usize; 3];
        let mut len = 0;
        let mut v = 0;
        while v < 5 {
            if v != PENT_EDGE_VERTEX[e][0] && v != PENT_EDGE_VERTEX[e][1] {
                comp[len] = v;
                len += 1;
            }
            v += 1;
        }
        let mut i = 0;
        while i < 3 {
            let from = comp[i];
            let to = if forward { comp[(i + 1) % 3] } else { comp[(i + 2) % 3] };
            table[e][from] = to as i8;
            i += 1;
        }
        e += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tet_edge_numbering_is_consistent() {
        for (e, verts) in TET_EDGE_VERTEX.iter().enumerate() {
            assert_eq!(TET_EDGE_NUMBER[verts[0]][verts[1]], e as i8);
            assert_eq!(TET_EDGE_NUMBER[verts[1]][verts[0]], e as i8);
        }
        for v in 0..4 {
            assert_eq!(TET_EDGE_NUMBER[v][v], -1);
        }
    }

    #[test]
    fn vertex_link_tables_are_mutually_inverse_cycles() {
        for v in 0..4 {
            let faces: Vec<usize> = (0..4).filter(|f| *f != v).collect();
            // Each row is a single 3-cycle over the faces around v.
            let mut seen = vec![faces[0]];
            let mut f = faces[0];
            for _ in 0..2 {
                f = VERTEX_LINK_NEXT_FACE[v][f] as usize;
                assert!(!seen.contains(&f));
                seen.push(f);
            }
            assert_eq!(VERTEX_LINK_NEXT_FACE[v][f] as usize, faces[0]);
            for &f in &faces {
                let next = VERTEX_LINK_NEXT_FACE[v][f] as usize;
                assert_eq!(VERTEX_LINK_PREV_FACE[v][next] as usize, f);
            }
            assert_eq!(VERTEX_LINK_NEXT_FACE[v][v], -1);
            assert_eq!(VERTEX_LINK_PREV_FACE[v][v], -1);
        }
    }

    #[test]
    fn edge_face_directions_cover_the_incident_faces() {
        for (e, ring) in TET_EDGE_FACE_DIRECTIONS.iter().enumerate() {
            let [a, b] = TET_EDGE_VERTEX[e];
            for (face, _) in ring {
                // A face contains an edge exactly when it is opposite
                // neither endpoint.
                assert!(*face != a && *face != b);
            }
            assert_ne!(ring[0].0, ring[1].0);
        }
    }

    #[test]
    fn cone_edges_share_a_face_pairwise() {
        // Each listed pair must be two distinct edges of a common face.
        for pair in CONE_EDGE {
            let [e, f] = pair;
            assert_ne!(e, f);
            let faces = |edge: usize| -> Vec<usize> {
                TET_EDGE_FACE_DIRECTIONS[edge].iter().map(|(f, _)| *f).collect()
            };
            assert!(faces(e).iter().any(|x| faces(f).contains(x)));
        }
    }

    #[test]
    fn pent_edge_numbering_is_consistent() {
        for (e, verts) in PENT_EDGE_VERTEX.iter().enumerate() {
            assert_eq!(PENT_EDGE_NUMBER[verts[0]][verts[1]], e as i8);
            assert_eq!(PENT_EDGE_NUMBER[verts[1]][verts[0]], e as i8);
        }
    }

    #[test]
    fn pent_triangles_complement_their_edges() {
        for t in 0..10 {
            let mut all: Vec<usize> = PENT_TRIANGLE_VERTEX[t].to_vec();
            all.extend_from_slice(&PENT_EDGE_VERTEX[t]);
            all.sort_unstable();
            assert_eq!(all, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn edge_link_tables_are_mutually_inverse_cycles() {
        for e in 0..10 {
            let facets: Vec<usize> = (0..5)
                .filter(|v| *v != PENT_EDGE_VERTEX[e][0] && *v != PENT_EDGE_VERTEX[e][1])
                .collect();
            for &f in &facets {
                let next = EDGE_LINK_NEXT_FACET[e][f] as usize;
                assert!(facets.contains(&next));
                assert_ne!(next, f);
                assert_eq!(EDGE_LINK_PREV_FACET[e][next] as usize, f);
            }
            // The two endpoints of e are not facets of its link triangle.
            for v in PENT_EDGE_VERTEX[e] {
                assert_eq!(EDGE_LINK_NEXT_FACET[e][v], -1);
                assert_eq!(EDGE_LINK_PREV_FACET[e][v], -1);
            }
        }
    }
}
