//! Shared helpers for the census integration tests.
#![allow(dead_code)]

//!
//! The library deliberately contains no automorphism generator (that is an
//! external collaborator), so the tests carry a brute-force enumerator
//! that is perfectly adequate for pairings of up to three or four
//! simplices.

use simplex_census::prelude::*;

/// Every permutation of `0..n`, in no particular order.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for rest in permutations(n - 1) {
        for slot in 0..n {
            let mut perm = rest.clone();
            perm.insert(slot, n - 1);
            result.push(perm);
        }
    }
    result
}

/// Brute-force enumeration of the automorphism group of a tetrahedron
/// facet pairing.  Exponential in the number of tetrahedra; fine for the
/// tiny pairings used in tests.
pub fn find_automorphisms(pairing: &FacetPairing<3>) -> Vec<Isomorphism3> {
    let n = pairing.size();
    let mut autos = Vec::new();

    let mut facet_choices = vec![0usize; n];
    for simp_image in permutations(n) {
        facet_choices.iter_mut().for_each(|c| *c = 0);
        loop {
            let facet_perm: Vec<Perm<4>> = facet_choices
                .iter()
                .map(|&c| Perm::<4>::S4[c])
                .collect();
            let iso = Isomorphism::new(simp_image.clone(), facet_perm);
            if iso.is_automorphism(pairing) {
                autos.push(iso);
            }

            // Odometer over the n facet permutations.
            let mut pos = 0;
            loop {
                if pos == n {
                    break;
                }
                facet_choices[pos] += 1;
                if facet_choices[pos] < 24 {
                    break;
                }
                facet_choices[pos] = 0;
                pos += 1;
            }
            if pos == n {
                break;
            }
        }
    }
    autos
}

/// The closed pairing of two tetrahedra: every facet of one glued to the
/// matching facet of the other.
pub fn two_tet_closed() -> FacetPairing<3> {
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

/// One tetrahedron with two self-gluings: a closed pairing exercising the
/// self-gluing-in-progress branches of the link tracking.
pub fn one_tet_closed() -> FacetPairing<3> {
    FacetPairing::from_pairs(1, &[((0, 0), (0, 1)), ((0, 2), (0, 3))]).unwrap()
}

/// One tetrahedron with one self-gluing and two boundary facets.
pub fn one_tet_bounded() -> FacetPairing<3> {
    FacetPairing::from_pairs(1, &[((0, 0), (0, 1))]).unwrap()
}

/// A closed chain of three tetrahedra: self-gluings at both ends, double
/// edges in between.  The smallest input the closed-prime-minimal searcher
/// accepts.
pub fn three_tet_chain() -> FacetPairing<3> {
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

/// The raw tableau of a permutation set, usable as a map key.
pub fn tableau_key(perms: &GluingPerms<3>) -> Vec<i8> {
    FacetSpec::all(perms.size())
        .map(|spec| perms.perm_index(spec))
        .collect()
}

/// Collects the census of a searcher as a sorted, deduplicable key list.
pub fn collect_census(searcher: &mut GluingPermSearcher3) -> Vec<Vec<i8>> {
    let mut census = Vec::new();
    searcher.run_search(|perms| census.push(tableau_key(perms)));
    census
}
