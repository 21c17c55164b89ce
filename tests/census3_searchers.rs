//! Cross-validation of the dimension-3 searcher variants.
//!
//! The specialised searchers are faster prunings of the same enumeration,
//! so their censuses must nest predictably: anything the stricter variant
//! emits, the looser variant must emit too (on identical inputs), and
//! every census must be duplicate-free.

mod common;

use common::{
    collect_census, find_automorphisms, one_tet_bounded, one_tet_closed, three_tet_chain,
    two_tet_closed,
};
use simplex_census::core::collections::FastHashSet;
use simplex_census::prelude::*;

fn compact(pairing: FacetPairing<3>, autos: Vec<Isomorphism3>, orientable: bool) -> GluingPermSearcher3 {
    GluingPermSearcher3::Compact(CompactSearcher3::new(
        pairing,
        autos,
        orientable,
        CensusPurge::NONE,
    ))
}

fn generic(pairing: FacetPairing<3>, autos: Vec<Isomorphism3>, orientable: bool) -> GluingPermSearcher3 {
    GluingPermSearcher3::Generic(GenericSearcher3::new(
        pairing,
        autos,
        SearchOptions {
            orientable_only: orientable,
            finite_only: true,
            purge: CensusPurge::NONE,
        },
    ))
}

#[test]
fn empty_pairing_emits_the_empty_tableau_once() {
    let pairing: FacetPairing<3> = FacetPairing::from_pairs(0, &[]).unwrap();
    let mut searcher = compact(pairing, Vec::new(), false);
    let census = collect_census(&mut searcher);
    assert_eq!(census, vec![Vec::<i8>::new()]);
}

#[test]
fn all_boundary_pairing_emits_once() {
    let pairing: FacetPairing<3> = FacetPairing::from_pairs(1, &[]).unwrap();
    let mut searcher = compact(pairing, Vec::new(), false);
    let census = collect_census(&mut searcher);
    // Four undecided boundary facets, nothing to choose.
    assert_eq!(census, vec![vec![-1, -1, -1, -1]]);
}

#[test]
fn bounded_one_tet_census_contains_ball_and_solid_torus() {
    let pairing = one_tet_bounded();
    let autos = find_automorphisms(&pairing);
    let mut searcher = compact(pairing, autos, false);
    let census = collect_census(&mut searcher);

    // The one-tetrahedron ball and the one-tetrahedron solid torus both
    // survive compact pruning, and nothing is emitted twice.
    assert!(census.len() >= 2, "census too small: {census:?}");
    let distinct: FastHashSet<&Vec<i8>> = census.iter().collect();
    assert_eq!(distinct.len(), census.len());
}

#[test]
fn compact_census_is_a_subset_of_the_generic_census() {
    for pairing in [one_tet_closed(), two_tet_closed(), one_tet_bounded()] {
        for orientable in [false, true] {
            let autos = find_automorphisms(&pairing);

            let compact_census =
                collect_census(&mut compact(pairing.clone(), autos.clone(), orientable));
            let generic_census =
                collect_census(&mut generic(pairing.clone(), autos.clone(), orientable));

            let generic_set: FastHashSet<&Vec<i8>> = generic_census.iter().collect();
            for emitted in &compact_census {
                assert!(
                    generic_set.contains(emitted),
                    "compact emitted {emitted:?} but generic did not \
                     (pairing {pairing:?}, orientable {orientable})"
                );
            }
        }
    }
}

#[test]
fn closed_two_tet_orientable_census_is_nonempty_and_unique() {
    let pairing = two_tet_closed();
    let autos = find_automorphisms(&pairing);
    assert!(!autos.is_empty());

    let mut searcher = compact(pairing, autos, true);
    let census = collect_census(&mut searcher);

    // The two-tetrahedron closed orientable census (the three-sphere and
    // the lens space L(3,1) among them) is small but not empty.
    assert!(!census.is_empty());
    let distinct: FastHashSet<&Vec<i8>> = census.iter().collect();
    assert_eq!(distinct.len(), census.len());

    // Every emission is complete: no facet left undecided.
    for key in &census {
        assert!(key.iter().all(|&index| (0..6).contains(&index)));
    }
}

#[test]
fn euler_zero_and_compact_censuses_are_disjoint() {
    // On a closed pairing a vertex link cannot be both a sphere and a
    // torus; the two searchers must never agree on an emission.
    let pairing = two_tet_closed();
    let autos = find_automorphisms(&pairing);

    let mut cusped = GluingPermSearcher3::Euler(EulerSearcher3::new(
        0,
        pairing.clone(),
        autos.clone(),
        true,
        CensusPurge::NONE,
    ));
    let cusped_census = collect_census(&mut cusped);
    // The figure-eight knot complement lives here.
    assert!(!cusped_census.is_empty());

    let compact_census = collect_census(&mut compact(pairing, autos, true));
    let compact_set: FastHashSet<&Vec<i8>> = compact_census.iter().collect();
    for emitted in &cusped_census {
        assert!(!compact_set.contains(emitted));
    }
}

#[test]
fn hyperbolic_census_is_a_subset_of_the_euler_zero_census() {
    let pairing = two_tet_closed();
    let autos = find_automorphisms(&pairing);

    let mut hyperbolic = GluingPermSearcher3::HyperbolicMin(HyperbolicMinSearcher3::new(
        pairing.clone(),
        autos.clone(),
        true,
    ));
    let hyperbolic_census = collect_census(&mut hyperbolic);
    assert!(!hyperbolic_census.is_empty());

    let mut cusped = GluingPermSearcher3::Euler(EulerSearcher3::new(
        0,
        pairing,
        autos,
        true,
        CensusPurge::NONE,
    ));
    let cusped_census = collect_census(&mut cusped);
    let cusped_set: FastHashSet<&Vec<i8>> = cusped_census.iter().collect();
    for emitted in &hyperbolic_census {
        assert!(cusped_set.contains(emitted));
    }
}

#[test]
fn closed_prime_min_census_is_a_subset_of_the_compact_census() {
    let pairing = three_tet_chain();
    let autos = find_automorphisms(&pairing);

    let mut specialised = GluingPermSearcher3::ClosedPrimeMin(ClosedPrimeMinSearcher3::new(
        pairing.clone(),
        autos.clone(),
        true,
    ));
    let specialised_census = collect_census(&mut specialised);

    let compact_census = collect_census(&mut compact(pairing, autos, true));
    let compact_set: FastHashSet<&Vec<i8>> = compact_census.iter().collect();
    for emitted in &specialised_census {
        assert!(compact_set.contains(emitted));
    }
}

#[test]
fn emissions_are_canonical_under_the_automorphism_list() {
    // Spot-check uniqueness up to symmetry: no two emissions of the
    // two-tetrahedron compact census may be images of one another under a
    // pairing automorphism.
    let pairing = two_tet_closed();
    let autos = find_automorphisms(&pairing);

    let mut emitted: Vec<GluingPerms<3>> = Vec::new();
    let mut searcher = compact(pairing.clone(), autos.clone(), false);
    searcher.run_search(|perms| emitted.push(perms.clone()));

    for (i, a) in emitted.iter().enumerate() {
        for b in emitted.iter().skip(i + 1) {
            for iso in &autos {
                let mut image_matches = true;
                for face in FacetSpec::all(pairing.size()) {
                    let dest = pairing.dest_spec(face);
                    if pairing.is_unmatched(face) || dest < face {
                        continue;
                    }
                    let conjugated = iso.facet_perm(dest.simp).inverse()
                        * a.gluing(iso.image_of(face))
                        * iso.facet_perm(face.simp);
                    if b.gluing(face) != conjugated {
                        image_matches = false;
                        break;
                    }
                }
                assert!(
                    !image_matches,
                    "two emissions related by an automorphism: {a:?} and {b:?}"
                );
            }
        }
    }
}
