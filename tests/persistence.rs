//! Tagged checkpoint round trips and failure modes.

mod common;

use common::{find_automorphisms, one_tet_bounded, three_tet_chain, two_tet_closed};
use simplex_census::prelude::*;

/// Builds one searcher of every dimension-3 variant over a suitable
/// pairing.
fn all_variants() -> Vec<GluingPermSearcher3> {
    let closed = two_tet_closed();
    let closed_autos = find_automorphisms(&closed);
    let bounded = one_tet_bounded();
    let bounded_autos = find_automorphisms(&bounded);
    let chain = three_tet_chain();
    let chain_autos = find_automorphisms(&chain);

    vec![
        GluingPermSearcher3::Generic(GenericSearcher3::new(
            bounded.clone(),
            bounded_autos.clone(),
            SearchOptions::default(),
        )),
        GluingPermSearcher3::Compact(CompactSearcher3::new(
            closed.clone(),
            closed_autos.clone(),
            false,
            CensusPurge::NONE,
        )),
        GluingPermSearcher3::ClosedPrimeMin(ClosedPrimeMinSearcher3::new(
            chain,
            chain_autos,
            true,
        )),
        GluingPermSearcher3::Euler(EulerSearcher3::new(
            0,
            closed.clone(),
            closed_autos.clone(),
            false,
            CensusPurge::NONE,
        )),
        GluingPermSearcher3::HyperbolicMin(HyperbolicMinSearcher3::new(
            closed,
            closed_autos,
            true,
        )),
    ]
}

#[test]
fn fresh_searchers_round_trip() {
    for searcher in all_variants() {
        let dumped = searcher.tagged_data();
        let parsed = GluingPermSearcher3::from_tagged_data(&dumped)
            .unwrap_or_else(|e| panic!("parse failed: {e} in\n{dumped}"));
        // Parsing is exact: re-dumping reproduces the text.
        assert_eq!(parsed.tagged_data(), dumped);
    }
}

#[test]
fn mid_search_snapshots_round_trip_and_resume_identically() {
    for mut searcher in all_variants() {
        let mut suffix_direct: Vec<Vec<i8>> = Vec::new();
        let mut suffix_resumed: Vec<Vec<i8>> = Vec::new();

        let mut snapshots = Vec::new();
        searcher.partial_search(2, |snapshot| snapshots.push(snapshot.clone()));

        for snapshot in &snapshots {
            let parsed = GluingPermSearcher3::from_tagged_data(snapshot.data()).unwrap();
            assert_eq!(parsed.tagged_data(), snapshot.data());
            assert_eq!(parsed.is_complete(), snapshot.is_complete());

            if !snapshot.is_complete() {
                // Two independent resumptions emit the same suffix.
                let mut first = GluingPermSearcher3::from_tagged_data(snapshot.data()).unwrap();
                first.run_search(|perms| suffix_direct.push(common::tableau_key(perms)));
                let mut second = parsed;
                second.run_search(|perms| suffix_resumed.push(common::tableau_key(perms)));
            }
        }
        assert_eq!(suffix_direct, suffix_resumed);
    }
}

#[test]
fn rejects_missing_and_unknown_tags() {
    assert!(matches!(
        GluingPermSearcher3::from_tagged_data(""),
        Err(PersistenceError::MissingTag)
    ));
    assert!(matches!(
        GluingPermSearcher3::from_tagged_data("z\n0"),
        Err(PersistenceError::UnknownTag { tag: 'z' })
    ));
}

#[test]
fn rejects_truncated_data() {
    let variants = all_variants();
    let dumped = variants[1].tagged_data();
    let truncated = &dumped[..dumped.len() / 2];
    assert!(GluingPermSearcher3::from_tagged_data(truncated).is_err());
}

#[test]
fn rejects_corrupt_fields() {
    // The first negative token is an undecided permutation index; pushing
    // it far out of range must fail validation.
    let variants = all_variants();
    let dumped = variants[1].tagged_data();
    let corrupt = dumped.replacen("-1", "97", 1);
    assert!(GluingPermSearcher3::from_tagged_data(&corrupt).is_err());
}

#[test]
fn dim4_round_trips() {
    let pairing: FacetPairing<4> = FacetPairing::from_pairs(
        2,
        &[
            ((0, 0), (1, 0)),
            ((0, 1), (1, 1)),
            ((0, 2), (1, 2)),
            ((0, 3), (1, 3)),
            ((0, 4), (1, 4)),
        ],
    )
    .unwrap();
    let searcher = GluingPermSearcher4::new(pairing, Vec::new(), true, true);
    let dumped = searcher.tagged_data();
    let parsed = GluingPermSearcher4::from_tagged_data(&dumped).unwrap();
    assert_eq!(parsed.tagged_data(), dumped);
}
