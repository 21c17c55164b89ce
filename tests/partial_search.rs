//! Partial-search coverage: depth-bounded snapshots must partition the
//! search space exactly.

mod common;

use common::{collect_census, find_automorphisms, tableau_key, two_tet_closed};
use proptest::prelude::*;
use simplex_census::core::collections::FastHashSet;
use simplex_census::prelude::*;

fn compact_searcher(orientable: bool) -> GluingPermSearcher3 {
    let pairing = two_tet_closed();
    let autos = find_automorphisms(&pairing);
    GluingPermSearcher3::Compact(CompactSearcher3::new(
        pairing,
        autos,
        orientable,
        CensusPurge::NONE,
    ))
}

/// Runs a partial search at the given depth, resumes every snapshot to
/// completion, and returns the union of all emissions.
fn union_of_partial(searcher: &mut GluingPermSearcher3, depth: usize) -> Vec<Vec<i8>> {
    let mut snapshots = Vec::new();
    searcher.partial_search(depth, |snapshot| snapshots.push(snapshot.clone()));

    let mut union = Vec::new();
    for snapshot in snapshots {
        if snapshot.is_complete() {
            let parsed = GluingPermSearcher3::from_tagged_data(snapshot.data()).unwrap();
            union.push(tableau_key(parsed.perms()));
        } else {
            let mut resumed = GluingPermSearcher3::from_tagged_data(snapshot.data()).unwrap();
            assert!(!resumed.is_complete());
            resumed.run_search(|perms| union.push(tableau_key(perms)));
        }
    }
    union
}

#[test]
fn depth_zero_snapshot_resumes_to_the_full_census() {
    let full = collect_census(&mut compact_searcher(true));
    let union = union_of_partial(&mut compact_searcher(true), 0);

    let mut expected = full;
    let mut actual = union;
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);
}

#[test]
fn half_depth_snapshots_cover_without_overlap() {
    let full = collect_census(&mut compact_searcher(true));

    let mut searcher = compact_searcher(true);
    let depth = 2; // half of the four-step traversal
    let union = union_of_partial(&mut searcher, depth);

    // No emission may appear under two different snapshots.
    let distinct: FastHashSet<&Vec<i8>> = union.iter().collect();
    assert_eq!(distinct.len(), union.len(), "snapshots overlap");

    let mut expected = full;
    let mut actual = union;
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Every split depth yields the same census as the unsplit search.
    #[test]
    fn any_depth_partitions_the_search(depth in 0usize..=8, orientable in any::<bool>()) {
        let full = collect_census(&mut compact_searcher(orientable));
        let union = union_of_partial(&mut compact_searcher(orientable), depth);

        let distinct: FastHashSet<&Vec<i8>> = union.iter().collect();
        prop_assert_eq!(distinct.len(), union.len());

        let mut expected = full;
        let mut actual = union;
        expected.sort();
        actual.sort();
        prop_assert_eq!(expected, actual);
    }
}
