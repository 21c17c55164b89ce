//! Dimension-4 searcher behaviour over small pentachoron pairings.

use simplex_census::core::collections::FastHashSet;
use simplex_census::prelude::*;

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

fn tableau_key(perms: &GluingPerms<4>) -> Vec<i8> {
    FacetSpec::all(perms.size())
        .map(|spec| perms.perm_index(spec))
        .collect()
}

#[test]
fn closed_two_pent_census_is_nonempty_and_unique() {
    let mut searcher = GluingPermSearcher4::new(two_pent_closed(), Vec::new(), true, true);
    let mut census = Vec::new();
    searcher.run_search(|perms| {
        assert!(perms.is_complete());
        census.push(tableau_key(perms));
    });

    assert!(!census.is_empty());
    let distinct: FastHashSet<&Vec<i8>> = census.iter().collect();
    assert_eq!(distinct.len(), census.len());
}

#[test]
fn partial_search_partitions_the_dim4_census() {
    let mut full_searcher = GluingPermSearcher4::new(two_pent_closed(), Vec::new(), true, true);
    let mut full = Vec::new();
    full_searcher.run_search(|perms| full.push(tableau_key(perms)));

    let mut searcher = GluingPermSearcher4::new(two_pent_closed(), Vec::new(), true, true);
    let mut snapshots = Vec::new();
    searcher.partial_search(2, |snapshot| snapshots.push(snapshot.clone()));

    let mut union = Vec::new();
    for snapshot in snapshots {
        if snapshot.is_complete() {
            let parsed = GluingPermSearcher4::from_tagged_data(snapshot.data()).unwrap();
            union.push(tableau_key(parsed.perms()));
        } else {
            let mut resumed = GluingPermSearcher4::from_tagged_data(snapshot.data()).unwrap();
            resumed.run_search(|perms| union.push(tableau_key(perms)));
        }
    }

    let distinct: FastHashSet<&Vec<i8>> = union.iter().collect();
    assert_eq!(distinct.len(), union.len(), "snapshots overlap");

    full.sort();
    union.sort();
    assert_eq!(full, union);
}

#[test]
fn orientable_census_is_a_subset_of_the_general_census() {
    let mut orientable = GluingPermSearcher4::new(two_pent_closed(), Vec::new(), true, true);
    let mut orientable_census = Vec::new();
    orientable.run_search(|perms| orientable_census.push(tableau_key(perms)));

    let mut general = GluingPermSearcher4::new(two_pent_closed(), Vec::new(), false, true);
    let mut general_census = Vec::new();
    general.run_search(|perms| general_census.push(tableau_key(perms)));

    let general_set: FastHashSet<&Vec<i8>> = general_census.iter().collect();
    for emitted in &orientable_census {
        assert!(general_set.contains(emitted));
    }
}
