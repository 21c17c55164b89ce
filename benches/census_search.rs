//! Search throughput over the classic two-tetrahedron closed pairing.

use criterion::{criterion_group, criterion_main, Criterion};
use simplex_census::prelude::*;
use std::hint::black_box;

fn two_tet_closed() -> FacetPairing<3> {
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

fn bench_compact_census(c: &mut Criterion) {
    c.bench_function("compact census, two tetrahedra", |b| {
        b.iter(|| {
            let mut searcher = GluingPermSearcher3::Compact(CompactSearcher3::new(
                two_tet_closed(),
                Vec::new(),
                true,
                CensusPurge::NONE,
            ));
            let mut count = 0usize;
            searcher.run_search(|perms| {
                black_box(perms);
                count += 1;
            });
            black_box(count)
        });
    });
}

fn bench_cusped_census(c: &mut Criterion) {
    c.bench_function("torus-cusped census, two tetrahedra", |b| {
        b.iter(|| {
            let mut searcher = GluingPermSearcher3::Euler(EulerSearcher3::new(
                0,
                two_tet_closed(),
                Vec::new(),
                true,
                CensusPurge::NONE,
            ));
            let mut count = 0usize;
            searcher.run_search(|perms| {
                black_box(perms);
                count += 1;
            });
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_compact_census, bench_cusped_census);
criterion_main!(benches);
