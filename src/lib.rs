//! # simplex-census
//!
//! Enumeration of the ways a fixed set of tetrahedra or pentachora can be
//! glued, facet to facet, into a triangulated manifold — up to
//! combinatorial equivalence.
//!
//! The input is a *facet pairing* (which facets are identified) together
//! with the automorphism group of that pairing; the output is the sequence
//! of all distinct *gluing permutation sets* (how each identified pair is
//! glued) satisfying a family of topological constraints, each produced
//! exactly once up to the given automorphisms.  This is the core of a
//! census of triangulations: pairing generation, automorphism generation
//! and the consumption of finished permutation sets all live with external
//! collaborators.
//!
//! # Features
//!
//! - Dimension-3 searches over tetrahedron facet pairings, with specialised
//!   algorithms for compact censuses, fixed vertex-link Euler
//!   characteristic, closed prime minimal P²-irreducible censuses, and
//!   minimal cusped hyperbolic censuses
//! - Dimension-4 searches over pentachoron facet pairings
//! - Partial (bounded-depth) searches whose snapshots partition the search
//!   space across workers and resume exactly
//! - Tagged plain-text checkpointing of every searcher variant
//!
//! # Basic usage
//!
//! ```rust
//! use simplex_census::prelude::*;
//!
//! // One tetrahedron with two of its facets glued together and the other
//! // two left on the boundary.
//! let pairing: FacetPairing<3> =
//!     FacetPairing::from_pairs(1, &[((0, 0), (0, 1))]).unwrap();
//!
//! // Enumerate all compact (finite) triangulations arising from this
//! // pairing.  The automorphism list is supplied by the caller; an empty
//! // list means no two emissions are considered equivalent.
//! let mut searcher = GluingPermSearcher3::best_searcher(
//!     pairing,
//!     Vec::new(),
//!     SearchOptions { finite_only: true, ..Default::default() },
//! );
//!
//! let mut census = Vec::new();
//! searcher.run_search(|perms| {
//!     // The borrow is transient; clone to keep the permutation set.
//!     census.push(perms.clone());
//! });
//!
//! // The standard one-tetrahedron ball and solid torus both appear here.
//! assert!(census.len() >= 2);
//! ```
//!
//! # Search invariants
//!
//! The searchers maintain, incrementally and reversibly, the equivalence
//! classes of lower-dimensional faces as candidate gluings are tried and
//! untried:
//!
//! - **Journal reversibility** — undoing a search step restores every
//!   union-find field bit-for-bit (the ring backup cursors are scratch
//!   space with a documented save/restore discipline).
//! - **Canonical uniqueness** — each complete permutation set is emitted
//!   exactly once per orbit under the supplied automorphism list.
//! - **Partial-search coverage** — the snapshots of a depth-bounded search,
//!   each resumed to completion, together emit exactly the results of the
//!   unsplit search, with no overlap.
//! - **Verdict soundness** — a pruned subtree contains no permutation set
//!   satisfying the search constraints.
//!
//! # Concurrency
//!
//! A searcher is a single-threaded CPU loop with no allocation after
//! construction.  Independent searchers share nothing and may run on
//! separate threads; the intended unit of work distribution is the partial
//! search snapshot.

#![forbid(unsafe_code)]

/// Permutations on up to five elements and their gluing index tables.
pub mod perm {
    pub mod face_pair;
    pub mod permutation;
    pub use face_pair::*;
    pub use permutation::*;
}

/// The input-side data model: facet pairings, pairing isomorphisms, the
/// gluing-permutation tableau, and the small combinatorial utilities the
/// searchers are built from.
pub mod core {
    /// Collection aliases tuned for the census workloads.
    pub mod collections;
    pub mod facet_pairing;
    pub mod facet_spec;
    pub mod gluing_perms;
    pub mod isomorphism;
    /// Base-4 bitmasks for the face-boundary traversal counts.
    pub mod qitmask;
    /// Compile-time simplex combinatorics tables.
    pub mod simplex;
    pub use facet_pairing::*;
    pub use facet_spec::*;
    pub use gluing_perms::*;
    pub use isomorphism::*;
    pub use qitmask::*;
}

/// The gluing-permutation searchers.
pub mod census {
    mod classes3;
    mod closed_prime_min3;
    mod compact3;
    mod driver;
    mod euler3;
    mod hyperbolic3;
    mod options;
    mod searcher3;
    mod searcher4;
    mod tagged;
    mod textio;
    pub use closed_prime_min3::ClosedPrimeMinSearcher3;
    pub use compact3::CompactSearcher3;
    pub use driver::{CensusSearch, Snapshot};
    pub use euler3::EulerSearcher3;
    pub use hyperbolic3::HyperbolicMinSearcher3;
    pub use options::{CensusPurge, SearchOptions};
    pub use searcher3::GenericSearcher3;
    pub use searcher4::GluingPermSearcher4;
    pub use tagged::GluingPermSearcher3;
    pub use textio::PersistenceError;
}

/// Re-exports of the commonly used types.
pub mod prelude {
    pub use crate::census::{
        CensusPurge, CensusSearch, ClosedPrimeMinSearcher3, CompactSearcher3, EulerSearcher3,
        GenericSearcher3, GluingPermSearcher3, GluingPermSearcher4, HyperbolicMinSearcher3,
        PersistenceError, SearchOptions, Snapshot,
    };
    pub use crate::core::{
        FacetPairing, FacetSpec, GluingPerms, Isomorphism, Isomorphism3, Isomorphism4, Qitmask,
    };
    pub use crate::perm::{FacePair, Perm};
}

/// Compile-time check that the crate's value types implement the `auto`
/// traits.  Only exercised by tests.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================
