//! Searcher selection and tagged-checkpoint dispatch for dimension 3.

use super::closed_prime_min3::ClosedPrimeMinSearcher3;
use super::compact3::CompactSearcher3;
use super::driver::{CensusSearch, Snapshot};
use super::euler3::EulerSearcher3;
use super::hyperbolic3::HyperbolicMinSearcher3;
use super::options::{CensusPurge, SearchOptions};
use super::searcher3::GenericSearcher3;
use super::textio::{PersistenceError, TokenReader};
use crate::core::{FacetPairing, GluingPerms, Isomorphism};

/// A dimension-3 gluing-permutation searcher of any variant.
///
/// [`GluingPermSearcher3::best_searcher`] selects the fastest algorithm the
/// constraint flags allow; the variants can also be constructed directly
/// through their own types when a specific algorithm must be forced.
///
/// ```
/// use simplex_census::census::{CensusSearch, GluingPermSearcher3, SearchOptions};
/// use simplex_census::core::FacetPairing;
///
/// // One tetrahedron with two facets glued to each other.
/// let pairing = FacetPairing::from_pairs(1, &[((0, 0), (0, 1))]).unwrap();
/// let mut searcher = GluingPermSearcher3::best_searcher(
///     pairing,
///     Vec::new(),
///     SearchOptions { finite_only: true, ..Default::default() },
/// );
///
/// let mut found = 0;
/// searcher.run_search(|perms| {
///     assert!(perms.is_complete());
///     found += 1;
/// });
/// assert!(found > 0);
/// ```
#[derive(Clone, Debug)]
pub enum GluingPermSearcher3 {
    /// The default, fully general algorithm.
    Generic(GenericSearcher3),
    /// Compact triangulations only (sphere/disc vertex links).
    Compact(CompactSearcher3),
    /// Closed prime minimal P²-irreducible censuses.
    ClosedPrimeMin(ClosedPrimeMinSearcher3),
    /// A prescribed vertex-link Euler characteristic.
    Euler(EulerSearcher3),
    /// Minimal ideal triangulations of cusped hyperbolic manifolds.
    HyperbolicMin(HyperbolicMinSearcher3),
}

impl GluingPermSearcher3 {
    /// Creates a search manager of the best class for the given flags.
    ///
    /// Every element of `autos` must be an automorphism of `pairing`; the
    /// pairing must be connected and in canonical form.
    #[must_use]
    pub fn best_searcher(
        pairing: FacetPairing<3>,
        autos: Vec<Isomorphism<4>>,
        options: SearchOptions,
    ) -> Self {
        if options.finite_only {
            if pairing.is_closed()
                && pairing.size() >= 3
                && options.purge.has(CensusPurge::NON_MINIMAL)
                && options.purge.has(CensusPurge::NON_PRIME)
                && (options.orientable_only || options.purge.has(CensusPurge::P2_REDUCIBLE))
            {
                return GluingPermSearcher3::ClosedPrimeMin(ClosedPrimeMinSearcher3::new(
                    pairing,
                    autos,
                    options.orientable_only,
                ));
            }
            return GluingPermSearcher3::Compact(CompactSearcher3::new(
                pairing,
                autos,
                options.orientable_only,
                options.purge,
            ));
        }

        if pairing.is_closed() && options.purge.has(CensusPurge::NON_MINIMAL_HYP) {
            return GluingPermSearcher3::HyperbolicMin(HyperbolicMinSearcher3::new(
                pairing,
                autos,
                options.orientable_only,
            ));
        }

        GluingPermSearcher3::Generic(GenericSearcher3::new(pairing, autos, options))
    }

    /// Rebuilds a searcher of the correct variant from tagged checkpoint
    /// text.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the tag is missing or unknown, or
    /// if the remaining data is truncated, malformed or fails validation.
    pub fn from_tagged_data(data: &str) -> Result<Self, PersistenceError> {
        let mut reader = TokenReader::new(data);
        let tag = reader
            .next_char("class tag")
            .map_err(|_| PersistenceError::MissingTag)?;
        match tag {
            GenericSearcher3::DATA_TAG => {
                Ok(GluingPermSearcher3::Generic(GenericSearcher3::read_body(&mut reader)?))
            }
            CompactSearcher3::DATA_TAG => Ok(GluingPermSearcher3::Compact(
                CompactSearcher3::read_body(&mut reader)?,
            )),
            ClosedPrimeMinSearcher3::DATA_TAG => Ok(GluingPermSearcher3::ClosedPrimeMin(
                ClosedPrimeMinSearcher3::read_body(&mut reader)?,
            )),
            EulerSearcher3::DATA_TAG => {
                Ok(GluingPermSearcher3::Euler(EulerSearcher3::read_body(&mut reader)?))
            }
            HyperbolicMinSearcher3::DATA_TAG => Ok(GluingPermSearcher3::HyperbolicMin(
                HyperbolicMinSearcher3::read_body(&mut reader)?,
            )),
            tag => Err(PersistenceError::UnknownTag { tag }),
        }
    }

    /// The tableau under construction.
    #[must_use]
    pub fn perms(&self) -> &GluingPerms<3> {
        match self {
            GluingPermSearcher3::Generic(searcher) => searcher.perms(),
            GluingPermSearcher3::Compact(searcher) => searcher.perms(),
            GluingPermSearcher3::ClosedPrimeMin(searcher) => searcher.perms(),
            GluingPermSearcher3::Euler(searcher) => searcher.perms(),
            GluingPermSearcher3::HyperbolicMin(searcher) => searcher.perms(),
        }
    }
}

impl CensusSearch for GluingPermSearcher3 {
    type Tableau = GluingPerms<3>;

    fn run_search(&mut self, action: impl FnMut(&GluingPerms<3>)) {
        match self {
            GluingPermSearcher3::Generic(searcher) => searcher.run_search(action),
            GluingPermSearcher3::Compact(searcher) => searcher.run_search(action),
            GluingPermSearcher3::ClosedPrimeMin(searcher) => searcher.run_search(action),
            GluingPermSearcher3::Euler(searcher) => searcher.run_search(action),
            GluingPermSearcher3::HyperbolicMin(searcher) => searcher.run_search(action),
        }
    }

    fn partial_search(&mut self, max_depth: usize, action: impl FnMut(&Snapshot)) {
        match self {
            GluingPermSearcher3::Generic(searcher) => searcher.partial_search(max_depth, action),
            GluingPermSearcher3::Compact(searcher) => searcher.partial_search(max_depth, action),
            GluingPermSearcher3::ClosedPrimeMin(searcher) => {
                searcher.partial_search(max_depth, action)
            }
            GluingPermSearcher3::Euler(searcher) => searcher.partial_search(max_depth, action),
            GluingPermSearcher3::HyperbolicMin(searcher) => {
                searcher.partial_search(max_depth, action)
            }
        }
    }

    fn tagged_data(&self) -> String {
        match self {
            GluingPermSearcher3::Generic(searcher) => searcher.tagged_data(),
            GluingPermSearcher3::Compact(searcher) => searcher.tagged_data(),
            GluingPermSearcher3::ClosedPrimeMin(searcher) => searcher.tagged_data(),
            GluingPermSearcher3::Euler(searcher) => searcher.tagged_data(),
            GluingPermSearcher3::HyperbolicMin(searcher) => searcher.tagged_data(),
        }
    }

    fn is_complete(&self) -> bool {
        match self {
            GluingPermSearcher3::Generic(searcher) => searcher.is_complete(),
            GluingPermSearcher3::Compact(searcher) => searcher.is_complete(),
            GluingPermSearcher3::ClosedPrimeMin(searcher) => searcher.is_complete(),
            GluingPermSearcher3::Euler(searcher) => searcher.is_complete(),
            GluingPermSearcher3::HyperbolicMin(searcher) => searcher.is_complete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_two_tets() -> FacetPairing<3> {
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

    #[test]
    fn selection_follows_the_constraint_flags() {
        let all_purge =
            CensusPurge::NON_MINIMAL | CensusPurge::NON_PRIME | CensusPurge::P2_REDUCIBLE;

        // Closed, big enough, fully purged and finite: the specialised
        // closed census searcher.
        let pairing = FacetPairing::from_pairs(
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
        .unwrap();
        let selected = GluingPermSearcher3::best_searcher(
            pairing.clone(),
            Vec::new(),
            SearchOptions {
                orientable_only: true,
                finite_only: true,
                purge: all_purge,
            },
        );
        assert!(matches!(selected, GluingPermSearcher3::ClosedPrimeMin(_)));

        // Finite without the purges: compact.
        let selected = GluingPermSearcher3::best_searcher(
            closed_two_tets(),
            Vec::new(),
            SearchOptions {
                finite_only: true,
                ..Default::default()
            },
        );
        assert!(matches!(selected, GluingPermSearcher3::Compact(_)));

        // Closed, non-finite, hyperbolic purge: the hyperbolic searcher.
        let selected = GluingPermSearcher3::best_searcher(
            pairing,
            Vec::new(),
            SearchOptions {
                purge: CensusPurge::NON_MINIMAL_HYP,
                ..Default::default()
            },
        );
        assert!(matches!(selected, GluingPermSearcher3::HyperbolicMin(_)));

        // Anything else: generic.
        let selected = GluingPermSearcher3::best_searcher(
            closed_two_tets(),
            Vec::new(),
            SearchOptions::default(),
        );
        assert!(matches!(selected, GluingPermSearcher3::Generic(_)));
    }

    #[test]
    fn small_closed_pairings_fall_back_to_compact() {
        // Two tetrahedra cannot use the closed-prime-minimal algorithm.
        let selected = GluingPermSearcher3::best_searcher(
            closed_two_tets(),
            Vec::new(),
            SearchOptions {
                orientable_only: true,
                finite_only: true,
                purge: CensusPurge::NON_MINIMAL | CensusPurge::NON_PRIME,
            },
        );
        assert!(matches!(selected, GluingPermSearcher3::Compact(_)));
    }
}
