//! The search driver shared by every gluing-permutation searcher.
//!
//! A searcher is a state machine over `order_elt`, its position in the
//! traversal order of the facet pairing graph.  The driver owns the
//! advance / retreat / emit skeleton; each searcher variant supplies the
//! permutation advancement and the merge rules through [`EngineCore`]
//! (the step / undo-step interface), so the backtracking bookkeeping is
//! written exactly once.

use super::options::{CensusPurge, SearchOptions};
use super::textio::{PersistenceError, TokenReader};
use crate::core::{FacetPairing, FacetSpec, GluingPerms};
use crate::core::gluing_perms::UNDECIDED;
use crate::perm::Perm;
use std::fmt::Write as _;

/// The variant-specific hooks driven by [`drive`].
///
/// `step` applies the merges and prunings for the gluing just selected at
/// `order_elt` and reports whether the search may descend; a failed step
/// must leave every structure exactly as it found it.  `unstep` reverses a
/// previously successful step at the current `order_elt`.
pub trait EngineCore {
    fn started(&self) -> bool;
    /// Marks the search as started and seeds the first orientation.
    fn start(&mut self);
    /// A cheap rejection test applied once, before the first advance.
    fn pre_search_reject(&self) -> bool {
        false
    }
    fn order_size(&self) -> usize;
    fn order_elt(&self) -> isize;
    fn bump_order_elt(&mut self, delta: isize);
    /// Moves to the next candidate permutation at `order_elt`, writing the
    /// partner's inverse index as well.  Returns `false` when the
    /// candidates are exhausted.
    fn advance_perm(&mut self) -> bool;
    /// Resets both permutation indices of the pair at `order_elt`.
    fn clear_current_pair(&mut self);
    fn step(&mut self) -> bool;
    fn unstep(&mut self);
    /// Propagates simplex orientation after a successful step.
    fn assign_orientation(&mut self);
    /// Seeds the permutation index at a freshly reached `order_elt` so that
    /// orientation-preserving stepping starts on the right parity.
    fn seed_orientation(&mut self);
    /// Clears the seeded index at `order_elt` (partial-emission retreat).
    fn clear_seed(&mut self);
    fn is_canonical(&self) -> bool;
    /// End-of-search state verification (diagnostics only).
    fn end_of_search_check(&self) {}
}

/// Runs a search to completion or to `max_depth` levels beyond the current
/// position.  `emit` receives the engine and a completeness flag.
pub(crate) fn drive<E: EngineCore>(
    engine: &mut E,
    max_depth: Option<usize>,
    emit: &mut dyn FnMut(&E, bool),
) {
    if !engine.started() {
        engine.start();
        if engine.pre_search_reject() {
            return;
        }
    }
    if engine.order_size() == 0 || max_depth == Some(0) {
        // Nothing to choose, or an explicit request for the current state.
        emit(engine, engine.order_elt() as usize == engine.order_size());
        return;
    }
    if engine.order_elt() as usize == engine.order_size() {
        // A resumed search that was already complete.
        if engine.is_canonical() {
            emit(engine, true);
        }
        return;
    }

    let min_order = engine.order_elt();
    let max_order = max_depth.map(|depth| min_order + depth as isize);

    while engine.order_elt() >= min_order {
        if !engine.advance_perm() {
            // Out of candidates here; retreat one level.
            engine.clear_current_pair();
            engine.bump_order_elt(-1);
            if engine.order_elt() >= min_order {
                engine.unstep();
            }
            continue;
        }

        if !engine.step() {
            continue;
        }

        engine.assign_orientation();
        engine.bump_order_elt(1);

        if engine.order_elt() as usize == engine.order_size() {
            // A complete gluing permutation set.
            if engine.is_canonical() {
                emit(engine, true);
            }
            engine.bump_order_elt(-1);
            if engine.order_elt() >= min_order {
                engine.unstep();
            }
        } else {
            engine.seed_orientation();
            if Some(engine.order_elt()) == max_order {
                // Deep enough; hand out the partial state and step back.
                emit(engine, false);
                engine.clear_seed();
                engine.bump_order_elt(-1);
                if engine.order_elt() >= min_order {
                    engine.unstep();
                }
            }
        }
    }

    if min_order == 0 {
        engine.end_of_search_check();
    }
}

/// The variant-specific pieces needed to expose a searcher publicly: its
/// emitted tableau type and its tagged checkpoint dump.
pub trait EngineParts: EngineCore {
    type Emitted;

    fn tableau(&self) -> &Self::Emitted;
    fn data_tag(&self) -> char;
    fn dump_body(&self, out: &mut String);
}

/// A checkpoint emitted by a partial search: the searcher's complete tagged
/// state, resumable via the matching `from_tagged_data`.
///
/// Snapshots taken at a fixed depth partition the remaining search space:
/// resuming each of them (in any order) yields exactly the emissions of the
/// unsplit search, with no overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub(crate) complete: bool,
    pub(crate) data: String,
}

impl Snapshot {
    /// Whether this snapshot holds a complete gluing permutation set
    /// rather than a partially decided search state.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The tagged checkpoint text.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Consumes the snapshot, returning the tagged checkpoint text.
    #[must_use]
    pub fn into_data(self) -> String {
        self.data
    }
}

/// The common running interface of every gluing-permutation searcher.
pub trait CensusSearch {
    /// The tableau type handed to search actions.
    type Tableau;

    /// Runs the full search, invoking `action` once for each complete
    /// gluing permutation set, up to the automorphism list.
    ///
    /// The action borrows the tableau; clone it to keep it.
    fn run_search(&mut self, action: impl FnMut(&Self::Tableau));

    /// Branches only `max_depth` levels beyond the current position,
    /// emitting resumable [`Snapshot`]s instead of descending further.
    /// A depth of zero emits the current state once.
    fn partial_search(&mut self, max_depth: usize, action: impl FnMut(&Snapshot));

    /// The tagged plain-text checkpoint of the current state.
    ///
    /// The format is fragile between releases: a checkpoint, not an
    /// archive.
    fn tagged_data(&self) -> String;

    /// Whether this searcher currently holds a complete gluing permutation
    /// set (as opposed to a partial search state).
    fn is_complete(&self) -> bool;
}

impl<T: EngineParts> CensusSearch for T {
    type Tableau = <T as EngineParts>::Emitted;

    fn run_search(&mut self, mut action: impl FnMut(&Self::Tableau)) {
        drive(self, None, &mut |engine, complete| {
            debug_assert!(complete);
            action(engine.tableau());
        });
    }

    fn partial_search(&mut self, max_depth: usize, mut action: impl FnMut(&Snapshot)) {
        drive(self, Some(max_depth), &mut |engine, complete| {
            let snapshot = Snapshot {
                complete,
                data: engine.tagged_data(),
            };
            action(&snapshot);
        });
    }

    fn tagged_data(&self) -> String {
        let mut out = String::new();
        out.push(self.data_tag());
        out.push('\n');
        self.dump_body(&mut out);
        out
    }

    fn is_complete(&self) -> bool {
        self.order_elt() as usize == self.order_size()
    }
}

/// State common to every searcher: the tableau under construction, the
/// equivalence list, the constraint flags, and the traversal bookkeeping.
///
/// `DIM` is the triangulation dimension and `N = DIM + 1` the number of
/// vertices per simplex (carried separately because the facet permutations
/// of the automorphisms act on `N` points).
#[derive(Clone, Debug)]
pub(crate) struct SearcherBase<const DIM: usize, const N: usize> {
    pub perms: GluingPerms<DIM>,
    pub autos: Vec<crate::core::Isomorphism<N>>,
    pub orientable_only: bool,
    pub finite_only: bool,
    pub purge: CensusPurge,
    pub started: bool,
    /// Simplex orientations: +1 / -1, or 0 while unknown.
    pub orientation: Vec<i8>,
    /// The traversal order over the pairing graph's edges; each entry is
    /// the smaller facet of an identified pair (variants may rearrange).
    pub order: Vec<FacetSpec<DIM>>,
    pub order_elt: isize,
}

pub(crate) type SearcherBase3 = SearcherBase<3, 4>;
pub(crate) type SearcherBase4 = SearcherBase<4, 5>;

impl<const DIM: usize, const N: usize> SearcherBase<DIM, N> {
    pub fn new(
        pairing: FacetPairing<DIM>,
        autos: Vec<crate::core::Isomorphism<N>>,
        options: SearchOptions,
    ) -> Self {
        debug_assert!(pairing.is_connected());
        debug_assert!(autos.iter().all(|iso| iso.is_automorphism(&pairing)));

        let size = pairing.size();
        let order = FacetSpec::all(size)
            .filter(|&spec| !pairing.is_unmatched(spec) && spec < pairing.dest_spec(spec))
            .collect();

        SearcherBase {
            perms: GluingPerms::new(pairing),
            autos,
            orientable_only: options.orientable_only,
            finite_only: options.finite_only,
            purge: options.purge,
            started: false,
            orientation: vec![0; size],
            order,
            order_elt: 0,
        }
    }

    #[inline]
    pub fn current_face(&self) -> FacetSpec<DIM> {
        self.order[self.order_elt as usize]
    }

    #[inline]
    pub fn current_adj(&self) -> FacetSpec<DIM> {
        self.perms.pairing().dest_spec(self.current_face())
    }

    pub fn clear_current_pair(&mut self) {
        let face = self.current_face();
        let adj = self.current_adj();
        self.perms.set_perm_index(face, UNDECIDED);
        self.perms.set_perm_index(adj, UNDECIDED);
    }

    /// Standard permutation advancement: `+1` generally, `+2` to preserve
    /// parity when the partner simplex's orientation is already pinned.
    pub fn advance_standard(&mut self, n_perms: i8, inv: &[u8]) -> bool {
        let face = self.current_face();
        let adj = self.current_adj();
        let mut index = self.perms.perm_index(face);
        if !self.orientable_only || adj.facet == 0 {
            index += 1;
        } else {
            index += 2;
        }
        if index >= n_perms {
            return false;
        }
        self.perms.set_perm_index(face, index);
        self.perms.set_perm_index(adj, inv[index as usize] as i8);
        true
    }

    pub fn assign_orientation_standard(&mut self) {
        let face = self.current_face();
        let adj = self.current_adj();
        if adj.facet == 0 && self.orientable_only {
            // First gluing into this simplex pins its orientation.
            let parity = (self.perms.perm_index(face)
                + if face.facet == DIM { 0 } else { 1 }
                + if adj.facet == DIM { 0 } else { 1 })
                % 2;
            self.orientation[adj.simp] = if parity == 0 {
                -self.orientation[face.simp]
            } else {
                self.orientation[face.simp]
            };
        }
    }

    pub fn seed_orientation_standard(&mut self) {
        let face = self.current_face();
        if self.orientable_only && self.perms.pairing().dest_spec(face).facet > 0 {
            let adj = self.perms.pairing().dest_spec(face);
            let mut index: i8 = if self.orientation[face.simp] == self.orientation[adj.simp] {
                1
            } else {
                0
            };
            if (if face.facet == DIM { 0 } else { 1 }) + (if adj.facet == DIM { 0 } else { 1 }) == 1
            {
                index = (index + 1) % 2;
            }
            // Lands on -2 or -1 so that stepping by two reaches the right
            // parity class.
            self.perms.set_perm_index(face, index - 2);
        }
    }

    pub fn clear_seed(&mut self) {
        let face = self.current_face();
        self.perms.set_perm_index(face, UNDECIDED);
    }

    // ---------- checkpoint plumbing ----------

    pub fn dump(&self, out: &mut String) {
        let size = self.perms.size();
        let _ = writeln!(out, "{size}");
        for spec in FacetSpec::all(size) {
            let dest = self.perms.pairing().dest_spec(spec);
            let _ = write!(out, "{} {} ", dest.simp, dest.facet);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "{}", self.autos.len());
        for iso in &self.autos {
            for simp in 0..size {
                let _ = write!(out, "{} ", iso.simp_image(simp));
            }
            for simp in 0..size {
                let perm = iso.facet_perm(simp);
                for x in 0..N {
                    let _ = write!(out, "{} ", perm.image(x));
                }
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(
            out,
            "{} {} {} {}",
            i8::from(self.orientable_only),
            i8::from(self.finite_only),
            i8::from(self.started),
            self.purge.bits()
        );

        for index in self.perms.raw_indices() {
            let _ = write!(out, "{index} ");
        }
        let _ = writeln!(out);
        for orientation in &self.orientation {
            let _ = write!(out, "{orientation} ");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "{} {}", self.order_elt, self.order.len());
        for spec in &self.order {
            let _ = write!(out, "{} {} ", spec.simp, spec.facet);
        }
        let _ = writeln!(out);
    }

    pub fn read(reader: &mut TokenReader<'_>, n_perms: i8) -> Result<Self, PersistenceError> {
        // Far beyond any census this code could ever finish; rejecting
        // larger values keeps corrupt checkpoints from over-allocating.
        let size = reader.next_usize("size", 1 << 20)?;

        let mut dest = Vec::with_capacity(size * (DIM + 1));
        for _ in 0..size * (DIM + 1) {
            let simp = reader.next_usize("pairing simplex", size.saturating_sub(1))?;
            let facet = reader.next_usize("pairing facet", DIM)?;
            dest.push(FacetSpec::<DIM>::new(simp, facet));
        }
        let pairs: Vec<_> = FacetSpec::all(size)
            .filter(|spec| dest[spec.index()] != *spec && *spec < dest[spec.index()])
            .map(|spec| {
                let to = dest[spec.index()];
                ((spec.simp, spec.facet), (to.simp, to.facet))
            })
            .collect();
        let pairing = FacetPairing::from_pairs(size, &pairs).map_err(|_| {
            PersistenceError::OutOfRange {
                field: "pairing",
                value: size as i64,
            }
        })?;
        // An asymmetric destination table would survive pair extraction;
        // reject it here.
        for spec in FacetSpec::all(size) {
            if pairing.dest_spec(spec) != dest[spec.index()] {
                return Err(PersistenceError::OutOfRange {
                    field: "pairing symmetry",
                    value: spec.index() as i64,
                });
            }
        }

        let auto_count = reader.next_usize("automorphism count", 1 << 24)?;
        let mut autos = Vec::with_capacity(auto_count);
        for _ in 0..auto_count {
            let mut simp_image = Vec::with_capacity(size);
            let mut seen_simp = vec![false; size];
            for _ in 0..size {
                let image = reader.next_usize("automorphism simplex", size.saturating_sub(1))?;
                if seen_simp[image] {
                    return Err(PersistenceError::OutOfRange {
                        field: "automorphism simplex",
                        value: image as i64,
                    });
                }
                seen_simp[image] = true;
                simp_image.push(image);
            }
            let mut facet_perm = Vec::with_capacity(size);
            for _ in 0..size {
                let mut images = [0u8; N];
                let mut seen = [false; N];
                for slot in images.iter_mut() {
                    let image = reader.next_usize("automorphism facet perm", N - 1)?;
                    if seen[image] {
                        return Err(PersistenceError::OutOfRange {
                            field: "automorphism facet perm",
                            value: image as i64,
                        });
                    }
                    seen[image] = true;
                    *slot = image as u8;
                }
                facet_perm.push(Perm::<N>::from_images(images));
            }
            let iso = crate::core::Isomorphism::new(simp_image, facet_perm);
            if !iso.is_automorphism(&pairing) {
                return Err(PersistenceError::OutOfRange {
                    field: "automorphism",
                    value: autos.len() as i64,
                });
            }
            autos.push(iso);
        }

        let orientable_only = reader.next_bool("orientable flag")?;
        let finite_only = reader.next_bool("finite flag")?;
        let started = reader.next_bool("started flag")?;
        let purge = CensusPurge::from_bits(reader.next_in_range("purge", 0, 15)? as u8);

        let mut indices = Vec::with_capacity(size * (DIM + 1));
        for _ in 0..size * (DIM + 1) {
            indices.push(reader.next_in_range("perm index", -2, (n_perms - 1) as i64)? as i8);
        }
        let mut orientation = Vec::with_capacity(size);
        for _ in 0..size {
            orientation.push(reader.next_in_range("orientation", -1, 1)? as i8);
        }

        let max_order = size * (DIM + 1) / 2;
        let order_elt = reader.next_in_range("order position", 0, max_order as i64)?;
        let order_size = reader.next_usize("order size", max_order)?;
        if order_elt > order_size as i64 {
            return Err(PersistenceError::OutOfRange {
                field: "order position",
                value: order_elt,
            });
        }
        let mut order = Vec::with_capacity(order_size);
        for _ in 0..order_size {
            let simp = reader.next_usize("order simplex", size.saturating_sub(1))?;
            let facet = reader.next_usize("order facet", DIM)?;
            order.push(FacetSpec::new(simp, facet));
        }

        Ok(SearcherBase {
            perms: GluingPerms::from_parts(pairing, indices),
            autos,
            orientable_only,
            finite_only,
            purge,
            started,
            orientation,
            order,
            order_elt: order_elt as isize,
        })
    }
}

impl SearcherBase3 {
    pub fn advance_perm_standard(&mut self) -> bool {
        self.advance_standard(6, &Perm::<3>::INV_S3)
    }

    /// Whether the complete tableau is lexicographically minimal across its
    /// orbit under the automorphism list.
    pub fn is_canonical(&self) -> bool {
        let size = self.perms.size();
        'autos: for iso in &self.autos {
            for face in FacetSpec::all(size) {
                let dest = self.perms.pairing().dest_spec(face);
                if self.perms.pairing().is_unmatched(face) || dest < face {
                    continue;
                }
                let image = iso.image_of(face);
                let candidate = iso.facet_perm(dest.simp).inverse()
                    * self.perms.gluing(image)
                    * iso.facet_perm(face.simp);
                match self.perms.gluing(face).compare_with(&candidate) {
                    std::cmp::Ordering::Less => continue 'autos,
                    std::cmp::Ordering::Greater => return false,
                    std::cmp::Ordering::Equal => {}
                }
            }
        }
        true
    }
}

impl SearcherBase4 {
    pub fn advance_perm_standard(&mut self) -> bool {
        self.advance_standard(24, &Perm::<4>::INV_S4)
    }

    pub fn is_canonical(&self) -> bool {
        let size = self.perms.size();
        'autos: for iso in &self.autos {
            for facet in FacetSpec::all(size) {
                let dest = self.perms.pairing().dest_spec(facet);
                if self.perms.pairing().is_unmatched(facet) || dest < facet {
                    continue;
                }
                let image = iso.image_of(facet);
                let candidate = iso.facet_perm(dest.simp).inverse()
                    * self.perms.gluing(image)
                    * iso.facet_perm(facet.simp);
                match self.perms.gluing(facet).compare_with(&candidate) {
                    std::cmp::Ordering::Less => continue 'autos,
                    std::cmp::Ordering::Greater => return false,
                    std::cmp::Ordering::Equal => {}
                }
            }
        }
        true
    }
}
