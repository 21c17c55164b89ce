//! Collection aliases tuned for the census workloads.
//!
//! All searcher state proper lives in fixed-size `Vec` storage sized at
//! construction; the aliases here cover the remaining, non-hot-path uses
//! (construction-time maps and small scratch buffers).

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Hash map with a fast non-cryptographic hasher.
///
/// Keys are always internal, trusted data (simplex indices and the like),
/// so DoS resistance is deliberately traded for speed.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Hash set counterpart of [`FastHashMap`].
pub type FastHashSet<K> = FxHashSet<K>;

/// Small stack-first buffer for scratch work during construction.
///
/// Sixteen inline slots cover every pairing the trit-mask optimisations
/// address; larger inputs spill to the heap without ceremony.
pub type SmallBuffer<T> = SmallVec<[T; 16]>;
