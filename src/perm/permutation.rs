//! Permutations on up to five elements, with the index tables used to
//! enumerate facet gluings.
//!
//! A gluing between two paired facets is a bijection between their vertex
//! sets, encoded as an index into [`Perm::<3>::S3`] (tetrahedron facets) or
//! [`Perm::<4>::S4`] (pentachoron facets).  Both tables use the
//! *sign-alternating* order: the permutation at an even index is always an
//! even permutation.  This property is what allows orientable-only searches
//! to step through candidate gluings two indices at a time.
//!
//! # Composition convention
//!
//! `(p * q).image(x) == p.image(q.image(x))` — the right-hand factor is
//! applied first.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Mul;

/// A permutation of `{0, 1, …, N-1}`, stored as its image array.
///
/// `N` is at most 5 in this crate: `Perm<3>` twists triangle classes,
/// `Perm<4>` glues tetrahedra, `Perm<5>` glues pentachora.
///
/// The derived `Ord` compares image sequences lexicographically, which is
/// exactly the ordering used by the canonical-form filter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Perm<const N: usize> {
    #[serde(with = "serde_array")]
    images: [u8; N],
}

/// Serde glue for the const-generic `[u8; N]` image array.
///
/// `serde` ships `Serialize`/`Deserialize` impls only for fixed array sizes,
/// not for const-generic `[u8; N]`, so the derive on [`Perm`] needs this
/// helper.  The array is (de)serialized as an `N`-element tuple, matching the
/// representation serde uses for the fixed-size arrays.
mod serde_array {
    use serde::de::{Deserializer, Error, SeqAccess, Visitor};
    use serde::ser::{SerializeTuple, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, const N: usize>(
        array: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tup = serializer.serialize_tuple(N)?;
        for byte in array {
            tup.serialize_element(byte)?;
        }
        tup.end()
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ArrayVisitor<const N: usize>(PhantomData<[u8; N]>);

        impl<'de, const N: usize> Visitor<'de> for ArrayVisitor<N> {
            type Value = [u8; N];

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "an array of {N} bytes")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<[u8; N], A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut array = [0u8; N];
                for (i, slot) in array.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| Error::invalid_length(i, &self))?;
                }
                Ok(array)
            }
        }

        deserializer.deserialize_tuple(N, ArrayVisitor::<N>(PhantomData))
    }
}

const fn factorial(n: usize) -> usize {
    let mut result = 1;
    let mut i = 2;
    while i <= n {
        result *= i;
        i += 1;
    }
    result
}

/// Builds the permutation at the given position of the sign-alternating
/// order on `S_N`.
///
/// The index is decomposed into factorial-base digits selecting images from
/// the remaining elements in ascending order; the final binary digit is
/// XOR-adjusted by the parity of the preceding digits, which makes the
/// permutation's sign equal to the parity of the index.
const fn sn_at<const N: usize>(index: usize) -> Perm<N> {
    let mut avail = [0u8; N];
    let mut i = 0;
    while i < N {
        avail[i] = i as u8;
        i += 1;
    }

    let mut images = [0u8; N];
    let mut rem = index;
    let mut parity = 0;
    let mut pos = 0;
    while pos < N {
        let weight = factorial(N - 1 - pos);
        let mut digit = rem / weight;
        rem %= weight;
        if N >= 2 && pos == N - 2 {
            digit ^= parity & 1;
        }
        parity += digit;

        images[pos] = avail[digit];
        // Close the gap left by the chosen element.
        let mut j = digit;
        while j + 1 < N - pos {
            avail[j] = avail[j + 1];
            j += 1;
        }
        pos += 1;
    }

    Perm { images }
}

const fn sn_table<const N: usize, const NF: usize>() -> [Perm<N>; NF] {
    let mut table = [Perm { images: [0u8; N] }; NF];
    let mut i = 0;
    while i < NF {
        table[i] = sn_at::<N>(i);
        i += 1;
    }
    table
}

const fn inv_table<const N: usize, const NF: usize>() -> [u8; NF] {
    let table = sn_table::<N, NF>();
    let mut inv = [0u8; NF];
    let mut i = 0;
    while i < NF {
        let p = table[i];
        // Invert by brute force; compile-time only.
        let mut q = [0u8; N];
        let mut x = 0;
        while x < N {
            q[p.images[x] as usize] = x as u8;
            x += 1;
        }
        let mut j = 0;
        while j < NF {
            let mut matches = true;
            let mut x = 0;
            while x < N {
                if table[j].images[x] != q[x] {
                    matches = false;
                    break;
                }
                x += 1;
            }
            if matches {
                inv[i] = j as u8;
                break;
            }
            j += 1;
        }
        i += 1;
    }
    inv
}

impl<const N: usize> Perm<N> {
    /// The identity permutation.
    pub const IDENTITY: Perm<N> = {
        let mut images = [0u8; N];
        let mut i = 0;
        while i < N {
            images[i] = i as u8;
            i += 1;
        }
        Perm { images }
    };

    /// Creates a permutation from its image array.
    ///
    /// Debug builds assert that the array is a bijection.
    #[must_use]
    pub fn from_images(images: [u8; N]) -> Self {
        debug_assert!({
            let mut seen = [false; N];
            images.iter().all(|&x| {
                let fresh = (x as usize) < N && !seen[x as usize];
                if fresh {
                    seen[x as usize] = true;
                }
                fresh
            })
        });
        Perm { images }
    }

    /// The transposition of `a` and `b` (which may be equal, giving the
    /// identity).
    #[must_use]
    pub const fn transposition(a: usize, b: usize) -> Self {
        let mut images = Self::IDENTITY.images;
        images[a] = b as u8;
        images[b] = a as u8;
        Perm { images }
    }

    /// The image of `x`.
    #[inline]
    #[must_use]
    pub const fn image(&self, x: usize) -> usize {
        self.images[x] as usize
    }

    /// The preimage of `x`.
    #[inline]
    #[must_use]
    pub fn preimage(&self, x: usize) -> usize {
        self.images.iter().position(|&y| y as usize == x).unwrap_or(N)
    }

    /// The inverse permutation.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut images = [0u8; N];
        for (x, &y) in self.images.iter().enumerate() {
            images[y as usize] = x as u8;
        }
        Perm { images }
    }

    /// The sign of this permutation: `+1` if even, `-1` if odd.
    #[must_use]
    pub fn sign(&self) -> i8 {
        let mut sign = 1;
        for i in 0..N {
            for j in (i + 1)..N {
                if self.images[i] > self.images[j] {
                    sign = -sign;
                }
            }
        }
        sign
    }

    /// Lexicographic comparison of image sequences.
    ///
    /// Identical to the derived `Ord`; provided by name because the
    /// canonical-form filter reads better with it.
    #[inline]
    #[must_use]
    pub fn compare_with(&self, other: &Self) -> Ordering {
        self.images.cmp(&other.images)
    }

    /// Extends this permutation to act on `{0, …, M-1}`, fixing every new
    /// point.
    #[must_use]
    pub fn extend<const M: usize>(&self) -> Perm<M> {
        debug_assert!(M >= N);
        let mut images = Perm::<M>::IDENTITY.images;
        images[..N].copy_from_slice(&self.images);
        Perm { images }
    }

    /// Restricts this permutation to `{0, …, M-1}`.
    ///
    /// Debug builds assert that the restriction is well defined (every
    /// image of a restricted point is itself below `M`).
    #[must_use]
    pub fn restrict<const M: usize>(&self) -> Perm<M> {
        debug_assert!(M <= N && self.images[..M].iter().all(|&x| (x as usize) < M));
        let mut images = [0u8; M];
        images.copy_from_slice(&self.images[..M]);
        Perm { images }
    }
}

impl<const N: usize> Mul for Perm<N> {
    type Output = Perm<N>;

    #[inline]
    fn mul(self, rhs: Perm<N>) -> Perm<N> {
        let mut images = [0u8; N];
        for (x, out) in images.iter_mut().enumerate() {
            *out = self.images[rhs.images[x] as usize];
        }
        Perm { images }
    }
}

impl<const N: usize> Default for Perm<N> {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl<const N: usize> fmt::Debug for Perm<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &x in &self.images {
            write!(f, "{x}")?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Display for Perm<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Perm<3> {
    /// All six permutations of three elements in sign-alternating order.
    pub const S3: [Perm<3>; 6] = sn_table::<3, 6>();

    /// `INV_S3[i]` is the index of `S3[i].inverse()` in [`Self::S3`].
    pub const INV_S3: [u8; 6] = inv_table::<3, 6>();

    /// The position of this permutation in [`Self::S3`].
    #[must_use]
    pub fn s3_index(&self) -> usize {
        Self::S3.iter().position(|p| p == self).expect("S3 is exhaustive")
    }
}

impl Perm<4> {
    /// All 24 permutations of four elements in sign-alternating order.
    pub const S4: [Perm<4>; 24] = sn_table::<4, 24>();

    /// `INV_S4[i]` is the index of `S4[i].inverse()` in [`Self::S4`].
    pub const INV_S4: [u8; 24] = inv_table::<4, 24>();

    /// The position of this permutation in [`Self::S4`].
    #[must_use]
    pub fn s4_index(&self) -> usize {
        Self::S4.iter().position(|p| p == self).expect("S4 is exhaustive")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_is_the_expected_order() {
        let images: Vec<[u8; 3]> = Perm::<3>::S3.iter().map(|p| p.images).collect();
        assert_eq!(
            images,
            vec![
                [0, 1, 2],
                [0, 2, 1],
                [1, 2, 0],
                [1, 0, 2],
                [2, 0, 1],
                [2, 1, 0]
            ]
        );
    }

    #[test]
    fn s4_first_block_and_block_boundaries() {
        assert_eq!(Perm::<4>::S4[0].images, [0, 1, 2, 3]);
        assert_eq!(Perm::<4>::S4[1].images, [0, 1, 3, 2]);
        assert_eq!(Perm::<4>::S4[6].images, [1, 0, 3, 2]);
        assert_eq!(Perm::<4>::S4[12].images, [2, 0, 1, 3]);
        assert_eq!(Perm::<4>::S4[18].images, [3, 0, 2, 1]);
        assert_eq!(Perm::<4>::S4[23].images, [3, 2, 0, 1]);
    }

    #[test]
    fn sign_alternates_with_index() {
        for (i, p) in Perm::<3>::S3.iter().enumerate() {
            assert_eq!(p.sign(), if i % 2 == 0 { 1 } else { -1 });
        }
        for (i, p) in Perm::<4>::S4.iter().enumerate() {
            assert_eq!(p.sign(), if i % 2 == 0 { 1 } else { -1 });
        }
    }

    #[test]
    fn tables_are_exhaustive_and_distinct() {
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_ne!(Perm::<3>::S3[i], Perm::<3>::S3[j]);
            }
        }
        for i in 0..24 {
            for j in (i + 1)..24 {
                assert_ne!(Perm::<4>::S4[i], Perm::<4>::S4[j]);
            }
        }
    }

    #[test]
    fn inverse_tables_invert() {
        for i in 0..6 {
            let p = Perm::<3>::S3[i];
            assert_eq!(p.inverse(), Perm::<3>::S3[Perm::<3>::INV_S3[i] as usize]);
            assert_eq!(p * p.inverse(), Perm::<3>::IDENTITY);
        }
        for i in 0..24 {
            let p = Perm::<4>::S4[i];
            assert_eq!(p.inverse(), Perm::<4>::S4[Perm::<4>::INV_S4[i] as usize]);
            assert_eq!(p * p.inverse(), Perm::<4>::IDENTITY);
        }
    }

    #[test]
    fn composition_applies_right_factor_first() {
        let p = Perm::<4>::from_images([1, 2, 3, 0]);
        let q = Perm::<4>::transposition(0, 3);
        assert_eq!((p * q).image(0), p.image(q.image(0)));
        assert_eq!((p * q).image(0), 0);
        assert_eq!((p * q).image(3), 1);
    }

    #[test]
    fn preimage_inverts_image() {
        let p = Perm::<5>::from_images([3, 0, 4, 1, 2]);
        for x in 0..5 {
            assert_eq!(p.preimage(p.image(x)), x);
            assert_eq!(p.inverse().image(x), p.preimage(x));
        }
    }

    #[test]
    fn extend_fixes_new_points() {
        let p = Perm::<3>::from_images([2, 0, 1]);
        let q: Perm<5> = p.extend();
        assert_eq!(q.image(0), 2);
        assert_eq!(q.image(3), 3);
        assert_eq!(q.image(4), 4);
    }

    #[test]
    fn restrict_round_trips_with_extend() {
        let p = Perm::<3>::from_images([1, 2, 0]);
        let q: Perm<4> = p.extend();
        assert_eq!(q.restrict::<3>(), p);
    }

    #[test]
    fn sign_of_transpositions_and_cycles() {
        assert_eq!(Perm::<5>::transposition(1, 4).sign(), -1);
        assert_eq!(Perm::<5>::from_images([1, 2, 0, 3, 4]).sign(), 1);
        assert_eq!(Perm::<5>::IDENTITY.sign(), 1);
    }
}
