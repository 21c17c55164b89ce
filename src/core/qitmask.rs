//! A base-4 bitmask: 64 "trits" packed into two machine words.
//!
//! Each slot holds a value 0–3; addition and subtraction act slot-wise
//! modulo 4 with no carry between slots.  The closed-prime-minimal searcher
//! uses a pair of these to count, for every tetrahedron face, how many times
//! an edge class runs around that face's boundary in each direction.
//!
//! Sixty-four slots address the faces of the first sixteen tetrahedra;
//! larger censuses silently lose only pruning strength (spec'd behaviour,
//! not an error).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{AddAssign, SubAssign};

/// A mask of 64 slots, each holding 0–3.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qitmask {
    /// Low bits of each slot.
    low: u64,
    /// High bits of each slot.
    high: u64,
}

impl Qitmask {
    /// A mask with every slot zero.
    pub const ZERO: Qitmask = Qitmask { low: 0, high: 0 };

    /// The value of the given slot.
    #[inline]
    #[must_use]
    pub const fn get(&self, index: usize) -> u8 {
        (((self.low >> index) & 1) | (((self.high >> index) & 1) << 1)) as u8
    }

    /// Sets the given slot to `value` (0–3).
    #[inline]
    pub fn set(&mut self, index: usize, value: u8) {
        debug_assert!(value < 4);
        let bit = 1u64 << index;
        self.low = (self.low & !bit) | (u64::from(value & 1) << index);
        self.high = (self.high & !bit) | (u64::from(value >> 1) << index);
    }

    /// Whether every slot is zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    /// Whether any slot holds the value 3.
    #[inline]
    #[must_use]
    pub const fn has_3(&self) -> bool {
        self.low & self.high != 0
    }

    /// Whether some slot is non-zero in both this mask and `other`.
    #[inline]
    #[must_use]
    pub const fn has_nonzero_match(&self, other: &Qitmask) -> bool {
        (self.low | self.high) & (other.low | other.high) != 0
    }
}

impl AddAssign for Qitmask {
    /// Slot-wise addition modulo 4, no carry between slots.
    #[inline]
    fn add_assign(&mut self, rhs: Qitmask) {
        self.high = self.high ^ rhs.high ^ (self.low & rhs.low);
        self.low ^= rhs.low;
    }
}

impl SubAssign for Qitmask {
    /// Slot-wise subtraction modulo 4, no borrow between slots.
    #[inline]
    fn sub_assign(&mut self, rhs: Qitmask) {
        self.high = self.high ^ rhs.high ^ (rhs.low & !self.low);
        self.low ^= rhs.low;
    }
}

impl fmt::Debug for Qitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..64 {
            write!(f, "{}", self.get(i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut mask = Qitmask::ZERO;
        for value in 0..4u8 {
            mask.set(17, value);
            assert_eq!(mask.get(17), value);
            assert_eq!(mask.get(16), 0);
            assert_eq!(mask.get(18), 0);
        }
    }

    #[test]
    fn addition_is_mod_4_per_slot() {
        // Exhaustive over a single slot.
        for a in 0..4u8 {
            for b in 0..4u8 {
                let mut x = Qitmask::ZERO;
                x.set(5, a);
                let mut y = Qitmask::ZERO;
                y.set(5, b);
                x += y;
                assert_eq!(x.get(5), (a + b) % 4, "{a} + {b}");
            }
        }
    }

    #[test]
    fn subtraction_inverts_addition() {
        for a in 0..4u8 {
            for b in 0..4u8 {
                let mut x = Qitmask::ZERO;
                x.set(63, a);
                let mut y = Qitmask::ZERO;
                y.set(63, b);
                x += y;
                x -= y;
                assert_eq!(x.get(63), a, "{a} +- {b}");
            }
        }
    }

    #[test]
    fn no_carry_between_slots() {
        let mut x = Qitmask::ZERO;
        x.set(3, 3);
        let mut y = Qitmask::ZERO;
        y.set(3, 1);
        x += y;
        assert_eq!(x.get(3), 0);
        assert_eq!(x.get(4), 0);
        assert_eq!(x.get(2), 0);
    }

    #[test]
    fn predicates() {
        let mut x = Qitmask::ZERO;
        assert!(x.is_zero());
        assert!(!x.has_3());
        x.set(40, 3);
        assert!(x.has_3());

        let mut y = Qitmask::ZERO;
        y.set(41, 2);
        assert!(!x.has_nonzero_match(&y));
        y.set(40, 1);
        assert!(x.has_nonzero_match(&y));
    }
}
