//! # Component Signatures
//!
//! A signature is a fixed-width bitset with one bit per component family.
//! Bit `i` is set iff the entity currently has the component whose family id
//! is `i`. Bit 0 is never set because family id 0 is reserved.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use super::registry::{ComponentFamily, FamilyId};

/// Width of a signature in bits. Component family limits may not exceed it.
pub const SIGNATURE_BITS: usize = 32;

/// Bitset of component families.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Signature(u32);

impl Signature {
    /// The empty signature.
    pub const EMPTY: Self = Self(0);

    /// Builds a signature from raw bits, e.g. one read back from disk.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns a copy with `family` set.
    #[inline]
    #[must_use]
    pub fn with(self, family: ComponentFamily) -> Self {
        Self(self.0 | Self::mask(family))
    }

    /// Returns a copy with `family` cleared.
    #[inline]
    #[must_use]
    pub fn without(self, family: ComponentFamily) -> Self {
        Self(self.0 & !Self::mask(family))
    }

    /// Sets or clears the bit for `family` in place.
    #[inline]
    pub fn set(&mut self, family: ComponentFamily, enable: bool) {
        *self = if enable {
            self.with(family)
        } else {
            self.without(family)
        };
    }

    /// Checks whether the bit for `family` is set.
    #[inline]
    #[must_use]
    pub fn contains(self, family: ComponentFamily) -> bool {
        self.0 & Self::mask(family) != 0
    }

    /// Checks whether every bit of `required` is also set here.
    #[inline]
    #[must_use]
    pub const fn matches(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates the set bits as raw family ids, lowest first.
    ///
    /// Uses `trailing_zeros` to skip clear regions.
    pub fn bits_set(self) -> impl Iterator<Item = u8> {
        let mut word = self.0;
        std::iter::from_fn(move || {
            if word == 0 {
                return None;
            }
            let bit = word.trailing_zeros();
            word &= word - 1;
            // bit < 32, always fits.
            u8::try_from(bit).ok()
        })
    }

    #[inline]
    fn mask(family: ComponentFamily) -> u32 {
        debug_assert!(family.index() < SIGNATURE_BITS, "family outside signature width");
        1u32 << family.get()
    }
}

impl BitOr for Signature {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Signature {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl FromIterator<ComponentFamily> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentFamily>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:#034b})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::registry::TypeRegistry;

    struct A;
    struct B;
    struct C;

    fn families() -> (ComponentFamily, ComponentFamily, ComponentFamily) {
        let mut registry = TypeRegistry::new(32);
        (
            registry.register::<A>().unwrap(),
            registry.register::<B>().unwrap(),
            registry.register::<C>().unwrap(),
        )
    }

    #[test]
    fn test_set_and_clear() {
        let (a, b, _) = families();
        let mut sig = Signature::EMPTY.with(a);
        assert!(sig.contains(a));
        assert!(!sig.contains(b));

        sig.set(b, true);
        assert_eq!(sig.len(), 2);
        sig.set(a, false);
        assert!(!sig.contains(a));
        assert_eq!(sig.bits(), 1 << b.get());
    }

    #[test]
    fn test_matches_is_subset_test() {
        let (a, b, c) = families();
        let required = Signature::EMPTY.with(a).with(b);

        assert!(Signature::EMPTY.with(a).with(b).with(c).matches(required));
        assert!(!Signature::EMPTY.with(a).matches(required));
        // Everything matches the empty requirement.
        assert!(Signature::EMPTY.matches(Signature::EMPTY));
    }

    #[test]
    fn test_bits_set_iterates_lowest_first() {
        let (a, _, c) = families();
        let sig: Signature = [c, a].into_iter().collect();
        let bits: Vec<u8> = sig.bits_set().collect();
        assert_eq!(bits, vec![a.get(), c.get()]);
        assert_eq!(Signature::EMPTY.bits_set().count(), 0);
    }
}
