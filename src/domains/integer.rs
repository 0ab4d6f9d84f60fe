use std::fmt::{Display, Formatter};

use super::Ring;

/// An arbitrary-precision integer.
pub use rug::Integer;

/// The integer ring.
pub type Z = IntegerRing;
/// The integer ring.
pub const Z: IntegerRing = IntegerRing::new();

/// The integer ring.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IntegerRing;

impl Default for IntegerRing {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegerRing {
    pub const fn new() -> IntegerRing {
        IntegerRing
    }
}

impl Display for IntegerRing {
    fn fmt(&self, _: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

impl Ring for IntegerRing {
    type Element = Integer;

    #[inline]
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        Integer::from(a + b)
    }

    #[inline]
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        Integer::from(a - b)
    }

    #[inline]
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        Integer::from(a * b)
    }

    #[inline]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        Integer::from(-a)
    }

    #[inline]
    fn zero(&self) -> Self::Element {
        Integer::new()
    }

    #[inline]
    fn one(&self) -> Self::Element {
        Integer::from(1)
    }

    #[inline]
    fn is_zero(&self, a: &Self::Element) -> bool {
        a.cmp0().is_eq()
    }

    fn characteristic(&self) -> Integer {
        Integer::new()
    }

    fn fmt_element(
        &self,
        element: &Self::Element,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        element.fmt(f)
    }
}

/// Compute `a mod p` in the range `[0, |p|)`.
#[inline]
pub fn positive_mod(a: &Integer, p: &Integer) -> Integer {
    let mut r = Integer::from(a % p);
    if r < 0 {
        if *p < 0 {
            r -= p;
        } else {
            r += p;
        }
    }
    r
}

/// Perform the symmetric mod `p` on `a`, yielding a value in `(-p/2, p/2]`.
#[inline]
pub fn symmetric_mod(a: &Integer, p: &Integer) -> Integer {
    let c = positive_mod(a, p);

    if Integer::from(&c * 2u32) > *p {
        c - p
    } else {
        c
    }
}

/// The number of bits needed to store `|n|`, i.e. `ceil(log2(|n| + 1))`.
#[inline]
pub fn ceil_log2(n: &Integer) -> u32 {
    n.significant_bits()
}

#[cfg(test)]
mod test {
    use super::{ceil_log2, positive_mod, symmetric_mod, Integer, Z};
    use crate::domains::Ring;

    #[test]
    fn modular_representatives() {
        let p = Integer::from(7);
        assert_eq!(positive_mod(&Integer::from(-3), &p), 4);
        assert_eq!(positive_mod(&Integer::from(10), &p), 3);
        assert_eq!(symmetric_mod(&Integer::from(5), &p), -2);
        assert_eq!(symmetric_mod(&Integer::from(3), &p), 3);
    }

    #[test]
    fn ring_ops() {
        let a = Integer::from(12);
        let b = Integer::from(-5);
        assert_eq!(Z.add(&a, &b), 7);
        assert_eq!(Z.sub(&a, &b), 17);
        assert_eq!(Z.mul(&a, &b), -60);
        assert!(Z.is_zero(&Z.zero()));
        assert_eq!(ceil_log2(&Integer::from(1000003)), 20);
    }
}
