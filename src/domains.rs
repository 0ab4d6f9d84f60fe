//! Defines the algebraic structures the lift operates over.
//!
//! The core trait is [Ring]. Each ring has an associated element type, that should not be
//! confused with the ring type itself:
//! - The ring of integers [Z](type@integer::Z) has elements of type [Integer](integer::Integer).
//! - The field of rational numbers [Q](type@rational::Q) has elements of type [Rational](rational::Rational).
//! - The prime field [Zp64](finite_field::Zp64) has elements of type [FiniteFieldElement](finite_field::FiniteFieldElement).
//!
//! The ring elements do not know which ring they belong to; the ring itself
//! performs the operations. The FGLM matrices are generic over the ring type.
pub mod finite_field;
pub mod integer;
pub mod rational;

use std::fmt::{Debug, Display};
use std::hash::Hash;

use integer::Integer;

/// A ring is a set with two binary operations, addition and multiplication.
pub trait Ring: Clone + PartialEq + Eq + Hash + Debug + Display + Send + Sync {
    /// The element of a ring. For example, the elements of the ring of integers [Z](type@integer::Z), `Z::Element`, are [Integer].
    type Element: Clone + PartialEq + Eq + Hash + Debug + Send + Sync;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn neg(&self, a: &Self::Element) -> Self::Element;
    fn zero(&self) -> Self::Element;
    fn one(&self) -> Self::Element;
    fn is_zero(&self, a: &Self::Element) -> bool;
    fn characteristic(&self) -> Integer;

    /// Format a ring element.
    fn fmt_element(
        &self,
        element: &Self::Element,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result;
}
