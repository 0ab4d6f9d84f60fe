use std::{
    borrow::Cow,
    fmt::{Display, Formatter},
};

use super::{
    finite_field::{FiniteFieldElement, ToFiniteField, Zp64},
    integer::{ceil_log2, positive_mod, Integer},
    Ring,
};

/// The field of rational numbers.
pub type Q = RationalField;
/// The field of rational numbers.
pub const Q: RationalField = RationalField::new();

/// The field of rational numbers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RationalField;

impl Default for RationalField {
    fn default() -> Self {
        Self::new()
    }
}

impl RationalField {
    pub const fn new() -> RationalField {
        RationalField
    }
}

impl Display for RationalField {
    fn fmt(&self, _: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

/// A rational number in lowest terms with a positive denominator.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Rational {
    numerator: Integer,
    denominator: Integer,
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl Rational {
    /// Create a new rational number `num/den` and bring it to lowest terms.
    pub fn new(num: Integer, den: Integer) -> Rational {
        if den.cmp0().is_eq() {
            panic!("Denominator of {}/{} is zero", num, den);
        }

        let gcd = num.clone().gcd(&den);
        let (mut num, mut den) = if gcd == 1 {
            (num, den)
        } else {
            (num / &gcd, den / &gcd)
        };

        if den < 0 {
            num = -num;
            den = -den;
        }

        Rational {
            numerator: num,
            denominator: den,
        }
    }

    /// Create a rational number from a numerator and denominator that
    /// are already coprime, with a positive denominator.
    pub fn from_unchecked(numerator: Integer, denominator: Integer) -> Rational {
        debug_assert!(denominator > 0);
        Rational {
            numerator,
            denominator,
        }
    }

    pub fn zero() -> Rational {
        Rational {
            numerator: Integer::new(),
            denominator: Integer::from(1),
        }
    }

    pub fn one() -> Rational {
        Rational {
            numerator: Integer::from(1),
            denominator: Integer::from(1),
        }
    }

    pub fn numerator_ref(&self) -> &Integer {
        &self.numerator
    }

    pub fn denominator_ref(&self) -> &Integer {
        &self.denominator
    }

    pub fn numerator(&self) -> Integer {
        self.numerator.clone()
    }

    pub fn denominator(&self) -> Integer {
        self.denominator.clone()
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.cmp0().is_eq()
    }

    pub fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    /// Map the rational to the prime field `field`. Returns `None`
    /// if the denominator is divisible by the prime.
    pub fn try_to_finite_field(&self, field: &Zp64) -> Option<FiniteFieldElement<u64>> {
        let d = self.denominator.to_finite_field(field);
        let d_inv = field.try_inv(&d)?;
        Some(field.mul(&self.numerator.to_finite_field(field), &d_inv))
    }

    /// Reconstruct a rational number `n/d` from a residue `v` modulo `m`
    /// with `|n| <= numerator_bound` and `0 < d <= denominator_bound`,
    /// using Wang's half-extended Euclidean algorithm.
    ///
    /// If `2 * numerator_bound * denominator_bound < m`, the result is unique.
    pub fn bounded_reconstruction(
        v: &Integer,
        m: &Integer,
        numerator_bound: &Integer,
        denominator_bound: &Integer,
    ) -> Option<Rational> {
        let (mut old_r, mut r) = (m.clone(), positive_mod(v, m));
        let (mut old_t, mut t) = (Integer::new(), Integer::from(1));

        while r > *numerator_bound {
            let q = Integer::from(&old_r / &r);
            old_r -= Integer::from(&q * &r);
            std::mem::swap(&mut old_r, &mut r);
            old_t -= Integer::from(&q * &t);
            std::mem::swap(&mut old_t, &mut t);
        }

        if t.cmp0().is_eq() || Integer::from(t.abs_ref()) > *denominator_bound {
            return None;
        }

        if r.clone().gcd(&t) != 1 {
            return None;
        }

        if t < 0 {
            Some(Rational::from_unchecked(-r, -t))
        } else {
            Some(Rational::from_unchecked(r, t))
        }
    }

    /// Reconstruct a rational number `q` from a value `v` in a prime field `p`,
    /// such that `q ≡ v mod p`.
    ///
    /// From "Maximal Quotient Rational Reconstruction: An Almost
    /// Optimal Algorithm for Rational Reconstruction" by Monagan.
    pub fn maximal_quotient_reconstruction(
        v: &Integer,
        p: &Integer,
        acceptance_scale: Option<Integer>,
    ) -> Result<Rational, &'static str> {
        // set t to 2^11*ceil(log2(m))
        let mut acceptance_scale = acceptance_scale
            .unwrap_or_else(|| Integer::from(2u32 << 10) * ceil_log2(p));

        if v.cmp0().is_eq() {
            return if *p > acceptance_scale {
                Ok(Rational::zero())
            } else {
                Err("Could not reconstruct: u=0 and t <= m")
            };
        }

        let mut n = Integer::new();
        let mut d = Integer::new();
        let (mut t, mut old_t) = (Integer::from(1), Integer::new());
        let (mut r, mut old_r) = (positive_mod(v, p), p.clone());

        while r.cmp0().is_ne() && old_r > acceptance_scale {
            let q = Integer::from(&old_r / &r);
            if q > acceptance_scale {
                n = r.clone();
                d = t.clone();
                acceptance_scale = q.clone();
            }
            old_r -= Integer::from(&q * &r);
            std::mem::swap(&mut old_r, &mut r);
            old_t -= Integer::from(&q * &t);
            std::mem::swap(&mut old_t, &mut t);
        }

        if d.cmp0().is_eq() || n.clone().gcd(&d) != 1 {
            return Err("Reconstruction failed");
        }
        if d < 0 {
            n = -n;
            d = -d;
        }

        Ok(Rational::from_unchecked(n, d))
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_integer() {
            self.numerator.fmt(f)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl From<Integer> for Rational {
    fn from(value: Integer) -> Self {
        Rational::from_unchecked(value, Integer::from(1))
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Integer::from(value).into()
    }
}

impl From<(i64, i64)> for Rational {
    fn from((num, den): (i64, i64)) -> Self {
        Rational::new(num.into(), den.into())
    }
}

impl Ring for RationalField {
    type Element = Rational;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if a.denominator == b.denominator {
            return Rational::new(
                Integer::from(&a.numerator + &b.numerator),
                a.denominator.clone(),
            );
        }

        let num = Integer::from(&a.numerator * &b.denominator)
            + Integer::from(&b.numerator * &a.denominator);
        Rational::new(num, Integer::from(&a.denominator * &b.denominator))
    }

    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.add(a, &self.neg(b))
    }

    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        Rational::new(
            Integer::from(&a.numerator * &b.numerator),
            Integer::from(&a.denominator * &b.denominator),
        )
    }

    fn neg(&self, a: &Self::Element) -> Self::Element {
        Rational::from_unchecked(Integer::from(-&a.numerator), a.denominator.clone())
    }

    fn zero(&self) -> Self::Element {
        Rational::zero()
    }

    fn one(&self) -> Self::Element {
        Rational::one()
    }

    fn is_zero(&self, a: &Self::Element) -> bool {
        a.is_zero()
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

/// A procedure that recovers a rational number from its image `residue` modulo
/// `modulus`, or reports that no rational satisfying its bounds exists.
pub trait RationalReconstruction {
    fn reconstruct(&self, residue: &Integer, modulus: &Integer) -> Option<Rational>;
}

impl<F: Fn(&Integer, &Integer) -> Option<Rational>> RationalReconstruction for F {
    fn reconstruct(&self, residue: &Integer, modulus: &Integer) -> Option<Rational> {
        self(residue, modulus)
    }
}

/// Rational reconstruction with explicit numerator and denominator bounds.
///
/// Without fixed bounds, the balanced bounds `N = D = floor(sqrt(m/2))` are derived
/// from every modulus `m`, which guarantees uniqueness of the reconstructed value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundedReconstruction {
    bounds: Option<(Integer, Integer)>,
}

impl BoundedReconstruction {
    /// Use balanced bounds derived from the modulus.
    pub fn new() -> BoundedReconstruction {
        BoundedReconstruction { bounds: None }
    }

    /// Use the fixed bounds `|n| <= numerator_bound` and `d <= denominator_bound`.
    pub fn with_bounds(numerator_bound: Integer, denominator_bound: Integer) -> BoundedReconstruction {
        BoundedReconstruction {
            bounds: Some((numerator_bound, denominator_bound)),
        }
    }

    /// Compute `floor(sqrt(m/2))`.
    pub fn balanced_bound(modulus: &Integer) -> Integer {
        Integer::from(modulus >> 1u32).sqrt()
    }

    fn bounds_for<'a>(&'a self, modulus: &Integer) -> (Cow<'a, Integer>, Cow<'a, Integer>) {
        match &self.bounds {
            Some((n, d)) => (Cow::Borrowed(n), Cow::Borrowed(d)),
            None => {
                let b = Self::balanced_bound(modulus);
                (Cow::Owned(b.clone()), Cow::Owned(b))
            }
        }
    }
}

impl RationalReconstruction for BoundedReconstruction {
    fn reconstruct(&self, residue: &Integer, modulus: &Integer) -> Option<Rational> {
        let (n, d) = self.bounds_for(modulus);
        Rational::bounded_reconstruction(residue, modulus, &n, &d)
    }
}

/// Monagan's maximal quotient rational reconstruction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaximalQuotientReconstruction {
    pub acceptance_scale: Option<Integer>,
}

impl RationalReconstruction for MaximalQuotientReconstruction {
    fn reconstruct(&self, residue: &Integer, modulus: &Integer) -> Option<Rational> {
        Rational::maximal_quotient_reconstruction(residue, modulus, self.acceptance_scale.clone())
            .ok()
    }
}
