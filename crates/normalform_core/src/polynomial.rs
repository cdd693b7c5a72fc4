//! Sparse multivariate polynomials over the complex numbers.
//!
//! A polynomial is a canonical map from exponent vectors to non-zero
//! coefficients. Every polynomial knows how many variables it is written in;
//! the names of those variables live in a separate [`Variables`] tuple so that
//! the same polynomial can be rendered against old or new coordinates.

use crate::error::{NormalFormError, Result};
use num_complex::Complex64;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

pub type Coefficient = Complex64;

/// Exponent vector identifying the monomial `x^α`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Monomial(Vec<u32>);

impl Monomial {
    pub fn new(exponents: Vec<u32>) -> Self {
        Self(exponents)
    }

    /// The monomial `1` in `nvars` variables.
    pub fn one(nvars: usize) -> Self {
        Self(vec![0; nvars])
    }

    pub fn variable(nvars: usize, index: usize) -> Self {
        let mut exponents = vec![0; nvars];
        exponents[index] = 1;
        Self(exponents)
    }

    pub fn exponents(&self) -> &[u32] {
        &self.0
    }

    pub fn nvars(&self) -> usize {
        self.0.len()
    }

    /// Total degree, the sum of the exponents.
    pub fn degree(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn product(&self, other: &Monomial) -> Monomial {
        Monomial(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }

    /// Divides out one power of variable `index`, or `None` if it does not occur.
    pub fn lower(&self, index: usize) -> Option<Monomial> {
        if self.0[index] == 0 {
            return None;
        }
        let mut exponents = self.0.clone();
        exponents[index] -= 1;
        Some(Monomial(exponents))
    }
}

/// Ordered tuple of distinct variable names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variables {
    names: Vec<String>,
}

impl Variables {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(NormalFormError::DuplicateVariable(name.clone()));
            }
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

#[derive(Serialize, Deserialize)]
struct PolynomialRepr {
    nvars: usize,
    terms: Vec<(Vec<u32>, Coefficient)>,
}

/// A polynomial in `nvars` variables with complex coefficients.
///
/// Zero coefficients are never stored, so structural equality is polynomial
/// equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PolynomialRepr", try_from = "PolynomialRepr")]
pub struct Polynomial {
    nvars: usize,
    terms: BTreeMap<Monomial, Coefficient>,
}

impl From<Polynomial> for PolynomialRepr {
    fn from(poly: Polynomial) -> Self {
        Self {
            nvars: poly.nvars,
            terms: poly
                .terms
                .into_iter()
                .map(|(monomial, coeff)| (monomial.0, coeff))
                .collect(),
        }
    }
}

impl TryFrom<PolynomialRepr> for Polynomial {
    type Error = NormalFormError;

    fn try_from(repr: PolynomialRepr) -> Result<Self> {
        Polynomial::from_terms(
            repr.nvars,
            repr.terms
                .into_iter()
                .map(|(exponents, coeff)| (Monomial(exponents), coeff)),
        )
    }
}

impl Polynomial {
    pub fn zero(nvars: usize) -> Self {
        Self {
            nvars,
            terms: BTreeMap::new(),
        }
    }

    pub fn constant(nvars: usize, value: Coefficient) -> Self {
        Self::from_term(Monomial::one(nvars), value)
    }

    /// The coordinate function `x_index`.
    pub fn variable(nvars: usize, index: usize) -> Self {
        Self::from_term(Monomial::variable(nvars, index), Coefficient::one())
    }

    pub fn from_term(monomial: Monomial, coeff: Coefficient) -> Self {
        let mut poly = Self::zero(monomial.nvars());
        poly.add_term(monomial, coeff);
        poly
    }

    /// Builds a polynomial from (monomial, coefficient) pairs, summing repeats.
    pub fn from_terms(
        nvars: usize,
        terms: impl IntoIterator<Item = (Monomial, Coefficient)>,
    ) -> Result<Self> {
        let mut poly = Self::zero(nvars);
        for (monomial, coeff) in terms {
            if monomial.nvars() != nvars {
                return Err(NormalFormError::Shape {
                    what: "monomial exponent vector",
                    expected: nvars,
                    found: monomial.nvars(),
                });
            }
            poly.add_term(monomial, coeff);
        }
        Ok(poly)
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of stored (non-zero) terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Coefficient)> {
        self.terms.iter()
    }

    pub fn coefficient(&self, monomial: &Monomial) -> Coefficient {
        self.terms
            .get(monomial)
            .copied()
            .unwrap_or_else(Coefficient::zero)
    }

    /// Adds `coeff·monomial`, dropping the entry if it cancels.
    pub fn add_term(&mut self, monomial: Monomial, coeff: Coefficient) {
        debug_assert_eq!(monomial.nvars(), self.nvars);
        if coeff.is_zero() {
            return;
        }
        match self.terms.entry(monomial) {
            Entry::Vacant(slot) => {
                slot.insert(coeff);
            }
            Entry::Occupied(mut slot) => {
                *slot.get_mut() += coeff;
                if slot.get().is_zero() {
                    slot.remove();
                }
            }
        }
    }

    pub fn remove_term(&mut self, monomial: &Monomial) -> Coefficient {
        self.terms
            .remove(monomial)
            .unwrap_or_else(Coefficient::zero)
    }

    pub fn scale(&self, factor: Coefficient) -> Self {
        if factor.is_zero() {
            return Self::zero(self.nvars);
        }
        Self {
            nvars: self.nvars,
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), *c * factor))
                .filter(|(_, c)| !c.is_zero())
                .collect(),
        }
    }

    /// Largest total degree of a stored term, `None` for the zero polynomial.
    pub fn degree(&self) -> Option<u32> {
        self.terms.keys().map(Monomial::degree).max()
    }

    pub fn min_degree(&self) -> Option<u32> {
        self.terms.keys().map(Monomial::degree).min()
    }

    /// The value of the polynomial if it has no variable terms.
    pub fn as_constant(&self) -> Option<Coefficient> {
        match self.degree() {
            None => Some(Coefficient::zero()),
            Some(0) => Some(self.coefficient(&Monomial::one(self.nvars))),
            Some(_) => None,
        }
    }

    /// The homogeneous part of total degree `degree`.
    pub fn homogeneous_component(&self, degree: u32) -> Self {
        self.filter_terms(|m| m.degree() == degree)
    }

    /// Drops every term of total degree above `max_degree`.
    pub fn truncate(&self, max_degree: u32) -> Self {
        self.filter_terms(|m| m.degree() <= max_degree)
    }

    fn filter_terms(&self, keep: impl Fn(&Monomial) -> bool) -> Self {
        Self {
            nvars: self.nvars,
            terms: self
                .terms
                .iter()
                .filter(|(m, _)| keep(m))
                .map(|(m, c)| (m.clone(), *c))
                .collect(),
        }
    }

    /// Product with every term above `max_degree` discarded.
    pub fn mul_truncated(&self, other: &Polynomial, max_degree: Option<u32>) -> Self {
        debug_assert_eq!(self.nvars, other.nvars);
        let mut out = Self::zero(self.nvars);
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                if let Some(limit) = max_degree {
                    if ma.degree() + mb.degree() > limit {
                        continue;
                    }
                }
                out.add_term(ma.product(mb), *ca * *cb);
            }
        }
        out
    }

    pub fn pow(&self, exponent: u32) -> Self {
        self.pow_truncated(exponent, None)
    }

    fn pow_truncated(&self, exponent: u32, max_degree: Option<u32>) -> Self {
        let mut result = Self::constant(self.nvars, Coefficient::one());
        let mut base = self.clone();
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul_truncated(&base, max_degree);
            }
            e >>= 1;
            if e > 0 {
                base = base.mul_truncated(&base, max_degree);
            }
        }
        result
    }

    /// Exact partial derivative with respect to variable `index`.
    pub fn derivative(&self, index: usize) -> Self {
        let mut out = Self::zero(self.nvars);
        for (monomial, coeff) in &self.terms {
            let power = monomial.0[index];
            if let Some(lowered) = monomial.lower(index) {
                out.add_term(lowered, *coeff * f64::from(power));
            }
        }
        out
    }

    /// Replaces variable `k` by `images[k]` and expands.
    pub fn substitute(&self, images: &[Polynomial]) -> Result<Self> {
        self.substitute_truncated(images, None)
    }

    /// Substitution that discards terms above `max_degree` while expanding.
    pub fn substitute_truncated(
        &self,
        images: &[Polynomial],
        max_degree: Option<u32>,
    ) -> Result<Self> {
        if images.len() != self.nvars {
            return Err(NormalFormError::Shape {
                what: "substitution images",
                expected: self.nvars,
                found: images.len(),
            });
        }
        let target_nvars = images.first().map_or(0, Polynomial::nvars);
        if let Some(bad) = images.iter().find(|p| p.nvars != target_nvars) {
            return Err(NormalFormError::Shape {
                what: "substitution image variable count",
                expected: target_nvars,
                found: bad.nvars,
            });
        }

        // powers[k][e] = images[k]^e, filled on demand
        let mut powers: Vec<Vec<Polynomial>> = images
            .iter()
            .map(|_| vec![Self::constant(target_nvars, Coefficient::one())])
            .collect();
        let mut out = Self::zero(target_nvars);
        for (monomial, coeff) in &self.terms {
            let mut term = Self::constant(target_nvars, *coeff);
            for (k, &e) in monomial.0.iter().enumerate() {
                if e == 0 {
                    continue;
                }
                while powers[k].len() <= e as usize {
                    let next = powers[k]
                        .last()
                        .map(|p| p.mul_truncated(&images[k], max_degree))
                        .unwrap_or_else(|| Self::zero(target_nvars));
                    powers[k].push(next);
                }
                term = term.mul_truncated(&powers[k][e as usize], max_degree);
                if term.is_zero() {
                    break;
                }
            }
            out += &term;
        }
        Ok(out)
    }

    /// Removes coefficients whose real and imaginary parts are below `tolerance`.
    pub fn chop(&self, tolerance: f64) -> Self {
        Self {
            nvars: self.nvars,
            terms: self
                .terms
                .iter()
                .filter_map(|(m, c)| {
                    let re = if c.re.abs() < tolerance { 0.0 } else { c.re };
                    let im = if c.im.abs() < tolerance { 0.0 } else { c.im };
                    let chopped = Coefficient::new(re, im);
                    (!chopped.is_zero()).then(|| (m.clone(), chopped))
                })
                .collect(),
        }
    }

    pub fn approx_eq(&self, other: &Polynomial, tolerance: f64) -> bool {
        if self.nvars != other.nvars {
            return false;
        }
        let difference = self - other;
        difference.terms.values().all(|c| c.norm() <= tolerance)
    }

    pub fn evaluate(&self, point: &[Coefficient]) -> Coefficient {
        self.terms
            .iter()
            .map(|(monomial, coeff)| {
                monomial
                    .0
                    .iter()
                    .zip(point)
                    .fold(*coeff, |acc, (&e, x)| acc * x.powu(e))
            })
            .sum()
    }

    /// Renders the polynomial with the given variable names.
    pub fn display<'a>(&'a self, vars: &'a Variables) -> PolynomialDisplay<'a> {
        PolynomialDisplay { poly: self, vars }
    }
}

pub struct PolynomialDisplay<'a> {
    poly: &'a Polynomial,
    vars: &'a Variables,
}

impl fmt::Display for PolynomialDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.poly.is_zero() {
            return write!(f, "0");
        }
        // highest degree first, then reverse lexicographic
        let mut terms: Vec<_> = self.poly.terms.iter().collect();
        terms.sort_by(|(a, _), (b, _)| b.degree().cmp(&a.degree()).then_with(|| b.cmp(a)));

        for (idx, (monomial, coeff)) in terms.into_iter().enumerate() {
            let (negative, magnitude) = split_sign(*coeff);
            if idx == 0 {
                if negative {
                    write!(f, "-")?;
                }
            } else if negative {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }

            let factors: Vec<String> = monomial
                .0
                .iter()
                .enumerate()
                .filter(|(_, &e)| e > 0)
                .map(|(k, &e)| {
                    let name = self
                        .vars
                        .names
                        .get(k)
                        .cloned()
                        .unwrap_or_else(|| format!("x{k}"));
                    if e == 1 {
                        name
                    } else {
                        format!("{name}^{e}")
                    }
                })
                .collect();

            if factors.is_empty() {
                write!(f, "{}", format_coefficient(magnitude))?;
            } else if magnitude.is_one() {
                write!(f, "{}", factors.join("*"))?;
            } else {
                write!(f, "{}*{}", format_coefficient(magnitude), factors.join("*"))?;
            }
        }
        Ok(())
    }
}

/// Pulls a leading minus sign out of real or purely imaginary coefficients.
fn split_sign(c: Coefficient) -> (bool, Coefficient) {
    if (c.im == 0.0 && c.re < 0.0) || (c.re == 0.0 && c.im < 0.0) {
        (true, -c)
    } else {
        (false, c)
    }
}

fn format_coefficient(c: Coefficient) -> String {
    if c.im == 0.0 {
        format!("{}", c.re)
    } else if c.re == 0.0 {
        if c.im == 1.0 {
            "I".to_string()
        } else {
            format!("{}*I", c.im)
        }
    } else if c.im < 0.0 {
        format!("({} - {}*I)", c.re, -c.im)
    } else {
        format!("({} + {}*I)", c.re, c.im)
    }
}

impl AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, rhs: &Polynomial) {
        debug_assert_eq!(self.nvars, rhs.nvars);
        for (m, c) in &rhs.terms {
            self.add_term(m.clone(), *c);
        }
    }
}

impl SubAssign<&Polynomial> for Polynomial {
    fn sub_assign(&mut self, rhs: &Polynomial) {
        debug_assert_eq!(self.nvars, rhs.nvars);
        for (m, c) in &rhs.terms {
            self.add_term(m.clone(), -*c);
        }
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: &Polynomial) -> Polynomial {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: &Polynomial) -> Polynomial {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: &Polynomial) -> Polynomial {
        self.mul_truncated(rhs, None)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;
    fn neg(self) -> Polynomial {
        Polynomial {
            nvars: self.nvars,
            terms: self.terms.iter().map(|(m, c)| (m.clone(), -*c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64) -> Coefficient {
        Coefficient::new(re, 0.0)
    }

    fn xy() -> (Polynomial, Polynomial) {
        (Polynomial::variable(2, 0), Polynomial::variable(2, 1))
    }

    #[test]
    fn cancelling_terms_are_dropped() {
        let (x, _) = xy();
        let diff = &x - &x;
        assert!(diff.is_zero());
        assert_eq!(diff, Polynomial::zero(2));
    }

    #[test]
    fn product_expands_binomial_square() {
        let (x, y) = xy();
        let sum = &x + &y;
        let square = &sum * &sum;
        assert_eq!(square.len(), 3);
        assert_eq!(square.coefficient(&Monomial::new(vec![1, 1])), c(2.0));
        assert_eq!(square, sum.pow(2));
    }

    #[test]
    fn derivative_lowers_exponent_and_scales() {
        let (x, y) = xy();
        let poly = &(&x.pow(3) * &y) + &y;
        let dx = poly.derivative(0);
        assert_eq!(dx, (&x.pow(2) * &y).scale(c(3.0)));
        let dy = poly.derivative(1);
        assert_eq!(dy, &x.pow(3) + &Polynomial::constant(2, c(1.0)));
    }

    #[test]
    fn homogeneous_component_and_truncation_split_by_degree() {
        let (x, y) = xy();
        let poly = &(&(&x + &(&x * &y)) + &y.pow(3)) + &Polynomial::constant(2, c(4.0));
        assert_eq!(poly.homogeneous_component(2), &x * &y);
        assert_eq!(poly.homogeneous_component(0).as_constant(), Some(c(4.0)));
        assert_eq!(poly.truncate(2).degree(), Some(2));
        assert_eq!(poly.min_degree(), Some(0));
    }

    #[test]
    fn substitution_composes_polynomials() {
        let (x, y) = xy();
        // p(x, y) = x*y, substitute x -> x + y, y -> x - y
        let poly = &x * &y;
        let images = vec![&x + &y, &x - &y];
        let composed = poly.substitute(&images).expect("substitution");
        assert_eq!(composed, &x.pow(2) - &y.pow(2));
    }

    #[test]
    fn truncated_substitution_discards_high_degrees() {
        let (x, y) = xy();
        let poly = x.pow(2);
        let images = vec![&x + &y.pow(2), y.clone()];
        let composed = poly
            .substitute_truncated(&images, Some(3))
            .expect("substitution");
        assert_eq!(composed, &x.pow(2) + &(&x * &y.pow(2)).scale(c(2.0)));
    }

    #[test]
    fn substitution_rejects_wrong_image_count() {
        let (x, _) = xy();
        let err = x
            .substitute(&[Polynomial::variable(1, 0)])
            .expect_err("wrong image count");
        assert!(matches!(err, NormalFormError::Shape { expected: 2, found: 1, .. }));
    }

    #[test]
    fn chop_removes_round_off() {
        let (x, y) = xy();
        let poly = &x + &y.scale(Coefficient::new(1e-15, 2.0));
        let chopped = poly.chop(1e-12);
        assert_eq!(chopped, &x + &y.scale(Coefficient::new(0.0, 2.0)));
    }

    #[test]
    fn evaluate_matches_hand_computation() {
        let (x, y) = xy();
        let poly = &(&x.pow(2) * &y) - &y;
        let value = poly.evaluate(&[c(2.0), c(3.0)]);
        assert!((value - c(9.0)).norm() < 1e-12);
    }

    #[test]
    fn display_renders_signs_and_powers() {
        let vars = Variables::new(["x", "y"]).expect("vars");
        let (x, y) = xy();
        let poly = &(&x.pow(2) * &y) - &y.scale(c(2.0));
        assert_eq!(poly.display(&vars).to_string(), "x^2*y - 2*y");
        let imaginary = x.scale(Coefficient::new(0.0, -0.25));
        assert_eq!(imaginary.display(&vars).to_string(), "-0.25*I*x");
    }

    #[test]
    fn variables_reject_duplicates() {
        let err = Variables::new(["x", "y", "x"]).expect_err("duplicate");
        assert_eq!(err, NormalFormError::DuplicateVariable("x".to_string()));
    }
}
