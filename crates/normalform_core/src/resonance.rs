//! Divisors of monomial terms and the resonance decision.

use crate::error::{NormalFormError, Result};
use crate::polynomial::{Coefficient, Monomial};
use crate::traits::ZeroTest;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How divisors are tested against zero.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResonanceTest {
    /// Only an exactly vanishing divisor is resonant.
    #[default]
    Exact,
    /// Divisors with `|d| < epsilon` are resonant.
    Tolerance { epsilon: f64 },
    /// The divisor is mapped through the function and the image compared to zero.
    #[serde(skip)]
    Custom(Arc<dyn Fn(Coefficient) -> Coefficient + Send + Sync>),
}

impl fmt::Debug for ResonanceTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResonanceTest::Exact => write!(f, "Exact"),
            ResonanceTest::Tolerance { epsilon } => {
                f.debug_struct("Tolerance").field("epsilon", epsilon).finish()
            }
            ResonanceTest::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl ZeroTest for ResonanceTest {
    fn is_zero(&self, divisor: Coefficient) -> bool {
        match self {
            ResonanceTest::Exact => divisor.is_zero(),
            ResonanceTest::Tolerance { epsilon } => divisor.norm() < *epsilon,
            ResonanceTest::Custom(map) => map(divisor).is_zero(),
        }
    }
}

/// `target − Σ eigenvalues[j]·exponents[j]`.
pub fn divisor(exponents: &[u32], eigenvalues: &[Coefficient], target: Coefficient) -> Coefficient {
    let weighted: Coefficient = exponents
        .iter()
        .zip(eigenvalues)
        .map(|(&e, &lambda)| lambda * f64::from(e))
        .sum();
    target - weighted
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resonance {
    /// The term stays in the normal form.
    Resonant,
    /// The term is removed by dividing through this divisor.
    Eliminable(Coefficient),
}

/// Classifies the monomial `x^α` sitting in component `component`.
pub fn classify(
    component: usize,
    monomial: &Monomial,
    eigenvalues: &[Coefficient],
    zero_test: &dyn ZeroTest,
) -> Result<Resonance> {
    let nvars = monomial.exponents().len();
    if eigenvalues.len() != nvars {
        return Err(NormalFormError::Shape {
            what: "eigenvalues",
            expected: nvars,
            found: eigenvalues.len(),
        });
    }
    let target = eigenvalues.get(component).copied().ok_or(NormalFormError::Shape {
        what: "component index",
        expected: nvars,
        found: component + 1,
    })?;
    let d = divisor(monomial.exponents(), eigenvalues, target);
    if zero_test.is_zero(d) {
        Ok(Resonance::Resonant)
    } else if d.is_zero() {
        Err(NormalFormError::SingularDivisor {
            component,
            exponents: monomial.exponents().to_vec(),
        })
    } else {
        Ok(Resonance::Eliminable(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hopf_eigenvalues() -> Vec<Coefficient> {
        vec![Coefficient::new(0.0, 1.0), Coefficient::new(0.0, -1.0)]
    }

    #[test]
    fn divisor_matches_hand_computation() {
        let eigs = hopf_eigenvalues();
        let d = divisor(&[3, 0], &eigs, eigs[0]);
        assert_eq!(d, Coefficient::new(0.0, -2.0));
    }

    #[test]
    fn hopf_resonance_is_exponent_difference_one() {
        let eigs = hopf_eigenvalues();
        let test = ResonanceTest::Exact;
        let resonant = classify(0, &Monomial::new(vec![2, 1]), &eigs, &test).expect("classify");
        assert_eq!(resonant, Resonance::Resonant);
        let eliminable = classify(0, &Monomial::new(vec![1, 2]), &eigs, &test).expect("classify");
        assert_eq!(eliminable, Resonance::Eliminable(Coefficient::new(0.0, 2.0)));
    }

    #[test]
    fn tolerance_test_absorbs_near_resonance() {
        let eigs = vec![Coefficient::new(1.0, 0.0), Coefficient::new(2.0 + 1e-12, 0.0)];
        let monomial = Monomial::new(vec![2, 0]);
        let exact = classify(1, &monomial, &eigs, &ResonanceTest::Exact).expect("classify");
        assert!(matches!(exact, Resonance::Eliminable(_)));
        let loose = ResonanceTest::Tolerance { epsilon: 1e-9 };
        assert_eq!(classify(1, &monomial, &eigs, &loose).expect("classify"), Resonance::Resonant);
    }

    #[test]
    fn zero_divisor_classified_non_resonant_is_an_error() {
        let eigs = vec![Coefficient::new(1.0, 0.0), Coefficient::new(2.0, 0.0)];
        let never_zero = ResonanceTest::Custom(Arc::new(|_| Coefficient::new(1.0, 0.0)));
        let err = classify(1, &Monomial::new(vec![2, 0]), &eigs, &never_zero).expect_err("singular");
        assert_eq!(
            err,
            NormalFormError::SingularDivisor {
                component: 1,
                exponents: vec![2, 0]
            }
        );
    }

    #[test]
    fn eigenvalue_count_must_match_the_monomial() {
        let monomial = Monomial::new(vec![1, 1]);
        let short = [Coefficient::new(0.0, 1.0)];
        let err = classify(0, &monomial, &short, &ResonanceTest::Exact).expect_err("short");
        assert!(matches!(err, NormalFormError::Shape { what: "eigenvalues", .. }));
        let err = classify(2, &monomial, &hopf_eigenvalues(), &ResonanceTest::Exact).expect_err("index");
        assert!(matches!(err, NormalFormError::Shape { what: "component index", .. }));
    }

    #[test]
    fn closures_act_as_zero_tests() {
        let eigs = vec![Coefficient::new(1.0, 0.0)];
        let always = |_: Coefficient| true;
        let result = classify(0, &Monomial::new(vec![3]), &eigs, &always).expect("classify");
        assert_eq!(result, Resonance::Resonant);
    }
}
