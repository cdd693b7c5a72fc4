//! Solvers for the homological equation `[AX, Y] + G = F`, one degree at a time.

use crate::bracket::bracket;
use crate::error::{NormalFormError, Result};
use crate::polynomial::{Coefficient, Monomial, Polynomial, Variables};
use crate::resonance::{classify, Resonance};
use crate::traits::{HomologicalSolver, HomologicalSplit, ZeroTest};
use crate::vector_field::{ensure_field_shape, VectorField};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{trace, warn};

/// Which homological solver the normal-form loop uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormStrategy {
    /// Diagonal linear part; components are solved independently.
    #[default]
    Semisimple,
    /// Upper-triangular Jordan linear part with superdiagonal coupling.
    Nilpotent,
}

impl FormStrategy {
    pub fn solver(self) -> &'static dyn HomologicalSolver {
        match self {
            FormStrategy::Semisimple => &SemisimpleSolver,
            FormStrategy::Nilpotent => &NilpotentSolver,
        }
    }
}

impl FromStr for FormStrategy {
    type Err = NormalFormError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semisimple" => Ok(FormStrategy::Semisimple),
            "nilpotent" => Ok(FormStrategy::Nilpotent),
            _ => Err(NormalFormError::UnrecognizedOption {
                option: "form_strategy",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FormStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormStrategy::Semisimple => write!(f, "Semisimple"),
            FormStrategy::Nilpotent => write!(f, "Nilpotent"),
        }
    }
}

/// Per-component division by the divisors; assumes a diagonal linear part.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemisimpleSolver;

impl HomologicalSolver for SemisimpleSolver {
    fn solve(
        &self,
        linear: &VectorField,
        eigenvalues: &[Coefficient],
        forcing: &VectorField,
        degree: usize,
        zero_test: &dyn ZeroTest,
    ) -> Result<HomologicalSplit> {
        ensure_solver_inputs(linear, eigenvalues, forcing)?;
        if has_off_diagonal(linear) {
            warn!(degree, "semisimple solver received a non-diagonal linear part");
        }
        let nvars = forcing.nvars();
        let mut remainder = VectorField::zeros(forcing.len(), nvars);
        let mut generator = VectorField::zeros(forcing.len(), nvars);
        let mut resonant = 0usize;

        for (k, component) in forcing.components().iter().enumerate() {
            for (monomial, &coeff) in component.terms() {
                match classify(k, monomial, eigenvalues, zero_test)? {
                    Resonance::Resonant => {
                        resonant += 1;
                        remainder.component_mut(k).add_term(monomial.clone(), coeff);
                    }
                    Resonance::Eliminable(d) => {
                        generator.component_mut(k).add_term(monomial.clone(), coeff / d);
                    }
                }
            }
        }

        trace!(degree, resonant, "semisimple homological step");
        Ok(HomologicalSplit {
            remainder,
            generator,
        })
    }
}

/// Coupled solver for Jordan linear parts.
///
/// Components are swept from the last to the first. Inside a component the
/// residual term of least weight `Σ j·α_j` is handled first; eliminating it
/// through the bracket with the linear part only creates terms of strictly
/// larger weight in the same component (the coupling is upper triangular)
/// plus terms in lower-index components, which are visited later.
#[derive(Debug, Clone, Copy, Default)]
pub struct NilpotentSolver;

impl HomologicalSolver for NilpotentSolver {
    fn solve(
        &self,
        linear: &VectorField,
        eigenvalues: &[Coefficient],
        forcing: &VectorField,
        degree: usize,
        zero_test: &dyn ZeroTest,
    ) -> Result<HomologicalSplit> {
        ensure_solver_inputs(linear, eigenvalues, forcing)?;
        ensure_upper_triangular(linear)?;
        let n = forcing.len();
        let nvars = forcing.nvars();
        let mut residual = forcing.clone();
        let mut remainder = VectorField::zeros(n, nvars);
        let mut generator = VectorField::zeros(n, nvars);
        let mut resonant = 0usize;
        let mut eliminated = 0usize;

        for k in (0..n).rev() {
            while let Some((monomial, coeff)) = lightest_term(residual.component(k)) {
                match classify(k, &monomial, eigenvalues, zero_test)? {
                    Resonance::Resonant => {
                        resonant += 1;
                        residual.component_mut(k).remove_term(&monomial);
                        remainder.component_mut(k).add_term(monomial, coeff);
                    }
                    Resonance::Eliminable(d) => {
                        eliminated += 1;
                        let scaled = coeff / d;
                        let y = VectorField::single(n, k, Polynomial::from_term(monomial.clone(), scaled));
                        residual -= &bracket(linear, &y);
                        // the diagonal contribution cancels exactly; drop round-off
                        residual.component_mut(k).remove_term(&monomial);
                        generator.component_mut(k).add_term(monomial, scaled);
                    }
                }
            }
        }

        trace!(degree, resonant, eliminated, "nilpotent homological step");
        Ok(HomologicalSplit {
            remainder,
            generator,
        })
    }
}

fn lightest_term(poly: &Polynomial) -> Option<(Monomial, Coefficient)> {
    poly.terms()
        .min_by_key(|(m, _)| weight(m))
        .map(|(m, &c)| (m.clone(), c))
}

fn weight(monomial: &Monomial) -> u64 {
    monomial
        .exponents()
        .iter()
        .enumerate()
        .map(|(j, &e)| j as u64 * u64::from(e))
        .sum()
}

fn has_off_diagonal(linear: &VectorField) -> bool {
    let matrix = linear.linear_part_matrix();
    (0..matrix.nrows()).any(|i| (0..matrix.ncols()).any(|j| i != j && !matrix[(i, j)].is_zero()))
}

fn ensure_upper_triangular(linear: &VectorField) -> Result<()> {
    let matrix = linear.linear_part_matrix();
    for i in 0..matrix.nrows() {
        for j in 0..i.min(matrix.ncols()) {
            if !matrix[(i, j)].is_zero() {
                return Err(NormalFormError::LinearPartNotTriangular);
            }
        }
    }
    Ok(())
}

/// Validated single homological step with the chosen strategy.
///
/// `forcing` must be homogeneous of total degree `degree`; `eigenvalues`
/// supplies one entry per variable.
// Solvers may be called directly, without the checks of the entry point below.
fn ensure_solver_inputs(
    linear: &VectorField,
    eigenvalues: &[Coefficient],
    forcing: &VectorField,
) -> Result<()> {
    let n = forcing.nvars();
    for (what, found) in [
        ("forcing term", forcing.len()),
        ("linear part", linear.len()),
        ("linear part", linear.nvars()),
        ("eigenvalues", eigenvalues.len()),
    ] {
        if found != n {
            return Err(NormalFormError::Shape {
                what,
                expected: n,
                found,
            });
        }
    }
    Ok(())
}

pub fn solve_homological_equation(
    strategy: FormStrategy,
    linear: &VectorField,
    eigenvalues: &[Coefficient],
    forcing: &VectorField,
    vars: &Variables,
    degree: usize,
    zero_test: &dyn ZeroTest,
) -> Result<HomologicalSplit> {
    ensure_field_shape(linear, vars, "linear part")?;
    ensure_field_shape(forcing, vars, "forcing term")?;
    if eigenvalues.len() != vars.len() {
        return Err(NormalFormError::Shape {
            what: "eigenvalues",
            expected: vars.len(),
            found: eigenvalues.len(),
        });
    }
    for component in forcing.components() {
        for (monomial, _) in component.terms() {
            let found = monomial.degree() as usize;
            if found != degree {
                return Err(NormalFormError::Shape {
                    what: "forcing term degree",
                    expected: degree,
                    found,
                });
            }
        }
    }
    strategy
        .solver()
        .solve(linear, eigenvalues, forcing, degree, zero_test)
}
