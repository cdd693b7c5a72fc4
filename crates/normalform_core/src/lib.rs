pub mod action;
pub mod bracket;
pub mod error;
pub mod expression;
pub mod frechet;
pub mod homological;
pub mod jordan;
pub mod normal_form;
pub mod polynomial;
pub mod resonance;
mod triangle;
/// The `normalform_core` crate computes Lie-series normal forms of polynomial vector fields.
/// Coefficients are complex (`Complex64`) so that real fields with rotating linear parts
/// can be brought to diagonal form.
///
/// Key components:
/// - **Traits**: `ZeroTest` (resonance decision), `HomologicalSolver` (one degree of the homological equation).
/// - **Polynomials**: sparse `Polynomial`, `VectorField` tuples and an expression parser for them.
/// - **Normal form**: the graded Lie-triangle loop with semisimple and nilpotent solvers.
/// - **Actions**: forward/backward (adjoint) actions of a generator, the generator of a
///   near-identity map, and the exponential map.
/// - **Jordan**: linear reduction of the linear part via `nalgebra`.
pub mod traits;
pub mod vector_field;

pub use error::{NormalFormError, Result};
pub use homological::FormStrategy;
pub use normal_form::{normal_form, NormalFormOptions, NormalFormResult};
pub use polynomial::{Coefficient, Polynomial, Variables};
pub use resonance::ResonanceTest;
pub use vector_field::VectorField;
