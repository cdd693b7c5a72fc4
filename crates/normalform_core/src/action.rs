//! Lie-series actions of a generator, its inverse problem, and the exponential map.
//!
//! A generator `U` is read as the family `W_j = j!·(degree j+2 part of U)`.
//! The adjoint actions transport vector fields along the time-one flow `φ`
//! of that family; the plain actions compose tuples of scalar functions with
//! `φ` or `φ⁻¹`.

use crate::error::{NormalFormError, Result};
use crate::frechet::directional_derivative;
use crate::polynomial::{Coefficient, Variables};
use crate::triangle::{binomial, factorial, graded_seeds, GradedTable, LieOperator, LieTriangle};
use crate::vector_field::{ensure_field_shape, ensure_function_shape, is_identity, VectorField};
use tracing::debug;

const NEAR_IDENTITY_TOLERANCE: f64 = 1e-9;

/// Pushes the field `x` forward along the flow of `generator`, to degree `order`.
pub fn forward_adjoint_action(
    x: &VectorField,
    generator: &VectorField,
    vars: &Variables,
    order: usize,
) -> Result<VectorField> {
    ensure_field_shape(x, vars, "adjoint action field")?;
    ensure_generator(generator, vars)?;
    debug!(order, "forward adjoint action");
    Ok(LieTriangle::from_generator(LieOperator::Bracket, generator, order).transform(x, order))
}

/// Inverse of [`forward_adjoint_action`]: pulls `x` back along the same flow.
pub fn backward_adjoint_action(
    x: &VectorField,
    generator: &VectorField,
    vars: &Variables,
    order: usize,
) -> Result<VectorField> {
    ensure_field_shape(x, vars, "adjoint action field")?;
    ensure_generator(generator, vars)?;
    debug!(order, "backward adjoint action");
    Ok(LieTriangle::from_generator(LieOperator::Bracket, generator, order).invert(x, order))
}

/// `f ∘ φ`, truncated to degree `order`. `functions` may have any length.
///
/// With `functions` the identity this is the near-identity change of
/// coordinates `u` for which `Du·X = Y∘u` when `(Y, generator)` is a normal
/// form of `X`.
pub fn forward_action(
    functions: &VectorField,
    generator: &VectorField,
    vars: &Variables,
    order: usize,
) -> Result<VectorField> {
    ensure_function_shape(functions, vars, "action subject")?;
    ensure_generator(generator, vars)?;
    debug!(order, len = functions.len(), "forward action");
    Ok(LieTriangle::from_generator(LieOperator::NegatedDerivative, generator, order).invert(functions, order))
}

/// `f ∘ φ⁻¹`, the inverse of [`forward_action`].
pub fn backward_action(
    functions: &VectorField,
    generator: &VectorField,
    vars: &Variables,
    order: usize,
) -> Result<VectorField> {
    ensure_function_shape(functions, vars, "action subject")?;
    ensure_generator(generator, vars)?;
    debug!(order, len = functions.len(), "backward action");
    Ok(LieTriangle::from_generator(LieOperator::NegatedDerivative, generator, order).transform(functions, order))
}

fn ensure_generator(generator: &VectorField, vars: &Variables) -> Result<()> {
    ensure_field_shape(generator, vars, "generator")?;
    let lowest = generator.components().iter().filter_map(|p| p.min_degree()).min();
    match lowest {
        Some(degree) if degree < 2 => Err(NormalFormError::LowDegreeGenerator { degree }),
        _ => Ok(()),
    }
}

/// Recovers the generator of a near-identity map, so that
/// `forward_action(identity, generator(map)) = map` to degree `order`.
///
/// When `map` is `exponential(X, 1)` this recovers `X` only for quadratic
/// (homogeneous degree-two) `X`. For higher-degree fields the result is the
/// generator of the Lie triangle, which differs from `X`.
pub fn generator(map: &VectorField, vars: &Variables, order: usize) -> Result<VectorField> {
    ensure_field_shape(map, vars, "near-identity map")?;
    ensure_near_identity(map)?;
    debug!(order, "generator of near-identity map");

    let n = map.len();
    let mut result = VectorField::zeros(n, map.nvars());
    if order < 2 {
        return Ok(result);
    }
    let top = order - 2;

    // Y[0,k] = (k+1)!·(degree k+2 part)
    let mut table = GradedTable::new();
    for (k, seed) in graded_seeds(map, 2, top).into_iter().enumerate() {
        table.insert(0, k, seed.scale_real((k + 1) as f64));
    }
    for diagonal in 1..=top {
        for i in 1..=diagonal {
            let k = diagonal - i;
            let mut entry = table.get(i - 1, k + 1).clone();
            for j in 0..i {
                let direction = table.get(i - j - 1, 0);
                let term = table.get(j, k);
                if direction.is_zero() || term.is_zero() {
                    continue;
                }
                entry -= &directional_derivative(term, direction).scale_real(binomial(i - 1, j));
            }
            table.insert(i, k, entry);
        }
    }
    for i in 0..=top {
        result += &table.get(i, 0).scale_real(1.0 / factorial(i));
    }
    Ok(result)
}

fn ensure_near_identity(map: &VectorField) -> Result<()> {
    if !is_identity(&map.linear_part_matrix(), NEAR_IDENTITY_TOLERANCE) {
        return Err(NormalFormError::NotNearIdentity(
            "linear part is not the identity".to_string(),
        ));
    }
    let constant = map.homogeneous_component(0);
    if !constant.approx_eq(&VectorField::zeros(map.len(), map.nvars()), NEAR_IDENTITY_TOLERANCE) {
        return Err(NormalFormError::NotNearIdentity(
            "map has a constant term".to_string(),
        ));
    }
    Ok(())
}

/// The time-`t` flow map of `field` as a Lie series `Σ_{k≤order} t^k/k!·L^k(id)`,
/// with `L g = Dg·field`, truncated to total degree `order`.
///
/// [`generator`] is a left inverse of this map at `t = 1` only when `field`
/// is quadratic. `order` must be at least 1.
pub fn exponential(
    field: &VectorField,
    vars: &Variables,
    t: Coefficient,
    order: usize,
) -> Result<VectorField> {
    ensure_field_shape(field, vars, "exponential field")?;
    if order == 0 {
        return Err(NormalFormError::InvalidOrder { order, minimum: 1 });
    }
    debug!(order, "exponential map");
    let degree_cap = order as u32;
    // without constant terms L never lowers degree, so intermediate truncation is exact
    let truncate_terms = field.homogeneous_component(0).is_zero();

    let mut term = VectorField::identity(field.len());
    let mut result = term.truncate(degree_cap);
    let mut weight = Coefficient::from(1.0);
    for k in 1..=order {
        term = directional_derivative(&term, field);
        if truncate_terms {
            term = term.truncate(degree_cap);
        }
        weight = weight * t / k as f64;
        result += &term.truncate(degree_cap).scale(weight);
    }
    Ok(result)
}
