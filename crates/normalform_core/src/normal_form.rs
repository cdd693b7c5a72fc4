//! The normal-form loop: one homological solve per degree, driven by the graded table.

use crate::bracket::bracket;
use crate::error::{NormalFormError, Result};
use crate::homological::FormStrategy;
use crate::polynomial::{Coefficient, Variables};
use crate::resonance::ResonanceTest;
use crate::traits::ZeroTest;
use crate::triangle::{binomial, factorial, graded_seeds, recurrence_entry, GradedTable, LieOperator};
use crate::vector_field::{diagonal_eigenvalues, ensure_field_shape, VectorField};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Options for [`normal_form`]. Passed explicitly into every call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalFormOptions {
    pub resonance_test: ResonanceTest,
    pub form_strategy: FormStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalFormResult {
    /// `Σ_{i<order} F[i,0]/i!`.
    pub normal_form: VectorField,
    /// `Σ_{i≤order-2} Y_i/i!`.
    pub generator: VectorField,
    /// Diagonal of the linear part.
    pub eigenvalues: Vec<Coefficient>,
    /// The homogeneous generator terms `Y_i` (degree `i + 2`).
    pub generator_family: Vec<VectorField>,
    /// The homogeneous normalized terms `F[i,0]` (degree `i + 1`).
    pub components: Vec<VectorField>,
}

/// Normal form of `field` up to total degree `order`.
///
/// The linear part must already be in Jordan form; [`crate::jordan::jordan`]
/// produces such coordinates.
pub fn normal_form(
    field: &VectorField,
    vars: &Variables,
    order: usize,
    options: &NormalFormOptions,
) -> Result<NormalFormResult> {
    normal_form_with_test(field, vars, order, options.form_strategy, &options.resonance_test)
}

/// [`normal_form`] with an arbitrary zero test, e.g. a closure.
pub fn normal_form_with_test(
    field: &VectorField,
    vars: &Variables,
    order: usize,
    strategy: FormStrategy,
    zero_test: &dyn ZeroTest,
) -> Result<NormalFormResult> {
    ensure_field_shape(field, vars, "normal form input")?;
    if order < 1 {
        return Err(NormalFormError::InvalidOrder { order, minimum: 1 });
    }
    debug!(order, dim = vars.len(), %strategy, "computing normal form");
    if !field.homogeneous_component(0).is_zero() {
        warn!("constant terms are ignored by the normal form");
    }

    let solver = strategy.solver();
    let linear = field.homogeneous_component(1);
    let eigenvalues = diagonal_eigenvalues(&linear);

    let mut table = GradedTable::new();
    for (m, seed) in graded_seeds(field, 1, order - 1).into_iter().enumerate() {
        table.insert(0, m, seed);
    }

    let mut generators: Vec<VectorField> = Vec::with_capacity(order.saturating_sub(1));
    for i in 0..order.saturating_sub(1) {
        for k in 1..=i {
            let entry = recurrence_entry(&table, LieOperator::Bracket, &generators, k, i + 1 - k);
            table.insert(k, i + 1 - k, entry);
        }

        let mut forcing = table.get(i, 1).clone();
        for (j, y) in generators.iter().enumerate() {
            let previous = table.get(i - j, 0);
            if y.is_zero() || previous.is_zero() {
                continue;
            }
            forcing += &bracket(y, previous).scale_real(binomial(i, j));
        }

        let split = solver.solve(&linear, &eigenvalues, &forcing, i + 2, zero_test)?;
        table.insert(i + 1, 0, split.remainder);
        generators.push(split.generator);
    }

    let components: Vec<VectorField> = (0..order).map(|i| table.get(i, 0).clone()).collect();
    let normal_form = weighted_sum(&components, field);
    let generator = weighted_sum(&generators, field);

    Ok(NormalFormResult {
        normal_form,
        generator,
        eigenvalues,
        generator_family: generators,
        components,
    })
}

/// `Σ terms[i]/i!`.
fn weighted_sum(terms: &[VectorField], like: &VectorField) -> VectorField {
    terms.iter().enumerate().fold(
        VectorField::zeros(like.len(), like.nvars()),
        |mut acc, (i, term)| {
            acc += &term.scale_real(1.0 / factorial(i));
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{forward_action, forward_adjoint_action};
    use crate::expression::parse_vector_field;
    use crate::frechet::directional_derivative;
    use std::sync::Arc;

    fn zw() -> Variables {
        Variables::new(["z", "w"]).expect("vars")
    }

    fn xy() -> Variables {
        Variables::new(["x", "y"]).expect("vars")
    }

    fn hopf() -> VectorField {
        parse_vector_field(
            &[
                "I*z - 0.25*I*z^3 + 0.25*I*z*w^2",
                "-I*w + 0.25*I*w^3 - 0.25*I*w*z^2",
            ],
            &zw(),
        )
        .expect("hopf field")
    }

    #[test]
    fn hopf_normal_form_removes_non_resonant_cubics() {
        let result = normal_form(&hopf(), &zw(), 3, &NormalFormOptions::default()).expect("normal form");
        let expected = parse_vector_field(&["I*z", "-I*w"], &zw()).expect("expected");
        assert!(result.normal_form.approx_eq(&expected, 1e-14));
        let generator =
            parse_vector_field(&["0.25*z^3 + 0.25*z*w^2", "0.25*w^3 + 0.25*z^2*w"], &zw()).expect("generator");
        assert!(result.generator.approx_eq(&generator, 1e-14));
        assert_eq!(
            result.eigenvalues,
            vec![Coefficient::new(0.0, 1.0), Coefficient::new(0.0, -1.0)]
        );
        assert_eq!(result.generator_family.len(), 2);
        assert!(result.generator_family[0].is_zero());
    }

    #[test]
    fn resonant_quadratic_survives_every_order() {
        let field = parse_vector_field(&["x + y^2", "2*y + x^2"], &xy()).expect("field");
        let expected = parse_vector_field(&["x", "2*y + x^2"], &xy()).expect("expected");
        for order in 2..=4 {
            let result = normal_form(&field, &xy(), order, &NormalFormOptions::default()).expect("normal form");
            assert!(result.normal_form.approx_eq(&expected, 1e-12), "order {order}");
            assert_eq!(result.components.len(), order);
        }
    }

    #[test]
    fn normal_form_is_idempotent() {
        let field = parse_vector_field(&["x + y^2 + x^3", "2*y + x^2 + x*y^2"], &xy()).expect("field");
        let options = NormalFormOptions::default();
        let first = normal_form(&field, &xy(), 4, &options).expect("first");
        let second = normal_form(&first.normal_form, &xy(), 4, &options).expect("second");
        assert!(second.normal_form.approx_eq(&first.normal_form, 1e-10));
        assert!(second.generator.approx_eq(&VectorField::zeros(2, 2), 1e-10));
    }

    #[test]
    fn nilpotent_strategy_on_jordan_block() {
        let field = parse_vector_field(&["x + y + x^2 + y^2", "y + x*y"], &xy()).expect("field");
        let options = NormalFormOptions {
            form_strategy: FormStrategy::Nilpotent,
            ..NormalFormOptions::default()
        };
        let result = normal_form(&field, &xy(), 3, &options).expect("normal form");
        let linear = parse_vector_field(&["x + y", "y"], &xy()).expect("linear");
        assert!(result.normal_form.approx_eq(&linear, 1e-10));
    }

    #[test]
    fn nilpotent_linear_part_keeps_everything() {
        let field = parse_vector_field(&["y", "x^2"], &xy()).expect("field");
        let options = NormalFormOptions {
            form_strategy: FormStrategy::Nilpotent,
            ..NormalFormOptions::default()
        };
        let result = normal_form(&field, &xy(), 3, &options).expect("normal form");
        assert_eq!(result.normal_form, field);
        assert!(result.generator.is_zero());
    }

    #[test]
    fn strategies_agree_on_diagonal_fields() {
        let field = parse_vector_field(&["-x + x*y + y^3", "3*y + x^2 - x^2*y"], &xy()).expect("field");
        let semi = normal_form(&field, &xy(), 4, &NormalFormOptions::default()).expect("semisimple");
        let nil = normal_form(
            &field,
            &xy(),
            4,
            &NormalFormOptions {
                form_strategy: FormStrategy::Nilpotent,
                ..NormalFormOptions::default()
            },
        )
        .expect("nilpotent");
        assert_eq!(semi, nil);
    }

    #[test]
    fn flow_of_generator_conjugates_field_to_normal_form() {
        let field = parse_vector_field(&["x + y^2 + x*y", "-2*y + x^2 + y^3"], &xy()).expect("field");
        let order = 4;
        let result = normal_form(&field, &xy(), order, &NormalFormOptions::default()).expect("normal form");

        // Du·X = Y∘u, up to degree `order`
        let u = forward_action(&VectorField::identity(2), &result.generator, &xy(), order).expect("u");
        let lhs = directional_derivative(&u, &field).truncate(order as u32);
        let rhs = result
            .normal_form
            .substitute_truncated(&u, Some(order as u32))
            .expect("composition");
        assert!(lhs.approx_eq(&rhs, 1e-10));

        let pushed = forward_adjoint_action(&field, &result.generator, &xy(), order).expect("pushforward");
        assert!(pushed.approx_eq(&result.normal_form, 1e-10));
    }

    #[test]
    fn shape_mismatch_computes_nothing() {
        let field = parse_vector_field(&["x"], &xy()).expect("field");
        let err = normal_form(&field, &xy(), 3, &NormalFormOptions::default()).expect_err("shape");
        assert_eq!(
            err,
            NormalFormError::Shape {
                what: "normal form input",
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn order_one_returns_linear_part() {
        let result = normal_form(&hopf(), &zw(), 1, &NormalFormOptions::default()).expect("normal form");
        assert_eq!(result.normal_form, hopf().homogeneous_component(1));
        assert!(result.generator.is_zero());
        assert!(result.generator_family.is_empty());

        let err = normal_form(&hopf(), &zw(), 0, &NormalFormOptions::default()).expect_err("order 0");
        assert_eq!(err, NormalFormError::InvalidOrder { order: 0, minimum: 1 });
    }

    #[test]
    fn zero_divisor_declared_non_resonant_is_reported() {
        let options = NormalFormOptions {
            resonance_test: ResonanceTest::Custom(Arc::new(|_| Coefficient::new(1.0, 0.0))),
            ..NormalFormOptions::default()
        };
        let field = parse_vector_field(&["x + y^2", "2*y + x^2"], &xy()).expect("field");
        let err = normal_form(&field, &xy(), 3, &options).expect_err("singular");
        assert_eq!(
            err,
            NormalFormError::SingularDivisor {
                component: 1,
                exponents: vec![2, 0],
            }
        );
    }

    #[test]
    fn closure_zero_test_keeps_near_resonant_terms() {
        let field = parse_vector_field(&["x + y^2", "2.0000000001*y + x^2"], &xy()).expect("field");
        let loose = |d: Coefficient| d.norm() < 1e-6;
        let result =
            normal_form_with_test(&field, &xy(), 2, FormStrategy::Semisimple, &loose).expect("normal form");
        let expected = parse_vector_field(&["x", "2.0000000001*y + x^2"], &xy()).expect("expected");
        assert!(result.normal_form.approx_eq(&expected, 1e-12));

        let exact = normal_form(&field, &xy(), 2, &NormalFormOptions::default()).expect("exact");
        assert!(exact.normal_form.approx_eq(&field.homogeneous_component(1), 1e-12));
    }
}
