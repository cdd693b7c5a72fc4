//! Graded recursion tables shared by the normal-form loop and the action operators.
//!
//! A table entry `F[i,m]` is homogeneous; entries are filled one anti-diagonal
//! `i + m = n` at a time, in ascending `i`, so every entry only reads entries
//! that are already present.

use crate::bracket::bracket;
use crate::frechet::directional_derivative;
use crate::vector_field::VectorField;
use std::collections::HashMap;
use tracing::trace;

pub(crate) fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

pub(crate) fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, j| acc * (n - j) as f64 / (j + 1) as f64)
}

/// Contraction of a generator term `W` with a table entry `G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LieOperator {
    /// `[W, G]`, for vector fields.
    Bracket,
    /// `−DG·W`, for tuples of scalar functions.
    NegatedDerivative,
}

impl LieOperator {
    fn apply(self, w: &VectorField, g: &VectorField) -> VectorField {
        match self {
            LieOperator::Bracket => bracket(w, g),
            LieOperator::NegatedDerivative => -&directional_derivative(g, w),
        }
    }
}

/// Memo table `F[i,m]`, owned by a single call.
#[derive(Debug, Default)]
pub(crate) struct GradedTable {
    entries: HashMap<(usize, usize), VectorField>,
}

impl GradedTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, i: usize, m: usize) -> &VectorField {
        &self.entries[&(i, m)]
    }

    pub(crate) fn insert(&mut self, i: usize, m: usize, entry: VectorField) {
        self.entries.insert((i, m), entry);
    }

    pub(crate) fn get_mut(&mut self, i: usize, m: usize) -> Option<&mut VectorField> {
        self.entries.get_mut(&(i, m))
    }
}

/// `F[i,m] = F[i-1,m+1] + Σ_{j<i} C(i-1,j)·op(W_j, F[i-j-1,m])` for `i > 0`.
pub(crate) fn recurrence_entry(
    table: &GradedTable,
    operator: LieOperator,
    generators: &[VectorField],
    i: usize,
    m: usize,
) -> VectorField {
    debug_assert!(i > 0);
    let mut entry = table.get(i - 1, m + 1).clone();
    for (j, w) in generators.iter().enumerate().take(i) {
        let previous = table.get(i - j - 1, m);
        if w.is_zero() || previous.is_zero() {
            continue;
        }
        entry += &operator.apply(w, previous).scale_real(binomial(i - 1, j));
    }
    entry
}

/// Splits a tuple by total degree into `m!·(degree m + offset part)` for `m ≤ top`.
pub(crate) fn graded_seeds(subject: &VectorField, offset: u32, top: usize) -> Vec<VectorField> {
    (0..=top)
        .map(|m| {
            subject
                .homogeneous_component(m as u32 + offset)
                .scale_real(factorial(m))
        })
        .collect()
}

/// A Lie transform driven by the family `W_j = j!·(degree j+2 part of U)`.
#[derive(Debug, Clone)]
pub(crate) struct LieTriangle {
    operator: LieOperator,
    generators: Vec<VectorField>,
}

impl LieTriangle {
    pub(crate) fn from_generator(operator: LieOperator, generator: &VectorField, order: usize) -> Self {
        let generators = graded_seeds(generator, 2, order.saturating_sub(1));
        Self {
            operator,
            generators,
        }
    }

    /// `Σ_{i≤order} F[i,0]/i!` with `F[0,m] = m!·(degree m part of subject)`.
    pub(crate) fn transform(&self, subject: &VectorField, order: usize) -> VectorField {
        let mut table = GradedTable::new();
        for (m, seed) in graded_seeds(subject, 0, order).into_iter().enumerate() {
            table.insert(0, m, seed);
        }
        for n in 1..=order {
            self.fill_antidiagonal(&mut table, n);
        }
        (0..=order).fold(VectorField::zeros(subject.len(), subject.nvars()), |mut acc, i| {
            acc += &table.get(i, 0).scale_real(1.0 / factorial(i));
            acc
        })
    }

    /// Finds the subject whose [`transform`](Self::transform) is `target` up to degree `order`.
    pub(crate) fn invert(&self, target: &VectorField, order: usize) -> VectorField {
        let zero = VectorField::zeros(target.len(), target.nvars());
        let mut table = GradedTable::new();
        let mut subject = zero.clone();
        for n in 0..=order {
            table.insert(0, n, zero.clone());
            self.fill_antidiagonal(&mut table, n);
            let wanted = target.homogeneous_component(n as u32).scale_real(factorial(n));
            let correction = &wanted - table.get(n, 0);
            // every entry on the anti-diagonal depends on F[0,n] with unit weight
            for k in 0..=n {
                if let Some(entry) = table.get_mut(k, n - k) {
                    *entry += &correction;
                }
            }
            subject += &correction.scale_real(1.0 / factorial(n));
        }
        subject
    }

    fn fill_antidiagonal(&self, table: &mut GradedTable, n: usize) {
        for k in 1..=n {
            let entry = recurrence_entry(table, self.operator, &self.generators, k, n - k);
            table.insert(k, n - k, entry);
        }
        trace!(antidiagonal = n, "filled Lie triangle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse_vector_field;
    use crate::polynomial::Variables;

    #[test]
    fn binomials_and_factorials() {
        assert_eq!(factorial(0), 1.0);
        assert_eq!(factorial(5), 120.0);
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(6, 0), 1.0);
        assert_eq!(binomial(3, 4), 0.0);
    }

    #[test]
    fn zero_generator_transform_is_truncation() {
        let vars = Variables::new(["x", "y"]).expect("vars");
        let subject = parse_vector_field(&["1 + x + x^2*y^3", "y^2"], &vars).expect("subject");
        let zero = VectorField::zeros(2, 2);
        let triangle = LieTriangle::from_generator(LieOperator::Bracket, &zero, 3);
        assert_eq!(triangle.transform(&subject, 3), subject.truncate(3));
        assert_eq!(triangle.invert(&subject, 3), subject.truncate(3));
    }

    #[test]
    fn invert_undoes_transform() {
        let vars = Variables::new(["x", "y"]).expect("vars");
        let generator = parse_vector_field(&["x*y + 0.5*y^3", "x^2 - x*y^2"], &vars).expect("generator");
        let subject = parse_vector_field(&["x - y + x^3", "2*y + x*y"], &vars).expect("subject");
        for operator in [LieOperator::Bracket, LieOperator::NegatedDerivative] {
            let triangle = LieTriangle::from_generator(operator, &generator, 4);
            let image = triangle.transform(&subject, 4);
            let back = triangle.invert(&image, 4);
            assert!(back.approx_eq(&subject.truncate(4), 1e-10), "{operator:?}");
        }
    }

    #[test]
    fn negated_derivative_first_order_term() {
        let vars = Variables::new(["x"]).expect("vars");
        let generator = parse_vector_field(&["x^2"], &vars).expect("generator");
        let subject = parse_vector_field(&["x"], &vars).expect("subject");
        let triangle = LieTriangle::from_generator(LieOperator::NegatedDerivative, &generator, 2);
        // x ↦ x − x^2 to second order
        let expected = parse_vector_field(&["x - x^2"], &vars).expect("expected");
        assert!(triangle.transform(&subject, 2).approx_eq(&expected, 1e-14));
    }
}
