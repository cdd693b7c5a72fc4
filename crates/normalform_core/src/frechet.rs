//! The Fréchet (Jacobian) operator on polynomial tuples.

use crate::error::Result;
use crate::polynomial::{Polynomial, Variables};
use crate::vector_field::{ensure_function_shape, VectorField};

/// Matrix of exact partial derivatives `J[i][j] = ∂f_i/∂x_j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Jacobian {
    nvars: usize,
    rows: Vec<Vec<Polynomial>>,
}

impl Jacobian {
    pub fn of(functions: &VectorField) -> Self {
        let nvars = functions.nvars();
        let rows = functions
            .components()
            .iter()
            .map(|f| (0..nvars).map(|j| f.derivative(j)).collect())
            .collect();
        Self { nvars, rows }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.nvars
    }

    pub fn entry(&self, row: usize, col: usize) -> &Polynomial {
        &self.rows[row][col]
    }

    /// Matrix-vector product `J·v`.
    pub fn contract(&self, vector: &VectorField) -> VectorField {
        debug_assert_eq!(vector.len(), self.nvars);
        let components = self
            .rows
            .iter()
            .map(|row| {
                let mut sum = Polynomial::zero(vector.nvars());
                for (partial, v) in row.iter().zip(vector.components()) {
                    if !partial.is_zero() && !v.is_zero() {
                        sum += &(partial * v);
                    }
                }
                sum
            })
            .collect();
        VectorField::from_parts(vector.nvars(), components)
    }
}

/// Validated Jacobian of a tuple of functions in `vars`.
pub fn jacobian(functions: &VectorField, vars: &Variables) -> Result<Jacobian> {
    ensure_function_shape(functions, vars, "Jacobian argument")?;
    Ok(Jacobian::of(functions))
}

/// `Df·W`, the derivative of each function in `f` along the field `w`.
pub fn directional_derivative(f: &VectorField, w: &VectorField) -> VectorField {
    Jacobian::of(f).contract(w)
}
