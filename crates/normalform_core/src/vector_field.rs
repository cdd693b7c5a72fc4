//! Tuples of polynomials: vector fields, maps and function tuples.

use crate::error::{NormalFormError, Result};
use crate::polynomial::{Coefficient, Monomial, Polynomial, Variables};
use nalgebra::DMatrix;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// An ordered tuple of polynomials written in the same `nvars` variables.
///
/// When `len() == nvars()` the tuple is a vector field (or a map of the
/// coordinate space into itself); otherwise it is just a tuple of scalar
/// functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VectorFieldRepr")]
pub struct VectorField {
    nvars: usize,
    components: Vec<Polynomial>,
}

#[derive(Deserialize)]
struct VectorFieldRepr {
    nvars: usize,
    components: Vec<Polynomial>,
}

impl TryFrom<VectorFieldRepr> for VectorField {
    type Error = NormalFormError;

    fn try_from(repr: VectorFieldRepr) -> Result<Self> {
        VectorField::new(repr.nvars, repr.components)
    }
}

impl VectorField {
    pub fn new(nvars: usize, components: Vec<Polynomial>) -> Result<Self> {
        if let Some(bad) = components.iter().find(|p| p.nvars() != nvars) {
            return Err(NormalFormError::Shape {
                what: "component variable count",
                expected: nvars,
                found: bad.nvars(),
            });
        }
        Ok(Self { nvars, components })
    }

    /// Caller guarantees every component is written in `nvars` variables.
    pub(crate) fn from_parts(nvars: usize, components: Vec<Polynomial>) -> Self {
        debug_assert!(components.iter().all(|p| p.nvars() == nvars));
        Self { nvars, components }
    }

    pub fn zeros(len: usize, nvars: usize) -> Self {
        Self {
            nvars,
            components: vec![Polynomial::zero(nvars); len],
        }
    }

    /// The identity map `x ↦ x`.
    pub fn identity(nvars: usize) -> Self {
        Self {
            nvars,
            components: (0..nvars).map(|k| Polynomial::variable(nvars, k)).collect(),
        }
    }

    /// The linear field `x ↦ M·x`.
    pub fn from_matrix(matrix: &DMatrix<Coefficient>) -> Self {
        let nvars = matrix.ncols();
        let components = (0..matrix.nrows())
            .map(|i| {
                let mut row = Polynomial::zero(nvars);
                for j in 0..nvars {
                    row += &Polynomial::variable(nvars, j).scale(matrix[(i, j)]);
                }
                row
            })
            .collect();
        Self { nvars, components }
    }

    /// A tuple of length `len` whose only non-zero entry is `poly` at `index`.
    pub fn single(len: usize, index: usize, poly: Polynomial) -> Self {
        let mut field = Self::zeros(len, poly.nvars());
        field.components[index] = poly;
        field
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn components(&self) -> &[Polynomial] {
        &self.components
    }

    pub fn component(&self, index: usize) -> &Polynomial {
        &self.components[index]
    }

    pub(crate) fn component_mut(&mut self, index: usize) -> &mut Polynomial {
        &mut self.components[index]
    }

    pub fn into_components(self) -> Vec<Polynomial> {
        self.components
    }

    pub fn is_zero(&self) -> bool {
        self.components.iter().all(Polynomial::is_zero)
    }

    pub fn scale(&self, factor: Coefficient) -> Self {
        self.map(|p| p.scale(factor))
    }

    pub fn scale_real(&self, factor: f64) -> Self {
        self.scale(Coefficient::from(factor))
    }

    /// Degree-`degree` homogeneous part of every component.
    pub fn homogeneous_component(&self, degree: u32) -> Self {
        self.map(|p| p.homogeneous_component(degree))
    }

    pub fn truncate(&self, max_degree: u32) -> Self {
        self.map(|p| p.truncate(max_degree))
    }

    /// Largest total degree over all components.
    pub fn degree(&self) -> Option<u32> {
        self.components.iter().filter_map(Polynomial::degree).max()
    }

    pub fn chop(&self, tolerance: f64) -> Self {
        self.map(|p| p.chop(tolerance))
    }

    pub fn approx_eq(&self, other: &VectorField, tolerance: f64) -> bool {
        self.nvars == other.nvars
            && self.len() == other.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }

    /// Coefficient matrix of the degree-one part: `M[i][j]` multiplies `x_j` in component `i`.
    pub fn linear_part_matrix(&self) -> DMatrix<Coefficient> {
        DMatrix::from_fn(self.len(), self.nvars, |i, j| {
            self.components[i].coefficient(&Monomial::variable(self.nvars, j))
        })
    }

    /// The tuple `M·F`, mixing components with a constant matrix.
    pub fn apply_matrix(&self, matrix: &DMatrix<Coefficient>) -> Self {
        debug_assert_eq!(matrix.ncols(), self.len());
        let components = (0..matrix.nrows())
            .map(|i| {
                let mut row = Polynomial::zero(self.nvars);
                for (j, component) in self.components.iter().enumerate() {
                    let factor = matrix[(i, j)];
                    if !factor.is_zero() {
                        row += &component.scale(factor);
                    }
                }
                row
            })
            .collect();
        Self {
            nvars: self.nvars,
            components,
        }
    }

    /// Composition `F ∘ g`: variable `k` of every component is replaced by `images[k]`.
    pub fn substitute(&self, images: &VectorField) -> Result<Self> {
        self.substitute_truncated(images, None)
    }

    pub fn substitute_truncated(&self, images: &VectorField, max_degree: Option<u32>) -> Result<Self> {
        let components = self
            .components
            .iter()
            .map(|p| p.substitute_truncated(&images.components, max_degree))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            nvars: images.nvars,
            components,
        })
    }

    /// Renders every component with the given variable names.
    pub fn render(&self, vars: &Variables) -> Vec<String> {
        self.components
            .iter()
            .map(|p| p.display(vars).to_string())
            .collect()
    }

    fn map(&self, f: impl Fn(&Polynomial) -> Polynomial) -> Self {
        Self {
            nvars: self.nvars,
            components: self.components.iter().map(f).collect(),
        }
    }
}

/// Fails with a shape error unless `field` is an n-tuple in the n variables of `vars`.
pub fn ensure_field_shape(field: &VectorField, vars: &Variables, what: &'static str) -> Result<()> {
    if field.len() != vars.len() {
        return Err(NormalFormError::Shape {
            what,
            expected: vars.len(),
            found: field.len(),
        });
    }
    ensure_function_shape(field, vars, what)
}

/// Like [`ensure_field_shape`] but allows tuples of any length.
pub fn ensure_function_shape(
    functions: &VectorField,
    vars: &Variables,
    what: &'static str,
) -> Result<()> {
    if functions.nvars() != vars.len() {
        return Err(NormalFormError::Shape {
            what,
            expected: vars.len(),
            found: functions.nvars(),
        });
    }
    Ok(())
}

/// Diagonal of the linear part, the eigen-data of a field in Jordan form.
pub fn diagonal_eigenvalues(field: &VectorField) -> Vec<Coefficient> {
    let matrix = field.linear_part_matrix();
    (0..field.len().min(field.nvars()))
        .map(|k| matrix[(k, k)])
        .collect()
}

/// True when the square matrix is the identity up to `tolerance`.
pub(crate) fn is_identity(matrix: &DMatrix<Coefficient>, tolerance: f64) -> bool {
    matrix.nrows() == matrix.ncols()
        && matrix.iter().enumerate().all(|(idx, value)| {
            let (i, j) = (idx % matrix.nrows(), idx / matrix.nrows());
            let expected = if i == j {
                Coefficient::one()
            } else {
                Coefficient::zero()
            };
            (*value - expected).norm() <= tolerance
        })
}

impl AddAssign<&VectorField> for VectorField {
    fn add_assign(&mut self, rhs: &VectorField) {
        debug_assert_eq!(self.len(), rhs.len());
        for (a, b) in self.components.iter_mut().zip(&rhs.components) {
            *a += b;
        }
    }
}

impl SubAssign<&VectorField> for VectorField {
    fn sub_assign(&mut self, rhs: &VectorField) {
        debug_assert_eq!(self.len(), rhs.len());
        for (a, b) in self.components.iter_mut().zip(&rhs.components) {
            *a -= b;
        }
    }
}

impl Add for &VectorField {
    type Output = VectorField;
    fn add(self, rhs: &VectorField) -> VectorField {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl Sub for &VectorField {
    type Output = VectorField;
    fn sub(self, rhs: &VectorField) -> VectorField {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl Neg for &VectorField {
    type Output = VectorField;
    fn neg(self) -> VectorField {
        self.map(|p| -p)
    }
}
