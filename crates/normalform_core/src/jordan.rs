//! Linear change of variables that puts the linear part of a field in Jordan form.

use crate::error::{NormalFormError, Result};
use crate::polynomial::{Coefficient, Variables};
use crate::vector_field::{diagonal_eigenvalues, ensure_field_shape, VectorField};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JordanSettings {
    /// Relative threshold for rank decisions and for chopping round-off.
    /// Eigenvalues closer than `sqrt(tolerance)` (relative) are merged.
    pub tolerance: f64,
}

impl Default for JordanSettings {
    fn default() -> Self {
        Self { tolerance: 1e-9 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JordanReduction {
    /// `S⁻¹·X(S·u)` written in the new variables.
    pub field: VectorField,
    /// Diagonal of the reduced linear part.
    pub eigenvalues: Vec<Coefficient>,
    /// The similarity matrix `S`; its columns are (generalized) eigenvectors.
    pub basis: DMatrix<Coefficient>,
    /// Old variables expressed in the new ones, `x = S·u`.
    pub forward: VectorField,
    /// New variables expressed in the old ones, `u = S⁻¹·x`.
    pub inverse: VectorField,
}

/// Rewrites `field` (in `old_vars`) in coordinates `new_vars` where its linear part is in Jordan form.
pub fn jordan(
    field: &VectorField,
    old_vars: &Variables,
    new_vars: &Variables,
    settings: JordanSettings,
) -> Result<JordanReduction> {
    ensure_field_shape(field, old_vars, "Jordan input field")?;
    if new_vars.len() != old_vars.len() {
        return Err(NormalFormError::Shape {
            what: "new variables",
            expected: old_vars.len(),
            found: new_vars.len(),
        });
    }
    if settings.tolerance <= 0.0 {
        return Err(NormalFormError::Jordan("tolerance must be positive".to_string()));
    }

    let linear = field.linear_part_matrix();
    let basis = jordan_basis(&linear, settings.tolerance)?;
    let inverse_basis = basis
        .clone()
        .try_inverse()
        .ok_or_else(|| NormalFormError::Jordan("similarity basis is singular".to_string()))?;

    let forward = VectorField::from_matrix(&basis);
    let inverse = VectorField::from_matrix(&inverse_basis);
    let reduced = field
        .substitute(&forward)?
        .apply_matrix(&inverse_basis)
        .chop(settings.tolerance);
    let eigenvalues = diagonal_eigenvalues(&reduced);
    debug!(dim = field.len(), ?eigenvalues, "Jordan reduction");

    Ok(JordanReduction {
        field: reduced,
        eigenvalues,
        basis,
        forward,
        inverse,
    })
}

/// Similarity matrix `S` with `S⁻¹·A·S` in upper Jordan form.
///
/// Each eigenvalue must be either semisimple or carry a single Jordan chain.
pub fn jordan_basis(matrix: &DMatrix<Coefficient>, tolerance: f64) -> Result<DMatrix<Coefficient>> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(NormalFormError::Shape {
            what: "Jordan matrix columns",
            expected: n,
            found: matrix.ncols(),
        });
    }
    if n == 0 {
        return Ok(DMatrix::zeros(0, 0));
    }

    let scale = matrix.norm().max(1.0);
    let schur = matrix
        .clone()
        .try_schur(f64::EPSILON, 0)
        .ok_or_else(|| NormalFormError::Jordan("Schur decomposition did not converge".to_string()))?;
    let (_, triangular) = schur.unpack();
    let spectrum: Vec<Coefficient> = (0..n).map(|i| triangular[(i, i)]).collect();

    let mut columns: Vec<DVector<Coefficient>> = Vec::with_capacity(n);
    for (eigenvalue, multiplicity) in cluster_eigenvalues(&spectrum, tolerance.sqrt() * scale) {
        let shifted = matrix - DMatrix::<Coefficient>::identity(n, n) * eigenvalue;
        let svd = shifted.svd(true, true);
        let v_t = svd
            .v_t
            .as_ref()
            .ok_or_else(|| NormalFormError::Jordan("SVD did not produce right singular vectors".to_string()))?;
        let kernel: Vec<DVector<Coefficient>> = svd
            .singular_values
            .iter()
            .enumerate()
            .filter(|&(_, &sigma)| sigma <= tolerance * scale)
            .map(|(i, _)| v_t.row(i).adjoint())
            .collect();

        if kernel.len() == multiplicity {
            columns.extend(kernel);
        } else if kernel.len() == 1 {
            // chain (A − λ)v_{k+1} = v_k, solved through the pseudo-inverse
            let mut link = kernel[0].clone();
            columns.push(link.clone());
            for _ in 1..multiplicity {
                link = svd
                    .solve(&link, tolerance * scale)
                    .map_err(|e| NormalFormError::Jordan(e.to_string()))?;
                columns.push(link.clone());
            }
        } else {
            return Err(NormalFormError::Jordan(format!(
                "eigenvalue {} has {} eigenvectors for multiplicity {}; mixed Jordan blocks are not supported",
                eigenvalue,
                kernel.len(),
                multiplicity
            )));
        }
    }

    if columns.len() != n {
        return Err(NormalFormError::Jordan(format!(
            "found {} basis vectors for dimension {}",
            columns.len(),
            n
        )));
    }
    Ok(DMatrix::from_columns(&columns))
}

/// Groups eigenvalues closer than `radius`; returns (mean, multiplicity) pairs.
fn cluster_eigenvalues(spectrum: &[Coefficient], radius: f64) -> Vec<(Coefficient, usize)> {
    let mut clusters: Vec<(Coefficient, usize)> = Vec::new();
    for &lambda in spectrum {
        match clusters
            .iter_mut()
            .find(|(center, _)| (*center - lambda).norm() <= radius)
        {
            Some((center, count)) => {
                *center = (*center * *count as f64 + lambda) / (*count + 1) as f64;
                *count += 1;
            }
            None => clusters.push((lambda, 1)),
        }
    }
    clusters
}
