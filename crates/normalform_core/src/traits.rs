use crate::error::Result;
use crate::polynomial::Coefficient;
use crate::vector_field::VectorField;

/// Decides whether a divisor counts as zero, i.e. whether a term is resonant.
pub trait ZeroTest {
    fn is_zero(&self, divisor: Coefficient) -> bool;
}

impl<F> ZeroTest for F
where
    F: Fn(Coefficient) -> bool,
{
    fn is_zero(&self, divisor: Coefficient) -> bool {
        self(divisor)
    }
}

/// The output of one homological-equation step `[AX, Y] + G = F`.
#[derive(Debug, Clone, PartialEq)]
pub struct HomologicalSplit {
    /// The resonant part `G`, kept in the normal form.
    pub remainder: VectorField,
    /// The generator term `Y`.
    pub generator: VectorField,
}

/// Solves the homological equation for one homogeneous degree.
pub trait HomologicalSolver {
    /// linear: the linear part `AX` of the field (in Jordan form).
    /// eigenvalues: the diagonal of `A`, one entry per component.
    /// forcing: the homogeneous term `F` of degree `degree`.
    fn solve(
        &self,
        linear: &VectorField,
        eigenvalues: &[Coefficient],
        forcing: &VectorField,
        degree: usize,
        zero_test: &dyn ZeroTest,
    ) -> Result<HomologicalSplit>;
}
