use thiserror::Error;

/// Errors reported by the normal-form core.
///
/// Every entry point validates its inputs before doing any work, so an error
/// always means that nothing was computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalFormError {
    /// A vector field or function tuple does not match the variable tuple.
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    Shape {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("variable `{0}` appears more than once")]
    DuplicateVariable(String),

    /// An option selector (e.g. the form strategy) was not recognized.
    #[error("unrecognized value `{value}` for option `{option}`")]
    UnrecognizedOption { option: &'static str, value: String },

    /// The zero test classified a term as non-resonant although its divisor is zero.
    #[error("divisor of monomial {exponents:?} in component {component} is zero but was classified non-resonant")]
    SingularDivisor { component: usize, exponents: Vec<u32> },

    #[error("order {order} is below the minimum of {minimum}")]
    InvalidOrder { order: usize, minimum: usize },

    /// Action generators start at degree two; lower-degree terms would be dropped.
    #[error("generator has a nonzero degree-{degree} part; generators start at degree two")]
    LowDegreeGenerator { degree: u32 },

    #[error("linear part has entries below the diagonal; the nilpotent solver needs upper-triangular (Jordan) form")]
    LinearPartNotTriangular,

    /// A near-identity map was expected: identity linear part and no constant term.
    #[error("map is not near-identity: {0}")]
    NotNearIdentity(String),

    #[error("Jordan reduction failed: {0}")]
    Jordan(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, NormalFormError>;
