use crate::error::Result;
use crate::frechet::Jacobian;
use crate::polynomial::Variables;
use crate::vector_field::{ensure_field_shape, VectorField};

/// `[X, Y] = DX·Y − DY·X` for two fields over `vars`.
pub fn lie_bracket(x: &VectorField, y: &VectorField, vars: &Variables) -> Result<VectorField> {
    ensure_field_shape(x, vars, "Lie bracket first argument")?;
    ensure_field_shape(y, vars, "Lie bracket second argument")?;
    Ok(bracket(x, y))
}

/// Unchecked bracket for callers that already validated both fields.
pub(crate) fn bracket(x: &VectorField, y: &VectorField) -> VectorField {
    let mut out = Jacobian::of(x).contract(y);
    out -= &Jacobian::of(y).contract(x);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalFormError;
    use crate::expression::parse_vector_field;
    use crate::polynomial::Coefficient;

    fn vars() -> Variables {
        Variables::new(["x", "y"]).expect("vars")
    }

    fn field(eqs: &[&str]) -> VectorField {
        parse_vector_field(eqs, &vars()).expect("field should parse")
    }

    #[test]
    fn bracket_of_shear_fields() {
        let x = field(&["y", "0"]);
        let y = field(&["0", "x"]);
        let result = lie_bracket(&x, &y, &vars()).expect("bracket");
        assert_eq!(result, field(&["x", "-y"]));
    }

    #[test]
    fn bracket_is_antisymmetric() {
        let x = field(&["x^2*y - y", "x + 3*x*y^2"]);
        let y = field(&["y^3 + 2*x", "x^2 - x*y"]);
        let xy = lie_bracket(&x, &y, &vars()).expect("bracket");
        let yx = lie_bracket(&y, &x, &vars()).expect("bracket");
        assert!(xy.approx_eq(&(-&yx), 1e-12));
    }

    #[test]
    fn bracket_is_bilinear() {
        let x = field(&["x^2", "y"]);
        let z = field(&["x*y", "x^3"]);
        let y = field(&["y^2 - x", "x*y"]);
        let a = Coefficient::new(2.0, -1.0);
        let b = Coefficient::new(-0.5, 0.0);

        let combined = &x.scale(a) + &z.scale(b);
        let lhs = lie_bracket(&combined, &y, &vars()).expect("bracket");
        let rhs = &lie_bracket(&x, &y, &vars()).expect("bracket").scale(a)
            + &lie_bracket(&z, &y, &vars()).expect("bracket").scale(b);
        assert!(lhs.approx_eq(&rhs, 1e-12));

        let lhs = lie_bracket(&y, &combined, &vars()).expect("bracket");
        let rhs = &lie_bracket(&y, &x, &vars()).expect("bracket").scale(a)
            + &lie_bracket(&y, &z, &vars()).expect("bracket").scale(b);
        assert!(lhs.approx_eq(&rhs, 1e-12));
    }

    #[test]
    fn bracket_rejects_mismatched_second_argument() {
        let x = field(&["x", "y"]);
        let y = parse_vector_field(&["x"], &vars()).expect("field");
        let err = lie_bracket(&x, &y, &vars()).expect_err("shape");
        assert!(matches!(
            err,
            NormalFormError::Shape {
                what: "Lie bracket second argument",
                ..
            }
        ));
    }
}
