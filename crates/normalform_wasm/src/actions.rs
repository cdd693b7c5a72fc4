//! Lie bracket, generator actions and the exponential map.

use crate::system::{build_field, parse_tuple, to_js_error, WasmVectorField};
use anyhow::Context;
use normalform_core::action;
use normalform_core::bracket::lie_bracket;
use normalform_core::{Coefficient, Variables, VectorField};
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionKind {
    Forward,
    Backward,
    ForwardAdjoint,
    BackwardAdjoint,
}

pub(crate) fn apply_action(
    kind: ActionKind,
    subject: &VectorField,
    generator: &VectorField,
    vars: &Variables,
    order: usize,
) -> anyhow::Result<Vec<String>> {
    let result = match kind {
        ActionKind::Forward => action::forward_action(subject, generator, vars, order),
        ActionKind::Backward => action::backward_action(subject, generator, vars, order),
        ActionKind::ForwardAdjoint => action::forward_adjoint_action(subject, generator, vars, order),
        ActionKind::BackwardAdjoint => action::backward_adjoint_action(subject, generator, vars, order),
    }
    .with_context(|| format!("{:?} action failed", kind))?;
    Ok(result.render(vars))
}

#[wasm_bindgen]
impl WasmVectorField {
    pub fn lie_bracket(&self, other: Vec<String>) -> Result<Vec<String>, JsValue> {
        let other = parse_tuple(&other, &self.vars).map_err(to_js_error)?;
        let bracket = lie_bracket(&self.field, &other, &self.vars)
            .map_err(|e| JsValue::from_str(&format!("Lie bracket failed: {}", e)))?;
        Ok(bracket.render(&self.vars))
    }

    pub fn forward_adjoint_action(&self, generator: Vec<String>, order: u32) -> Result<Vec<String>, JsValue> {
        let generator = parse_tuple(&generator, &self.vars).map_err(to_js_error)?;
        apply_action(ActionKind::ForwardAdjoint, &self.field, &generator, &self.vars, order as usize)
            .map_err(to_js_error)
    }

    pub fn backward_adjoint_action(&self, generator: Vec<String>, order: u32) -> Result<Vec<String>, JsValue> {
        let generator = parse_tuple(&generator, &self.vars).map_err(to_js_error)?;
        apply_action(ActionKind::BackwardAdjoint, &self.field, &generator, &self.vars, order as usize)
            .map_err(to_js_error)
    }

    /// Time-`t` flow map of this field as a truncated Lie series.
    pub fn exponential(&self, t: f64, order: u32) -> Result<Vec<String>, JsValue> {
        let flow = action::exponential(&self.field, &self.vars, Coefficient::from(t), order as usize)
            .map_err(|e| JsValue::from_str(&format!("Exponential failed: {}", e)))?;
        Ok(flow.render(&self.vars))
    }
}

/// `functions ∘ φ`, with `φ` the time-one flow of `generator`.
#[wasm_bindgen]
pub fn forward_action(
    functions: Vec<String>,
    generator: Vec<String>,
    var_names: Vec<String>,
    order: u32,
) -> Result<Vec<String>, JsValue> {
    let (subject, vars) = build_field(&functions, &var_names).map_err(to_js_error)?;
    let generator = parse_tuple(&generator, &vars).map_err(to_js_error)?;
    apply_action(ActionKind::Forward, &subject, &generator, &vars, order as usize).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn backward_action(
    functions: Vec<String>,
    generator: Vec<String>,
    var_names: Vec<String>,
    order: u32,
) -> Result<Vec<String>, JsValue> {
    let (subject, vars) = build_field(&functions, &var_names).map_err(to_js_error)?;
    let generator = parse_tuple(&generator, &vars).map_err(to_js_error)?;
    apply_action(ActionKind::Backward, &subject, &generator, &vars, order as usize).map_err(to_js_error)
}

/// Generator of a near-identity map given as one expression per variable.
#[wasm_bindgen]
pub fn generator(map: Vec<String>, var_names: Vec<String>, order: u32) -> Result<Vec<String>, JsValue> {
    console_error_panic_hook::set_once();
    let (map, vars) = build_field(&map, &var_names).map_err(to_js_error)?;
    let result = action::generator(&map, &vars, order as usize)
        .context("Generator failed")
        .map_err(to_js_error)?;
    Ok(result.render(&vars))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn backward_undoes_forward_action() {
        let (subject, vars) = build_field(&strings(&["x*y", "x + y^2"]), &strings(&["x", "y"])).expect("subject");
        let generator = parse_tuple(&strings(&["y^2", "x^2"]), &vars).expect("generator");
        let there = apply_action(ActionKind::Forward, &subject, &generator, &vars, 3).expect("forward");
        let there = parse_tuple(&there, &vars).expect("reparse");
        let back = apply_action(ActionKind::Backward, &there, &generator, &vars, 3).expect("backward");
        let back = parse_tuple(&back, &vars).expect("reparse");
        assert!(back.approx_eq(&subject, 1e-9));
    }

    #[test]
    fn action_errors_name_the_action() {
        let (subject, vars) = build_field(&strings(&["x", "y"]), &strings(&["x", "y"])).expect("subject");
        let short = parse_tuple(&strings(&["x"]), &vars).expect("generator");
        let err = apply_action(ActionKind::ForwardAdjoint, &subject, &short, &vars, 2).expect_err("shape");
        let message = format!("{:#}", err);
        assert!(message.contains("ForwardAdjoint action failed"), "{message}");
        assert!(message.contains("generator"), "{message}");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn lie_bracket_of_shear_fields() {
        let field = WasmVectorField::new(strings(&["y", "0"]), strings(&["x", "y"])).expect("field");
        let bracket = field.lie_bracket(strings(&["0", "x"])).expect("bracket");
        assert_eq!(bracket, strings(&["x", "-y"]));
    }

    #[wasm_bindgen_test]
    fn generator_rejects_non_identity_maps() {
        let result = generator(strings(&["2*x"]), strings(&["x"]), 3);
        let message = result.err().and_then(|err| err.as_string()).unwrap_or_default();
        assert!(message.contains("not near-identity"), "{message}");
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}
