//! Normal form and Jordan reduction entry points.

use crate::system::{to_js_error, ComplexNumber, WasmVectorField};
use anyhow::Context;
use normalform_core::jordan::{jordan, JordanSettings};
use normalform_core::{normal_form, FormStrategy, NormalFormOptions, ResonanceTest, Variables, VectorField};
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[derive(Debug, Serialize)]
pub struct NormalFormPayload {
    pub normal_form: Vec<String>,
    pub generator: Vec<String>,
    pub eigenvalues: Vec<ComplexNumber>,
    pub generator_family: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct JordanPayload {
    pub field: Vec<String>,
    pub eigenvalues: Vec<ComplexNumber>,
    /// Row-major similarity matrix.
    pub basis: Vec<Vec<ComplexNumber>>,
    pub forward: Vec<String>,
    pub inverse: Vec<String>,
}

/// A non-positive tolerance selects the exact zero test.
pub(crate) fn resonance_test(tolerance: f64) -> ResonanceTest {
    if tolerance > 0.0 {
        ResonanceTest::Tolerance { epsilon: tolerance }
    } else {
        ResonanceTest::Exact
    }
}

pub(crate) fn compute_normal_form(
    field: &VectorField,
    vars: &Variables,
    order: usize,
    strategy: &str,
    tolerance: f64,
) -> anyhow::Result<NormalFormPayload> {
    let form_strategy: FormStrategy = strategy.parse()?;
    let options = NormalFormOptions {
        resonance_test: resonance_test(tolerance),
        form_strategy,
    };
    let result = normal_form(field, vars, order, &options).context("Normal form failed")?;
    Ok(NormalFormPayload {
        normal_form: result.normal_form.render(vars),
        generator: result.generator.render(vars),
        eigenvalues: result.eigenvalues.into_iter().map(ComplexNumber::from).collect(),
        generator_family: result
            .generator_family
            .iter()
            .map(|term| term.render(vars))
            .collect(),
    })
}

pub(crate) fn compute_jordan(
    field: &VectorField,
    vars: &Variables,
    new_var_names: &[String],
    tolerance: f64,
) -> anyhow::Result<JordanPayload> {
    let new_vars = Variables::new(new_var_names.iter().cloned()).context("Invalid new variable names")?;
    let mut settings = JordanSettings::default();
    if tolerance > 0.0 {
        settings.tolerance = tolerance;
    }
    let reduction = jordan(field, vars, &new_vars, settings).context("Jordan reduction failed")?;
    let basis = (0..reduction.basis.nrows())
        .map(|i| {
            (0..reduction.basis.ncols())
                .map(|j| ComplexNumber::from(reduction.basis[(i, j)]))
                .collect()
        })
        .collect();
    Ok(JordanPayload {
        field: reduction.field.render(&new_vars),
        eigenvalues: reduction.eigenvalues.into_iter().map(ComplexNumber::from).collect(),
        basis,
        forward: reduction.forward.render(&new_vars),
        inverse: reduction.inverse.render(vars),
    })
}

#[wasm_bindgen]
impl WasmVectorField {
    /// `strategy` is `"semisimple"` or `"nilpotent"`.
    pub fn normal_form(&self, order: u32, strategy: &str, tolerance: f64) -> Result<JsValue, JsValue> {
        let payload = compute_normal_form(&self.field, &self.vars, order as usize, strategy, tolerance)
            .map_err(to_js_error)?;
        to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn jordan(&self, new_var_names: Vec<String>, tolerance: f64) -> Result<JsValue, JsValue> {
        let payload =
            compute_jordan(&self.field, &self.vars, &new_var_names, tolerance).map_err(to_js_error)?;
        to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
