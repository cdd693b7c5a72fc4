//! Core WASM vector-field wrapper and serialization payloads.

use anyhow::{anyhow, Context};
use normalform_core::expression::parse_vector_field;
use normalform_core::{Variables, VectorField};
use num_complex::Complex64;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmVectorField {
    pub(crate) field: VectorField,
    pub(crate) vars: Variables,
}

/// Parses `equations` over `var_names`; a plain-Rust helper shared by every entry point.
pub(crate) fn build_field(
    equations: &[String],
    var_names: &[String],
) -> anyhow::Result<(VectorField, Variables)> {
    let vars = Variables::new(var_names.iter().cloned()).context("Invalid variable names")?;
    let field = parse_vector_field(equations, &vars).context("Failed to parse equations")?;
    Ok((field, vars))
}

pub(crate) fn parse_tuple(equations: &[String], vars: &Variables) -> anyhow::Result<VectorField> {
    parse_vector_field(equations, vars).map_err(|e| anyhow!("Failed to parse equations: {}", e))
}

pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

#[wasm_bindgen]
impl WasmVectorField {
    #[wasm_bindgen(constructor)]
    pub fn new(equations: Vec<String>, var_names: Vec<String>) -> Result<WasmVectorField, JsValue> {
        console_error_panic_hook::set_once();
        let (field, vars) = build_field(&equations, &var_names).map_err(to_js_error)?;
        Ok(WasmVectorField { field, vars })
    }

    pub fn dimension(&self) -> usize {
        self.vars.len()
    }

    pub fn equations(&self) -> Vec<String> {
        self.field.render(&self.vars)
    }

    pub fn var_names(&self) -> Vec<String> {
        self.vars.names().to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexNumber {
    pub re: f64,
    pub im: f64,
}

impl From<Complex64> for ComplexNumber {
    fn from(value: Complex64) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}
