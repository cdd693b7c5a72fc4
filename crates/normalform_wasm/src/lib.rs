//! WebAssembly bridge: string equations in, rendered polynomials or serialized payloads out.

mod actions;
mod normal_form;
mod system;

pub use actions::{backward_action, forward_action, generator};
pub use system::WasmVectorField;
