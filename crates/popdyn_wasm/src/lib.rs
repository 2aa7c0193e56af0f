//! WASM bindings for the popdyn dashboard.
//!
//! Every exported function takes plain JS values, runs the core, and hands
//! back a serialized chart payload. Errors cross the boundary as strings.

mod chart;
mod field;
mod simulation;
mod system;

pub use chart::{ChartSeries, FieldChart, Series};
pub use field::sample_vector_field;
pub use simulation::{default_scenario, preset_names, simulate_model};
pub use system::WasmSystem;

use wasm_bindgen::JsValue;

pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
