//! Vector field sampling for the phase-plane page.

use crate::chart::FieldChart;
use crate::to_js_error;
use anyhow::{Context, Result};
use popdyn_core::vector_field::{sample_expressions, FieldGrid};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

pub(crate) fn field_chart(fx: &str, fy: &str, grid: &FieldGrid) -> Result<FieldChart> {
    let field = sample_expressions(grid, fx, fy)
        .with_context(|| format!("Could not sample dx/dt = {fx}, dy/dt = {fy}"))?;
    Ok(FieldChart::from_field(&field))
}

#[wasm_bindgen]
pub fn sample_vector_field(
    fx: &str,
    fy: &str,
    x_max: f64,
    y_max: f64,
    samples: u32,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let grid = FieldGrid {
        x_max,
        y_max,
        samples: samples as usize,
    };
    let chart = field_chart(fx, fy, &grid).map_err(to_js_error)?;
    to_value(&chart).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
