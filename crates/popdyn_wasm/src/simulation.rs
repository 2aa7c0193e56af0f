//! Model simulation entry points.

use crate::chart::ChartSeries;
use crate::to_js_error;
use anyhow::{anyhow, Result};
use popdyn_core::scenario::Scenario;
use popdyn_core::simulation::{SimulationResult, TimeGrid};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Charts a finished run. A numeric failure becomes a flat line at the
/// initial values with a visible warning; rejected input stays an error.
pub(crate) fn chart_or_flat<L: AsRef<str>>(
    outcome: popdyn_core::Result<SimulationResult>,
    initial: &[f64],
    grid: &TimeGrid,
    labels: &[L],
) -> Result<ChartSeries> {
    match outcome {
        Ok(result) => Ok(ChartSeries::from_result(&result, labels)),
        Err(err) if err.is_simulation_failure() => {
            let flat = SimulationResult::constant(initial, grid);
            Ok(ChartSeries::from_result(&flat, labels)
                .with_warning(format!("{err}. Showing the initial values instead.")))
        }
        Err(err) => Err(anyhow!(err)),
    }
}

pub(crate) fn run_scenario(scenario: &Scenario) -> Result<ChartSeries> {
    chart_or_flat(
        scenario.run(),
        &scenario.initial,
        &scenario.grid,
        scenario.labels(),
    )
}

#[wasm_bindgen]
pub fn simulate_model(scenario: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let scenario: Scenario = from_value(scenario)
        .map_err(|e| JsValue::from_str(&format!("Invalid scenario: {}", e)))?;
    let chart = run_scenario(&scenario).map_err(to_js_error)?;

    to_value(&chart).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub fn default_scenario(name: &str) -> Result<JsValue, JsValue> {
    let scenario = Scenario::preset(name)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown scenario: {}", name)))?;
    to_value(&scenario).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub fn preset_names() -> js_sys::Array {
    Scenario::PRESETS
        .iter()
        .map(|name| JsValue::from_str(name))
        .collect()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::{default_scenario, preset_names, simulate_model};
    use serde::Deserialize;
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[derive(Deserialize)]
    struct ChartPayload {
        times: Vec<f64>,
        series: Vec<SeriesPayload>,
        warning: Option<String>,
    }

    #[derive(Deserialize)]
    struct SeriesPayload {
        label: String,
    }

    #[wasm_bindgen_test]
    fn preset_round_trips_through_js() {
        assert_eq!(preset_names().length(), 6);
        let scenario = default_scenario("seir").expect("preset");
        let chart: ChartPayload =
            from_value(simulate_model(scenario).expect("simulate")).expect("payload");
        assert_eq!(chart.times.len(), 300);
        assert_eq!(chart.series[1].label, "E");
        assert!(chart.warning.is_none());
    }

    #[wasm_bindgen_test]
    fn unknown_preset_is_an_error() {
        assert!(default_scenario("weather").is_err());
    }
}
