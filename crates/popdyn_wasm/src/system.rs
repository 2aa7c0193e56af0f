//! User-defined equation systems.

use crate::chart::FieldChart;
use crate::simulation::chart_or_flat;
use crate::to_js_error;
use anyhow::{bail, Context, Result};
use popdyn_core::equation_engine::EquationSystem;
use popdyn_core::simulation::{simulate, ClampPolicy, TimeGrid};
use popdyn_core::solvers::{Method, Stepper};
use popdyn_core::traits::{DynamicalSystem, Steppable};
use popdyn_core::vector_field::{sample_system, FieldGrid};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSystem {
    system: EquationSystem,
    var_names: Vec<String>,
    state: Vec<f64>,
    t: f64,
    method: Method,
    solver: Stepper<f64>,
}

pub(crate) fn build_system(
    equations: &[String],
    params: Vec<f64>,
    param_names: &[String],
    var_names: &[String],
) -> Result<EquationSystem> {
    EquationSystem::from_strings(equations, var_names, param_names, params)
        .context("Could not build equation system")
}

pub(crate) fn parse_clamp(name: &str) -> Result<ClampPolicy> {
    match name {
        "" | "none" => Ok(ClampPolicy::None),
        "non_negative" => Ok(ClampPolicy::NonNegative),
        other => bail!("Unknown clamp policy: {other}"),
    }
}

impl WasmSystem {
    pub(crate) fn build(
        equations: Vec<String>,
        params: Vec<f64>,
        param_names: Vec<String>,
        var_names: Vec<String>,
        solver_name: &str,
    ) -> Result<Self> {
        let Some(method) = Method::parse(solver_name) else {
            bail!("Unknown solver: {solver_name}");
        };
        let system = build_system(&equations, params, &param_names, &var_names)?;
        let dim = system.dimension();

        Ok(WasmSystem {
            system,
            var_names,
            state: vec![0.0; dim],
            t: 0.0,
            method,
            solver: method.build(dim),
        })
    }

    pub(crate) fn chart_from_current(
        &self,
        t_end: f64,
        steps: usize,
        clamp: ClampPolicy,
    ) -> Result<crate::chart::ChartSeries> {
        let grid = TimeGrid::new(self.t, t_end, steps);
        let outcome = simulate(&self.system, &self.state, &grid, self.method, clamp);
        chart_or_flat(outcome, &self.state, &grid, self.var_names.as_slice())
    }
}

#[wasm_bindgen]
impl WasmSystem {
    #[wasm_bindgen(constructor)]
    pub fn new(
        equations: Vec<String>,
        params: Vec<f64>,
        param_names: Vec<String>,
        var_names: Vec<String>,
        solver_name: &str,
    ) -> Result<WasmSystem, JsValue> {
        console_error_panic_hook::set_once();
        WasmSystem::build(equations, params, param_names, var_names, solver_name)
            .map_err(to_js_error)
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        if state.len() != self.state.len() {
            return Err(JsValue::from_str("State dimension mismatch."));
        }
        self.state = state.to_vec();
        Ok(())
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.state.clone()
    }

    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    pub fn step(&mut self, dt: f64) {
        self.solver.step(&self.system, &mut self.t, &mut self.state, dt);
    }

    /// Integrates from the current time and state up to `t_end`.
    pub fn simulate(&self, t_end: f64, steps: u32, clamp: &str) -> Result<JsValue, JsValue> {
        let clamp = parse_clamp(clamp).map_err(to_js_error)?;
        let chart = self
            .chart_from_current(t_end, steps as usize, clamp)
            .map_err(to_js_error)?;
        to_value(&chart).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn vector_field(&self, x_max: f64, y_max: f64, samples: u32) -> Result<JsValue, JsValue> {
        let grid = FieldGrid {
            x_max,
            y_max,
            samples: samples as usize,
        };
        let field = sample_system(&grid, &self.system)
            .map_err(|e| JsValue::from_str(&format!("Vector field failed: {}", e)))?;
        to_value(&FieldChart::from_field(&field))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
