//! Fixed-step simulation driver and its result container.
//!
//! A run evaluates `steps` fixed steps of a [`DynamicalSystem`] from `t0` to
//! `t_end`, optionally clamping the state after every step, and returns the
//! whole trajectory including the initial sample. Runs either complete or
//! fail; no partial trajectory is ever handed back.

use crate::error::{Error, Result};
use crate::solvers::Method;
use crate::traits::{DynamicalSystem, Steppable};
use serde::{Deserialize, Serialize};

/// Evenly spaced time grid with `steps + 1` sample times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    pub t0: f64,
    pub t_end: f64,
    pub steps: usize,
}

impl TimeGrid {
    pub fn new(t0: f64, t_end: f64, steps: usize) -> Self {
        Self { t0, t_end, steps }
    }

    /// Grid with `samples` points including both ends (`samples - 1` steps).
    pub fn from_samples(t0: f64, t_end: f64, samples: usize) -> Self {
        Self::new(t0, t_end, samples.saturating_sub(1))
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(Error::invalid("steps must be at least 1."));
        }
        if !self.t0.is_finite() || !self.t_end.is_finite() {
            return Err(Error::invalid("Time bounds must be finite."));
        }
        if self.t_end <= self.t0 {
            return Err(Error::invalid(format!(
                "t_end ({}) must be greater than t0 ({}).",
                self.t_end, self.t0
            )));
        }
        // Two ulps at the largest magnitude keep rounded sample times distinct.
        let dt = self.dt();
        let resolution = 2.0 * f64::EPSILON * self.t0.abs().max(self.t_end.abs());
        if !dt.is_finite() || dt <= resolution {
            return Err(Error::invalid(format!(
                "Time step ({dt}) cannot be resolved between t0 ({}) and t_end ({}).",
                self.t0, self.t_end
            )));
        }
        Ok(())
    }

    pub fn dt(&self) -> f64 {
        (self.t_end - self.t0) / self.steps as f64
    }

    pub fn time_at(&self, index: usize) -> f64 {
        if index == self.steps {
            self.t_end
        } else {
            self.t0 + index as f64 * self.dt()
        }
    }

    pub fn times(&self) -> Vec<f64> {
        (0..=self.steps).map(|i| self.time_at(i)).collect()
    }
}

/// Post-step correction applied to every state after the initial one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    #[default]
    None,
    /// Replace negative components with zero.
    NonNegative,
}

impl ClampPolicy {
    pub fn apply(self, state: &mut [f64]) {
        match self {
            ClampPolicy::None => {}
            ClampPolicy::NonNegative => {
                for value in state.iter_mut() {
                    if *value < 0.0 {
                        *value = 0.0;
                    }
                }
            }
        }
    }
}

/// Trajectory of one run: `(time, state)` samples, time strictly increasing.
///
/// States are stored row-major in a single buffer, `dimension` values per
/// sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    dimension: usize,
    times: Vec<f64>,
    states: Vec<f64>,
}

impl SimulationResult {
    /// Flat series holding `initial` at every grid time. Useful to callers
    /// that want to display something after a failed run.
    pub fn constant(initial: &[f64], grid: &TimeGrid) -> Self {
        let times = grid.times();
        let mut states = Vec::with_capacity(times.len() * initial.len());
        for _ in &times {
            states.extend_from_slice(initial);
        }
        Self {
            dimension: initial.len(),
            times,
            states,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn time(&self, index: usize) -> f64 {
        self.times[index]
    }

    pub fn state(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.states[start..start + self.dimension]
    }

    pub fn final_state(&self) -> &[f64] {
        self.state(self.len() - 1)
    }

    pub fn samples(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.states.chunks_exact(self.dimension.max(1)))
    }

    /// Time series of a single state component.
    pub fn component(&self, k: usize) -> Vec<f64> {
        self.samples().map(|(_, state)| state[k]).collect()
    }

    /// Sum of all components at each sample.
    pub fn totals(&self) -> Vec<f64> {
        self.samples().map(|(_, state)| state.iter().sum()).collect()
    }
}

/// Integrates `system` over `grid` starting from `initial`, applying `clamp`
/// after every step.
pub fn simulate<S>(
    system: &S,
    initial: &[f64],
    grid: &TimeGrid,
    method: Method,
    clamp: ClampPolicy,
) -> Result<SimulationResult>
where
    S: DynamicalSystem<f64>,
{
    simulate_with(system, initial, grid, method, |state: &mut [f64]| {
        clamp.apply(state)
    })
}

/// Same as [`simulate`] with an arbitrary clamp closure.
pub fn simulate_with<S, C>(
    system: &S,
    initial: &[f64],
    grid: &TimeGrid,
    method: Method,
    clamp: C,
) -> Result<SimulationResult>
where
    S: DynamicalSystem<f64>,
    C: Fn(&mut [f64]),
{
    grid.validate()?;
    let dim = system.dimension();
    if dim == 0 {
        return Err(Error::invalid("System dimension must be positive."));
    }
    if initial.len() != dim {
        return Err(Error::invalid(format!(
            "Initial state length ({}) does not match system dimension ({}).",
            initial.len(),
            dim
        )));
    }
    if let Some(k) = initial.iter().position(|v| !v.is_finite()) {
        return Err(Error::invalid(format!(
            "Initial state component {k} is not finite."
        )));
    }

    let dt = grid.dt();
    let mut stepper = method.build::<f64>(dim);
    let mut times = Vec::with_capacity(grid.steps + 1);
    let mut states = Vec::with_capacity((grid.steps + 1) * dim);
    times.push(grid.t0);
    states.extend_from_slice(initial);

    let mut state = initial.to_vec();
    for step in 1..=grid.steps {
        let t_prev = grid.time_at(step - 1);
        let mut t = t_prev;
        stepper.step(system, &mut t, &mut state, dt);

        if let Some(k) = state.iter().position(|v| !v.is_finite()) {
            let last_valid = step - 1;
            let start = last_valid * dim;
            return Err(Error::Simulation {
                step,
                last_valid,
                time: t_prev,
                state: states[start..start + dim].to_vec(),
                reason: format!("component {k} became non-finite"),
            });
        }

        clamp(&mut state);
        times.push(grid.time_at(step));
        states.extend_from_slice(&state);
    }

    Ok(SimulationResult {
        dimension: dim,
        times,
        states,
    })
}
