//! Reference population and epidemic models.
//!
//! Each model is a plain parameter struct implementing [`DynamicalSystem`]
//! for any [`Scalar`]. [`Model`] is the tagged variant used by callers that
//! pick a model at runtime.

use crate::error::{Error, Result};
use crate::simulation::{simulate, ClampPolicy, SimulationResult, TimeGrid};
use crate::solvers::Method;
use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

fn require_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(format!("{name} must be finite.")))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<()> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(Error::invalid(format!(
            "{name} must be non-negative (got {value})."
        )));
    }
    Ok(())
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    require_finite(name, value)?;
    if value <= 0.0 {
        return Err(Error::invalid(format!(
            "{name} must be positive (got {value})."
        )));
    }
    Ok(())
}

/// `dP/dt = r P`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exponential {
    pub rate: f64,
}

impl Exponential {
    /// Negative rates are allowed and describe decay.
    pub fn validate(&self) -> Result<()> {
        require_finite("rate", self.rate)
    }

    /// `P(t) = P0 e^{rt}`
    pub fn exact(&self, p0: f64, t: f64) -> f64 {
        p0 * (self.rate * t).exp()
    }
}

impl<T: Scalar> DynamicalSystem<T> for Exponential {
    fn dimension(&self) -> usize {
        1
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        out[0] = T::lift(self.rate) * x[0];
    }
}

/// `dP/dt = r P (1 - P/K)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Logistic {
    pub rate: f64,
    pub capacity: f64,
}

impl Logistic {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("rate", self.rate)?;
        require_positive("capacity", self.capacity)
    }

    /// `P(t) = K / (1 + ((K - P0)/P0) e^{-rt})`, for `P0 > 0`.
    pub fn exact(&self, p0: f64, t: f64) -> f64 {
        let k = self.capacity;
        k / (1.0 + ((k - p0) / p0) * (-self.rate * t).exp())
    }
}

impl<T: Scalar> DynamicalSystem<T> for Logistic {
    fn dimension(&self) -> usize {
        1
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let r = T::lift(self.rate);
        let k = T::lift(self.capacity);
        out[0] = r * x[0] * (T::one() - x[0] / k);
    }
}

/// `dP/dt = r P (1 - P/K) - h`. Pair with [`ClampPolicy::NonNegative`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticHarvest {
    pub rate: f64,
    pub capacity: f64,
    pub harvest: f64,
}

impl LogisticHarvest {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("rate", self.rate)?;
        require_positive("capacity", self.capacity)?;
        require_non_negative("harvest", self.harvest)
    }

    /// Largest constant harvest the population can sustain, `rK/4`.
    pub fn maximum_sustainable_yield(&self) -> f64 {
        self.rate * self.capacity / 4.0
    }

    /// Roots of `rP(1 - P/K) = h` as `(unstable, stable)`, or `None` when
    /// the harvest exceeds the maximum sustainable yield.
    pub fn equilibria(&self) -> Option<(f64, f64)> {
        if self.rate <= 0.0 {
            return None;
        }
        let discriminant = 1.0 - 4.0 * self.harvest / (self.rate * self.capacity);
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let half_k = self.capacity / 2.0;
        Some((half_k * (1.0 - root), half_k * (1.0 + root)))
    }

    /// True when every population is eventually driven to zero.
    pub fn collapses(&self) -> bool {
        self.harvest > 0.0 && self.equilibria().is_none()
    }
}

impl<T: Scalar> DynamicalSystem<T> for LogisticHarvest {
    fn dimension(&self) -> usize {
        1
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let r = T::lift(self.rate);
        let k = T::lift(self.capacity);
        let h = T::lift(self.harvest);
        out[0] = r * x[0] * (T::one() - x[0] / k) - h;
    }
}

/// State `(S, I, R)`, normalized incidence `beta S I / N`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sir {
    pub beta: f64,
    pub gamma: f64,
    pub population: f64,
}

impl Sir {
    /// Builds the model from the unnormalized convention `dS/dt = -b S I`
    /// by rescaling `beta = b N`.
    pub fn from_unnormalized(beta_raw: f64, gamma: f64, population: f64) -> Self {
        Self {
            beta: beta_raw * population,
            gamma,
            population,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_negative("beta", self.beta)?;
        require_non_negative("gamma", self.gamma)?;
        require_positive("population", self.population)
    }

    pub fn basic_reproduction_number(&self) -> f64 {
        self.beta / self.gamma
    }

    /// Susceptible count at which infections peak, `gamma N / beta`.
    pub fn susceptible_threshold(&self) -> f64 {
        self.gamma * self.population / self.beta
    }

    /// `[N - I0 - R0, I0, R0]`
    pub fn initial_state(&self, infected: f64, recovered: f64) -> [f64; 3] {
        [self.population - infected - recovered, infected, recovered]
    }
}

impl<T: Scalar> DynamicalSystem<T> for Sir {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let beta = T::lift(self.beta);
        let gamma = T::lift(self.gamma);
        let n = T::lift(self.population);
        let (s, i) = (x[0], x[1]);

        let infections = beta * s * i / n;
        let recoveries = gamma * i;
        out[0] = -infections;
        out[1] = infections - recoveries;
        out[2] = recoveries;
    }
}

/// State `(S, E, I, R)` with incubation rate `sigma`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seir {
    pub beta: f64,
    pub sigma: f64,
    pub gamma: f64,
    pub population: f64,
}

impl Seir {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("beta", self.beta)?;
        require_non_negative("sigma", self.sigma)?;
        require_non_negative("gamma", self.gamma)?;
        require_positive("population", self.population)
    }

    pub fn basic_reproduction_number(&self) -> f64 {
        self.beta / self.gamma
    }

    /// `[N - E0 - I0, E0, I0, 0]`
    pub fn initial_state(&self, exposed: f64, infected: f64) -> [f64; 4] {
        [self.population - exposed - infected, exposed, infected, 0.0]
    }
}

impl<T: Scalar> DynamicalSystem<T> for Seir {
    fn dimension(&self) -> usize {
        4
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let beta = T::lift(self.beta);
        let sigma = T::lift(self.sigma);
        let gamma = T::lift(self.gamma);
        let n = T::lift(self.population);
        let (s, e, i) = (x[0], x[1], x[2]);

        let infections = beta * s * i / n;
        let onsets = sigma * e;
        let recoveries = gamma * i;
        out[0] = -infections;
        out[1] = infections - onsets;
        out[2] = onsets - recoveries;
        out[3] = recoveries;
    }
}

/// Runtime-selected model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Model {
    Exponential(Exponential),
    Logistic(Logistic),
    LogisticHarvest(LogisticHarvest),
    Sir(Sir),
    Seir(Seir),
}

impl Model {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Model::Exponential(_) | Model::Logistic(_) | Model::LogisticHarvest(_) => &["P"],
            Model::Sir(_) => &["S", "I", "R"],
            Model::Seir(_) => &["S", "E", "I", "R"],
        }
    }

    pub fn default_clamp(&self) -> ClampPolicy {
        match self {
            Model::LogisticHarvest(_) => ClampPolicy::NonNegative,
            _ => ClampPolicy::None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Model::Exponential(m) => m.validate(),
            Model::Logistic(m) => m.validate(),
            Model::LogisticHarvest(m) => m.validate(),
            Model::Sir(m) => m.validate(),
            Model::Seir(m) => m.validate(),
        }
    }

    /// Validates the parameters, then runs with the model's default clamp.
    pub fn simulate(
        &self,
        initial: &[f64],
        grid: &TimeGrid,
        method: Method,
    ) -> Result<SimulationResult> {
        self.validate()?;
        simulate(self, initial, grid, method, self.default_clamp())
    }
}

impl DynamicalSystem<f64> for Model {
    fn dimension(&self) -> usize {
        match self {
            Model::Exponential(m) => DynamicalSystem::<f64>::dimension(m),
            Model::Logistic(m) => DynamicalSystem::<f64>::dimension(m),
            Model::LogisticHarvest(m) => DynamicalSystem::<f64>::dimension(m),
            Model::Sir(m) => DynamicalSystem::<f64>::dimension(m),
            Model::Seir(m) => DynamicalSystem::<f64>::dimension(m),
        }
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        match self {
            Model::Exponential(m) => DynamicalSystem::<f64>::apply(m, t, x, out),
            Model::Logistic(m) => DynamicalSystem::<f64>::apply(m, t, x, out),
            Model::LogisticHarvest(m) => DynamicalSystem::<f64>::apply(m, t, x, out),
            Model::Sir(m) => DynamicalSystem::<f64>::apply(m, t, x, out),
            Model::Seir(m) => DynamicalSystem::<f64>::apply(m, t, x, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Exponential, Logistic, LogisticHarvest, Model, Seir, Sir};
    use crate::error::Error;
    use crate::simulation::{simulate, ClampPolicy, TimeGrid};
    use crate::solvers::Method;

    fn max_error_vs(
        result: &crate::simulation::SimulationResult,
        exact: impl Fn(f64) -> f64,
    ) -> f64 {
        result
            .samples()
            .map(|(t, state)| (state[0] - exact(t)).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn exponential_euler_converges_at_first_order() {
        let model = Exponential { rate: 0.03 };
        let p0 = 100.0;
        let error_for = |steps| {
            let result = simulate(
                &model,
                &[p0],
                &TimeGrid::new(0.0, 100.0, steps),
                Method::Euler,
                ClampPolicy::None,
            )
            .expect("simulation should succeed");
            max_error_vs(&result, |t| model.exact(p0, t))
        };

        let coarse = error_for(200);
        let fine = error_for(400);
        let ratio = coarse / fine;
        assert!(coarse < 0.05 * model.exact(p0, 100.0), "coarse error {coarse}");
        assert!((1.8..2.2).contains(&ratio), "error ratio {ratio}");
    }

    #[test]
    fn logistic_without_harvest_tracks_closed_form() {
        let logistic = Logistic {
            rate: 0.1,
            capacity: 200.0,
        };
        let harvested = LogisticHarvest {
            rate: 0.1,
            capacity: 200.0,
            harvest: 0.0,
        };
        let p0 = 50.0;
        let error_for = |steps| {
            let result = simulate(
                &harvested,
                &[p0],
                &TimeGrid::new(0.0, 60.0, steps),
                Method::Euler,
                ClampPolicy::NonNegative,
            )
            .expect("simulation should succeed");
            max_error_vs(&result, |t| logistic.exact(p0, t))
        };

        let coarse = error_for(500);
        let fine = error_for(1000);
        assert!(coarse < 1.0, "coarse error {coarse}");
        assert!(fine < coarse * 0.6, "fine {fine} vs coarse {coarse}");
        assert!((logistic.exact(p0, 0.0) - p0).abs() < 1e-12);
    }

    #[test]
    fn harvested_logistic_reference_case_stays_non_negative() {
        let model = Model::LogisticHarvest(LogisticHarvest {
            rate: 0.04,
            capacity: 750.0,
            harvest: 30.0,
        });
        let result = model
            .simulate(
                &[200.0],
                &TimeGrid::from_samples(0.0, 100.0, 200),
                Method::Euler,
            )
            .expect("simulation should succeed");
        assert_eq!(result.len(), 200);
        assert!(result.component(0).iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn heavy_harvest_drives_population_to_zero_and_keeps_it_there() {
        let harvest = LogisticHarvest {
            rate: 0.04,
            capacity: 750.0,
            harvest: 30.0,
        };
        // rK/4 = 7.5, so h = 30 is far beyond what the population can sustain.
        assert!(harvest.collapses());
        let result = Model::LogisticHarvest(harvest)
            .simulate(&[200.0], &TimeGrid::new(0.0, 100.0, 199), Method::Euler)
            .expect("simulation should succeed");

        let series = result.component(0);
        let first_zero = series
            .iter()
            .position(|p| *p == 0.0)
            .expect("population should reach zero");
        assert!(series[first_zero..].iter().all(|p| *p == 0.0));
    }

    #[test]
    fn harvest_equilibria_straddle_half_capacity() {
        let model = LogisticHarvest {
            rate: 0.04,
            capacity: 750.0,
            harvest: 5.0,
        };
        let (low, high) = model.equilibria().expect("sustainable harvest");
        assert!(low < 375.0 && high > 375.0);
        for p in [low, high] {
            let growth = model.rate * p * (1.0 - p / model.capacity);
            assert!((growth - model.harvest).abs() < 1e-9);
        }
        assert!(!model.collapses());
        assert!((model.maximum_sustainable_yield() - 7.5).abs() < 1e-12);
    }

    #[test]
    fn sir_conserves_population() {
        for (beta, gamma, n, horizon) in [
            (0.3, 0.1, 1000.0, 100.0),
            (1.2, 0.05, 50.0, 30.0),
            (0.02, 0.5, 1e6, 365.0),
        ] {
            let sir = Sir {
                beta,
                gamma,
                population: n,
            };
            for method in [Method::Euler, Method::Rk4] {
                let result = simulate(
                    &sir,
                    &sir.initial_state(1.0, 0.0),
                    &TimeGrid::new(0.0, horizon, 300),
                    method,
                    ClampPolicy::None,
                )
                .expect("simulation should succeed");
                for total in result.totals() {
                    assert!((total - n).abs() <= 1e-9 * n, "total {total} vs {n}");
                }
            }
        }
    }

    #[test]
    fn seir_conserves_population() {
        let seir = Seir {
            beta: 0.3,
            sigma: 0.2,
            gamma: 0.1,
            population: 1000.0,
        };
        let result = Model::Seir(seir)
            .simulate(
                &seir.initial_state(0.0, 1.0),
                &TimeGrid::from_samples(0.0, 160.0, 300),
                Method::Rk4,
            )
            .expect("simulation should succeed");
        assert_eq!(result.dimension(), 4);
        for total in result.totals() {
            assert!((total - 1000.0).abs() < 1e-9);
        }
        // The exposed compartment must fill before infections peak.
        let exposed = result.component(1);
        assert!(exposed.iter().cloned().fold(0.0, f64::max) > 1.0);
    }

    #[test]
    fn sir_outbreak_reference_scenario_rises_initially() {
        let sir = Sir::from_unnormalized(1.0 / 7138.0, 0.40, 7138.0);
        assert!(sir.basic_reproduction_number() > 1.0);
        assert!((sir.susceptible_threshold() - 2855.2).abs() < 0.1);

        let result = Model::Sir(sir)
            .simulate(
                &sir.initial_state(1.0, 0.0),
                &TimeGrid::from_samples(0.0, 40.0, 500),
                Method::Euler,
            )
            .expect("simulation should succeed");
        let infected = result.component(1);
        assert!(infected[1] > infected[0]);
        let peak = infected.iter().cloned().fold(0.0, f64::max);
        assert!(peak > 100.0, "peak {peak}");
    }

    #[test]
    fn invalid_parameters_are_rejected_before_stepping() {
        let bad = [
            Model::Logistic(Logistic {
                rate: 0.1,
                capacity: 0.0,
            }),
            Model::LogisticHarvest(LogisticHarvest {
                rate: 0.1,
                capacity: 100.0,
                harvest: -1.0,
            }),
            Model::Sir(Sir {
                beta: 0.3,
                gamma: 0.1,
                population: -5.0,
            }),
            Model::Exponential(Exponential { rate: f64::NAN }),
        ];
        for model in bad {
            let initial = vec![1.0; model.labels().len()];
            let err = model
                .simulate(&initial, &TimeGrid::new(0.0, 1.0, 10), Method::Euler)
                .expect_err("invalid model must fail");
            assert!(matches!(err, Error::InvalidParameters(_)), "{err:?}");
        }
    }

    #[test]
    fn model_arity_mismatch_is_invalid() {
        let model = Model::Sir(Sir {
            beta: 0.3,
            gamma: 0.1,
            population: 100.0,
        });
        let err = model
            .simulate(&[99.0, 1.0], &TimeGrid::new(0.0, 1.0, 10), Method::Euler)
            .expect_err("arity mismatch must fail");
        assert!(matches!(err, Error::InvalidParameters(_)));
    }

    #[test]
    fn model_deserializes_from_tagged_json() {
        let model: Model = serde_json::from_str(
            r#"{"model":"logistic_harvest","rate":0.04,"capacity":750,"harvest":30}"#,
        )
        .expect("valid model json");
        assert_eq!(model.default_clamp(), ClampPolicy::NonNegative);
        assert_eq!(model.labels(), &["P"]);

        let json = serde_json::to_value(Model::Seir(Seir {
            beta: 0.3,
            sigma: 0.2,
            gamma: 0.1,
            population: 1000.0,
        }))
        .expect("serializable");
        assert_eq!(json["model"], "seir");
        assert_eq!(json["sigma"], 0.2);
    }
}
