//! Run configuration: a model, its initial state and a time grid.
//!
//! Scenarios are plain serde data so the dashboard can send them as JSON.
//! The named presets reproduce the classroom defaults.

use crate::error::{Error, Result};
use crate::models::{Exponential, Logistic, LogisticHarvest, Model, Seir, Sir};
use crate::simulation::{simulate, ClampPolicy, SimulationResult, TimeGrid};
use crate::solvers::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub model: Model,
    pub initial: Vec<f64>,
    pub grid: TimeGrid,
    #[serde(default)]
    pub method: Method,
    /// Overrides the model's default clamp when set.
    #[serde(default)]
    pub clamp: Option<ClampPolicy>,
}

impl Scenario {
    pub const PRESETS: [&'static str; 6] = [
        "exponential_growth",
        "logistic_growth",
        "logistic_harvest",
        "sir",
        "sir_outbreak",
        "seir",
    ];

    pub fn new(model: Model, initial: Vec<f64>, grid: TimeGrid) -> Self {
        Self {
            model,
            initial,
            grid,
            method: Method::default(),
            clamp: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn clamp(&self) -> ClampPolicy {
        self.clamp.unwrap_or_else(|| self.model.default_clamp())
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.model.labels()
    }

    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.grid.validate()?;
        if self.initial.len() != self.model.labels().len() {
            return Err(Error::invalid(format!(
                "Initial state length ({}) does not match model dimension ({}).",
                self.initial.len(),
                self.model.labels().len()
            )));
        }
        Ok(())
    }

    pub fn run(&self) -> Result<SimulationResult> {
        self.validate()?;
        simulate(&self.model, &self.initial, &self.grid, self.method, self.clamp())
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "exponential_growth" => Some(Self::exponential_growth()),
            "logistic_growth" => Some(Self::logistic_growth()),
            "logistic_harvest" => Some(Self::logistic_harvest()),
            "sir" => Some(Self::sir()),
            "sir_outbreak" => Some(Self::sir_outbreak()),
            "seir" => Some(Self::seir()),
            _ => None,
        }
    }

    pub fn exponential_growth() -> Self {
        Self::new(
            Model::Exponential(Exponential { rate: 0.03 }),
            vec![100.0],
            TimeGrid::from_samples(0.0, 100.0, 200),
        )
    }

    pub fn logistic_growth() -> Self {
        Self::new(
            Model::Logistic(Logistic {
                rate: 0.1,
                capacity: 200.0,
            }),
            vec![50.0],
            TimeGrid::from_samples(0.0, 60.0, 500),
        )
    }

    pub fn logistic_harvest() -> Self {
        Self::new(
            Model::LogisticHarvest(LogisticHarvest {
                rate: 0.04,
                capacity: 750.0,
                harvest: 30.0,
            }),
            vec![200.0],
            TimeGrid::from_samples(0.0, 100.0, 200),
        )
    }

    pub fn sir() -> Self {
        let sir = Sir {
            beta: 0.3,
            gamma: 0.1,
            population: 1000.0,
        };
        Self::new(
            Model::Sir(sir),
            sir.initial_state(1.0, 0.0).to_vec(),
            TimeGrid::from_samples(0.0, 100.0, 200),
        )
    }

    /// 7138 people, one infected, `b = 1/7138` in the unnormalized form.
    pub fn sir_outbreak() -> Self {
        let sir = Sir::from_unnormalized(1.0 / 7138.0, 0.40, 7138.0);
        Self::new(
            Model::Sir(sir),
            sir.initial_state(1.0, 0.0).to_vec(),
            TimeGrid::from_samples(0.0, 40.0, 500),
        )
    }

    pub fn seir() -> Self {
        let seir = Seir {
            beta: 0.3,
            sigma: 0.2,
            gamma: 0.1,
            population: 1000.0,
        };
        Self::new(
            Model::Seir(seir),
            seir.initial_state(0.0, 1.0).to_vec(),
            TimeGrid::from_samples(0.0, 160.0, 300),
        )
    }
}
