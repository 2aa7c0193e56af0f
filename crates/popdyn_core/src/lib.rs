/// The `popdyn_core` crate is the numerical engine behind the popdyn dashboard.
/// It integrates small systems of ODEs (population growth and epidemic models)
/// with fixed-step explicit methods and samples planar vector fields.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (right-hand sides), `Steppable` (solvers).
/// - **Solvers**: Explicit Euler and RK4 fixed-step integrators.
/// - **Simulation**: The `simulate` driver, clamp policies and `SimulationResult`.
/// - **Models**: Exponential, logistic (with harvest), SIR and SEIR.
/// - **Equation Engine**: A restricted expression language compiled to bytecode for user-defined fields.
/// - **Vector Field**: Grid sampling of planar fields with magnitude summaries.
pub mod equation_engine;
pub mod error;
pub mod models;
pub mod scenario;
pub mod simulation;
pub mod solvers;
pub mod traits;
pub mod vector_field;

pub use error::{Error, Result};
pub use models::Model;
pub use scenario::Scenario;
pub use simulation::{simulate, simulate_with, ClampPolicy, SimulationResult, TimeGrid};
pub use solvers::Method;
