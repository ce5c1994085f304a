pub mod agent;
pub mod policies;
pub mod metrics;
pub mod simulation;

pub use agent::{Agent, Population};
pub use policies::{Action, Outcome, Policy};
pub use simulation::{Simulation, SimConfig};
pub use metrics::MetricsCollector;

pub mod prelude {
    pub use crate::agent::{Agent, Population};
    pub use crate::policies::{Action, Belief, Outcome, Policy, PolicyRegistry};
    pub use crate::simulation::{ConvergenceResult, ExperimentRunner, SimConfig, Simulation};
    pub use crate::metrics::{MetricsCollector, RoundObserver};
}
