pub mod reports;
pub mod simulation;
pub mod tester;

pub use simulation::{SimulationPlan, SimulationSummary, run_plan};
pub use tester::*;
