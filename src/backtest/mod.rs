pub mod metrics;
pub mod rules;
pub mod runner;
pub mod synthetic;

pub use metrics::BacktestMetrics;
pub use runner::{SimulationOutcome, Simulator};
pub use synthetic::{MarketScenario, SyntheticQuoteGenerator};
