// Core modules
pub mod backtest;
pub mod loader;
pub mod models;
pub mod orderblocks;

// Re-export commonly used types
pub use backtest::{BacktestMetrics, SimulationOutcome, Simulator};
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
