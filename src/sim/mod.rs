/// Net-energy battery step.
pub mod battery;
pub mod engine;
/// Hourly generation from weather and the power estimator.
pub mod generation;
pub mod kpi;
pub mod types;
