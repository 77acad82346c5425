//! Hour-by-hour solar generation and battery simulation for a single site.

pub mod config;
pub mod error;
/// Power fraction estimators.
pub mod estimator;
pub mod io;
/// Client-facing report record.
pub mod report;
pub mod request;
/// Generation, battery step, driver, and KPI modules.
pub mod sim;
pub mod weather;
