//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use solar_sim::config::ScenarioConfig;
use solar_sim::error::EstimatorError;
use solar_sim::estimator::PowerFeatures;
use solar_sim::sim::types::{HourlyResult, SimulationConfig, SimulationReport};
use solar_sim::weather::WeatherSample;

/// Tolerance for energy balance checks.
pub const EPS: f64 = 1e-9;

/// Estimator whose power fraction equals the direct irradiance in kW/m².
pub fn passthrough(f: &PowerFeatures) -> Result<f64, EstimatorError> {
    Ok(f.direct_normalized)
}

/// Samples that generate exactly `kwh` per hour under [`lossless_config`]
/// with [`passthrough`].
pub fn samples_for(kwh: &[f64]) -> Vec<WeatherSample> {
    kwh.iter()
        .map(|e| WeatherSample::new(20.0, e * 100.0, 0.0))
        .collect()
}

/// 10 kW system without derating.
pub fn lossless_config(
    max_battery_kwh: f64,
    initial_kwh: f64,
    load_kwh: f64,
    hours: usize,
) -> SimulationConfig {
    SimulationConfig {
        system_loss_fraction: 0.0,
        ..SimulationConfig::new(10.0, max_battery_kwh, initial_kwh, load_kwh, hours)
    }
}

/// Runs a scenario end to end with its own weather feed and estimator.
pub fn run_scenario(scenario: &ScenarioConfig) -> SimulationReport {
    let config = scenario.simulation_config();
    let mut feed = scenario.weather_feed().expect("weather feed should build");
    let samples = feed
        .fetch(config.duration_hours)
        .expect("feed should yield every hour");
    solar_sim::sim::engine::run(&config, &samples, &scenario.estimator())
        .expect("scenario should run")
}

/// Checks the per-hour invariants and the run totals.
pub fn assert_invariants(report: &SimulationReport, config: &SimulationConfig) {
    let max = config.max_battery_capacity_kwh;
    let mut previous = config.initial_battery_capacity_kwh.clamp(0.0, max);

    for h in &report.hourly {
        assert!(
            h.generated_energy_kwh >= 0.0 && h.generated_energy_kwh <= config.max_grid_power_kw,
            "hour {}: generation {} outside [0, rated]",
            h.hour,
            h.generated_energy_kwh
        );
        assert!(
            h.battery_level_kwh >= 0.0 && h.battery_level_kwh <= max + EPS,
            "hour {}: battery {} outside [0, {max}]",
            h.hour,
            h.battery_level_kwh
        );
        assert!(
            h.energy_to_battery_kwh == 0.0 || h.energy_from_battery_kwh == 0.0,
            "hour {}: battery charged and discharged in the same hour",
            h.hour
        );
        assert!(h.unmet_energy_kwh >= 0.0);

        let delta = h.battery_level_kwh - previous;
        assert!(
            (delta - (h.energy_to_battery_kwh - h.energy_from_battery_kwh)).abs() < EPS,
            "hour {}: battery delta does not match flows",
            h.hour
        );
        previous = h.battery_level_kwh;
    }

    assert!((report.total_energy_generated_kwh - total(report, |h| h.generated_energy_kwh)).abs() < EPS);
    assert!((report.total_energy_to_battery_kwh - total(report, |h| h.energy_to_battery_kwh)).abs() < EPS);
    assert!(
        (report.total_energy_from_battery_kwh - total(report, |h| h.energy_from_battery_kwh)).abs() < EPS
    );
    assert!((report.total_unmet_energy_kwh - total(report, |h| h.unmet_energy_kwh)).abs() < EPS);
    assert_eq!(report.final_battery.capacity_kwh, previous);
}

/// Sums one per-hour field over the run.
pub fn total(report: &SimulationReport, f: impl Fn(&HourlyResult) -> f64) -> f64 {
    report.hourly.iter().map(f).sum()
}
