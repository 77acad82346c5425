//! Simulation driver: runs generation and the battery step hour by hour.

use tracing::{debug, info, warn};

use crate::error::{SimError, ValidationError};
use crate::estimator::PowerEstimator;
use crate::weather::{WeatherFeed, WeatherSample};

use super::battery;
use super::generation::compute_generated_energy;
use super::types::{BatterySnapshot, BatteryState, HourlyResult, SimulationConfig, SimulationReport};

/// Runs a full simulation over `samples`, one sample per hour.
///
/// # Errors
///
/// Returns `SimError::Validation` if the config is out of range or the
/// sample count differs from `config.duration_hours`, and
/// `SimError::Estimator` (with the hour index) if the estimator fails. A
/// failed hour aborts the whole run.
pub fn run<E>(
    config: &SimulationConfig,
    samples: &[WeatherSample],
    estimator: &E,
) -> Result<SimulationReport, SimError>
where
    E: PowerEstimator + ?Sized,
{
    let engine = Engine::new(config.clone(), estimator)?;
    engine.run(samples)
}

/// Fetches one sample per hour from `feed` and runs the simulation.
///
/// # Errors
///
/// Returns `SimError::Validation` for an out-of-range config,
/// `SimError::Feed` if the feed cannot supply every hour, and
/// `SimError::Estimator` if any hour fails.
pub fn run_with_feed<E>(
    config: &SimulationConfig,
    feed: &mut dyn WeatherFeed,
    estimator: &E,
) -> Result<SimulationReport, SimError>
where
    E: PowerEstimator + ?Sized,
{
    config.validate()?;
    let samples = feed.fetch(config.duration_hours)?;
    info!(hours = samples.len(), "weather loaded");
    run(config, &samples, estimator)
}

/// Simulation state for one run.
///
/// Owns the battery state exclusively; the estimator is borrowed and only
/// ever called through `&self`.
pub struct Engine<'a, E: PowerEstimator + ?Sized> {
    config: SimulationConfig,
    estimator: &'a E,
    battery: BatteryState,
    total_generated_kwh: f64,
    total_to_battery_kwh: f64,
    total_from_battery_kwh: f64,
    total_unmet_kwh: f64,
    hourly: Vec<HourlyResult>,
}

impl<'a, E: PowerEstimator + ?Sized> Engine<'a, E> {
    /// Creates an engine with the battery at the (clamped) initial capacity.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the config is out of range.
    pub fn new(config: SimulationConfig, estimator: &'a E) -> Result<Self, ValidationError> {
        config.validate()?;

        let battery = BatteryState::clamped(
            config.initial_battery_capacity_kwh,
            config.max_battery_capacity_kwh,
        );
        if battery.current_capacity_kwh != config.initial_battery_capacity_kwh {
            warn!(
                requested_kwh = config.initial_battery_capacity_kwh,
                clamped_kwh = battery.current_capacity_kwh,
                "initial battery capacity outside [0, max], clamped"
            );
        }

        let hours = config.duration_hours;
        Ok(Self {
            config,
            estimator,
            battery,
            total_generated_kwh: 0.0,
            total_to_battery_kwh: 0.0,
            total_from_battery_kwh: 0.0,
            total_unmet_kwh: 0.0,
            hourly: Vec::with_capacity(hours),
        })
    }

    /// Simulates the next hour and records it.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Validation` if every hour of the horizon has
    /// already been simulated, and `SimError::Estimator` if the estimator
    /// fails for this sample.
    pub fn step(&mut self, sample: &WeatherSample) -> Result<&HourlyResult, SimError> {
        let hour = self.hourly.len();
        let cfg = &self.config;
        if hour >= cfg.duration_hours {
            return Err(ValidationError::SampleCountMismatch {
                expected: cfg.duration_hours,
                actual: hour + 1,
            }
            .into());
        }

        let generated_kwh = compute_generated_energy(
            sample,
            self.estimator,
            cfg.max_grid_power_kw,
            cfg.system_loss_fraction,
        )
        .map_err(|source| SimError::Estimator { hour, source })?;

        let consumption_kwh = cfg.energy_consumption_kwh_per_hour;
        let (battery, flows) = battery::step(
            self.battery,
            generated_kwh,
            consumption_kwh,
            cfg.max_battery_capacity_kwh,
        );
        self.battery = battery;

        self.total_generated_kwh += generated_kwh;
        self.total_to_battery_kwh += flows.to_battery_kwh;
        self.total_from_battery_kwh += flows.from_battery_kwh;
        self.total_unmet_kwh += flows.unmet_kwh;

        let result = HourlyResult {
            hour,
            generated_energy_kwh: generated_kwh,
            consumption_kwh,
            battery_level_kwh: battery.current_capacity_kwh,
            energy_to_battery_kwh: flows.to_battery_kwh,
            energy_from_battery_kwh: flows.from_battery_kwh,
            unmet_energy_kwh: flows.unmet_kwh,
            status: flows.status,
        };
        debug!(
            hour,
            generated_kwh,
            battery_kwh = result.battery_level_kwh,
            unmet_kwh = result.unmet_energy_kwh,
            status = %result.status,
            "simulated hour"
        );
        self.hourly.push(result);
        Ok(&self.hourly[hour])
    }

    /// Runs every sample in order and assembles the report.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Validation` on a sample-count mismatch and
    /// `SimError::Estimator` if any hour fails.
    pub fn run(mut self, samples: &[WeatherSample]) -> Result<SimulationReport, SimError> {
        let expected = self.config.duration_hours.saturating_sub(self.hourly.len());
        if samples.len() != expected {
            return Err(ValidationError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            }
            .into());
        }

        for sample in samples {
            self.step(sample)?;
        }

        let report = self.finish();
        info!(
            hours = report.hourly.len(),
            generated_kwh = report.total_energy_generated_kwh,
            unmet_kwh = report.total_unmet_energy_kwh,
            final_battery_kwh = report.final_battery.capacity_kwh,
            "simulation complete"
        );
        Ok(report)
    }

    /// Current battery state.
    pub fn battery(&self) -> BatteryState {
        self.battery
    }

    fn finish(self) -> SimulationReport {
        SimulationReport {
            total_energy_generated_kwh: self.total_generated_kwh,
            total_energy_to_battery_kwh: self.total_to_battery_kwh,
            total_energy_from_battery_kwh: self.total_from_battery_kwh,
            total_unmet_energy_kwh: self.total_unmet_kwh,
            final_battery: BatterySnapshot::new(
                self.battery,
                self.config.max_battery_capacity_kwh,
            ),
            hourly: self.hourly,
        }
    }
}
