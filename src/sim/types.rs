//! Core simulation types: configuration, battery state, hourly records and the final report.

use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;

/// Fraction of generated power lost to inverter and wiring inefficiency.
pub const DEFAULT_SYSTEM_LOSS_FRACTION: f64 = 0.15;

/// Static inputs for one simulation run.
///
/// # Examples
///
/// ```
/// use solar_sim::sim::types::SimulationConfig;
///
/// let cfg = SimulationConfig::new(5.0, 10.0, 4.0, 1.2, 24);
/// assert_eq!(cfg.system_loss_fraction, 0.15);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    /// Rated grid power; generation never exceeds this (kW, > 0).
    pub max_grid_power_kw: f64,
    /// Usable battery capacity (kWh, >= 0).
    pub max_battery_capacity_kwh: f64,
    /// Battery charge at the start of the run (kWh). Clamped to
    /// `[0, max_battery_capacity_kwh]` when the run starts.
    pub initial_battery_capacity_kwh: f64,
    /// Constant load drawn every hour (kWh, >= 0).
    pub energy_consumption_kwh_per_hour: f64,
    /// Number of hours to simulate (> 0).
    pub duration_hours: usize,
    /// System derating in `[0, 1)`.
    pub system_loss_fraction: f64,
}

impl SimulationConfig {
    /// Creates a configuration with the default system loss.
    pub fn new(
        max_grid_power_kw: f64,
        max_battery_capacity_kwh: f64,
        initial_battery_capacity_kwh: f64,
        energy_consumption_kwh_per_hour: f64,
        duration_hours: usize,
    ) -> Self {
        Self {
            max_grid_power_kw,
            max_battery_capacity_kwh,
            initial_battery_capacity_kwh,
            energy_consumption_kwh_per_hour,
            duration_hours,
            system_loss_fraction: DEFAULT_SYSTEM_LOSS_FRACTION,
        }
    }

    /// Checks every field against its physical range.
    ///
    /// The initial battery capacity is only required to be finite; values
    /// outside `[0, max]` are clamped when the run starts.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let finite = [
            ("max_grid_power_kw", self.max_grid_power_kw),
            ("max_battery_capacity_kwh", self.max_battery_capacity_kwh),
            (
                "initial_battery_capacity_kwh",
                self.initial_battery_capacity_kwh,
            ),
            (
                "energy_consumption_kwh_per_hour",
                self.energy_consumption_kwh_per_hour,
            ),
            ("system_loss_fraction", self.system_loss_fraction),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ValidationError::invalid(field, "must be a finite number"));
            }
        }

        if self.max_grid_power_kw <= 0.0 {
            return Err(ValidationError::invalid("max_grid_power_kw", "must be > 0"));
        }
        if self.max_battery_capacity_kwh < 0.0 {
            return Err(ValidationError::invalid(
                "max_battery_capacity_kwh",
                "must be >= 0",
            ));
        }
        if self.energy_consumption_kwh_per_hour < 0.0 {
            return Err(ValidationError::invalid(
                "energy_consumption_kwh_per_hour",
                "must be >= 0",
            ));
        }
        if self.duration_hours == 0 {
            return Err(ValidationError::invalid("duration_hours", "must be > 0"));
        }
        if !(0.0..1.0).contains(&self.system_loss_fraction) {
            return Err(ValidationError::invalid(
                "system_loss_fraction",
                "must be in [0.0, 1.0)",
            ));
        }
        Ok(())
    }
}

/// Battery charge carried from hour to hour within one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryState {
    pub current_capacity_kwh: f64,
}

impl BatteryState {
    /// Creates a state with `capacity_kwh` clamped to `[0, max_capacity_kwh]`.
    pub fn clamped(capacity_kwh: f64, max_capacity_kwh: f64) -> Self {
        Self {
            current_capacity_kwh: capacity_kwh.clamp(0.0, max_capacity_kwh.max(0.0)),
        }
    }
}

/// What the battery did during one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryStatus {
    /// Generation exactly covered consumption, or nothing could move.
    Idle,
    /// Surplus was stored.
    Charging,
    /// Deficit was covered (at least partly) from the battery.
    Discharging,
    /// Surplus existed but the battery had no headroom.
    Full,
    /// Deficit existed but the battery held nothing.
    Empty,
}

impl BatteryStatus {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Battery idle",
            Self::Charging => "Charging battery",
            Self::Discharging => "Discharging battery",
            Self::Full => "Battery full, excess energy cannot be stored",
            Self::Empty => "Battery empty, unable to meet demand",
        }
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Energy moved during one battery step (all kWh, >= 0).
///
/// `to_battery_kwh` and `from_battery_kwh` are never both positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyFlows {
    pub to_battery_kwh: f64,
    pub from_battery_kwh: f64,
    /// Demand neither generation nor the battery could cover.
    pub unmet_kwh: f64,
    pub status: BatteryStatus,
}

/// Complete record of one simulated hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyResult {
    /// Hour index within the horizon (0 = first hour).
    pub hour: usize,
    pub generated_energy_kwh: f64,
    pub consumption_kwh: f64,
    /// Battery charge after this hour's update.
    pub battery_level_kwh: f64,
    pub energy_to_battery_kwh: f64,
    pub energy_from_battery_kwh: f64,
    pub unmet_energy_kwh: f64,
    pub status: BatteryStatus,
}

impl HourlyResult {
    /// Generation minus consumption.
    pub fn net_energy_kwh(&self) -> f64 {
        self.generated_energy_kwh - self.consumption_kwh
    }
}

impl fmt::Display for HourlyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>3} | gen={:>6.2} kWh  load={:>5.2} kWh | battery={:>6.2} kWh \
             (+{:.2} / -{:.2}) | unmet={:.2} kWh | {}",
            self.hour,
            self.generated_energy_kwh,
            self.consumption_kwh,
            self.battery_level_kwh,
            self.energy_to_battery_kwh,
            self.energy_from_battery_kwh,
            self.unmet_energy_kwh,
            self.status,
        )
    }
}

/// Battery charge at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatterySnapshot {
    pub capacity_kwh: f64,
    pub max_capacity_kwh: f64,
    /// `capacity_kwh / max_capacity_kwh`, or 0.0 for a zero-size battery.
    pub percentage: f64,
}

impl BatterySnapshot {
    pub fn new(state: BatteryState, max_capacity_kwh: f64) -> Self {
        let percentage = if max_capacity_kwh > 0.0 {
            state.current_capacity_kwh / max_capacity_kwh
        } else {
            0.0
        };
        Self {
            capacity_kwh: state.current_capacity_kwh,
            max_capacity_kwh,
            percentage,
        }
    }
}

/// Aggregate outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub total_energy_generated_kwh: f64,
    pub total_energy_to_battery_kwh: f64,
    pub total_energy_from_battery_kwh: f64,
    pub total_unmet_energy_kwh: f64,
    pub final_battery: BatterySnapshot,
    /// One entry per hour, in chronological order.
    pub hourly: Vec<HourlyResult>,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Report ({} h) ---", self.hourly.len())?;
        writeln!(
            f,
            "Energy generated:      {:.2} kWh",
            self.total_energy_generated_kwh
        )?;
        writeln!(
            f,
            "Stored in battery:     {:.2} kWh",
            self.total_energy_to_battery_kwh
        )?;
        writeln!(
            f,
            "Drawn from battery:    {:.2} kWh",
            self.total_energy_from_battery_kwh
        )?;
        writeln!(
            f,
            "Unmet demand:          {:.2} kWh",
            self.total_unmet_energy_kwh
        )?;
        write!(
            f,
            "Final battery:         {:.2} / {:.2} kWh ({:.1}%)",
            self.final_battery.capacity_kwh,
            self.final_battery.max_capacity_kwh,
            self.final_battery.percentage * 100.0
        )
    }
}
