//! Simulation requests as submitted by a client, and their validation.
//!
//! A request names a site and a system. Validation happens before any
//! weather is fetched; it collects every missing field at once so the
//! caller can report them together.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::sim::types::{DEFAULT_SYSTEM_LOSS_FRACTION, SimulationConfig};

/// Raw request body. Every field is optional here so that missing fields
/// can be reported by name instead of as a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationRequest {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    /// Rated grid power (kW).
    pub max_grid_power: Option<Value>,
    /// Battery size (kWh).
    pub max_battery_capacity: Option<Value>,
    /// Battery charge now (kWh).
    pub current_battery_capacity: Option<Value>,
    /// Constant load (kWh per hour).
    pub energy_consumption: Option<Value>,
    pub duration_hours: Option<Value>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub config: SimulationConfig,
}

const REQUIRED: [&str; 7] = [
    "latitude",
    "longitude",
    "max_grid_power",
    "max_battery_capacity",
    "current_battery_capacity",
    "energy_consumption",
    "duration_hours",
];

impl SimulationRequest {
    /// Parses a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the body is not a JSON object.
    pub fn from_json(body: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(body)
            .map_err(|e| ValidationError::invalid("body", format!("expected a JSON object: {e}")))
    }

    fn field(&self, name: &str) -> Option<&Value> {
        let value = match name {
            "latitude" => self.latitude.as_ref(),
            "longitude" => self.longitude.as_ref(),
            "max_grid_power" => self.max_grid_power.as_ref(),
            "max_battery_capacity" => self.max_battery_capacity.as_ref(),
            "current_battery_capacity" => self.current_battery_capacity.as_ref(),
            "energy_consumption" => self.energy_consumption.as_ref(),
            "duration_hours" => self.duration_hours.as_ref(),
            _ => None,
        };
        value.filter(|v| !v.is_null())
    }

    /// Validates every field and builds the simulation config.
    ///
    /// A `current_battery_capacity` outside `[0, max_battery_capacity]` is
    /// accepted and clamped when the simulation starts.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingFields` listing every absent field,
    /// or `ValidationError::InvalidField` for the first out-of-range value.
    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        let missing: Vec<&'static str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| self.field(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let latitude = self.number("latitude")?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::invalid("latitude", "must be in [-90, 90]"));
        }
        let longitude = self.number("longitude")?;
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::invalid("longitude", "must be in [-180, 180]"));
        }

        let max_grid_power = self.number("max_grid_power")?;
        if max_grid_power <= 0.0 {
            return Err(ValidationError::invalid("max_grid_power", "must be > 0"));
        }
        let max_battery_capacity = self.non_negative("max_battery_capacity")?;
        let current_battery_capacity = self.number("current_battery_capacity")?;
        let energy_consumption = self.non_negative("energy_consumption")?;
        let duration_hours = self.hours()?;

        Ok(ValidatedRequest {
            latitude,
            longitude,
            config: SimulationConfig {
                max_grid_power_kw: max_grid_power,
                max_battery_capacity_kwh: max_battery_capacity,
                initial_battery_capacity_kwh: current_battery_capacity,
                energy_consumption_kwh_per_hour: energy_consumption,
                duration_hours,
                system_loss_fraction: DEFAULT_SYSTEM_LOSS_FRACTION,
            },
        })
    }

    /// Reads a finite number. Numeric strings are accepted, since form
    /// clients commonly send them.
    fn number(&self, name: &'static str) -> Result<f64, ValidationError> {
        let value = self
            .field(name)
            .ok_or_else(|| ValidationError::MissingFields(vec![name]))?;
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match n {
            Some(n) if n.is_finite() => Ok(n),
            _ => Err(ValidationError::invalid(name, "expected a number")),
        }
    }

    fn non_negative(&self, name: &'static str) -> Result<f64, ValidationError> {
        let n = self.number(name)?;
        if n < 0.0 {
            return Err(ValidationError::invalid(name, "must be >= 0"));
        }
        Ok(n)
    }

    fn hours(&self) -> Result<usize, ValidationError> {
        let n = self.number("duration_hours")?;
        if n.fract() != 0.0 {
            return Err(ValidationError::invalid(
                "duration_hours",
                "expected a whole number of hours",
            ));
        }
        if n <= 0.0 {
            return Err(ValidationError::invalid("duration_hours", "must be > 0"));
        }
        if n > MAX_DURATION_HOURS as f64 {
            return Err(ValidationError::invalid(
                "duration_hours",
                format!("must be <= {MAX_DURATION_HOURS}"),
            ));
        }
        Ok(n as usize)
    }
}

/// Longest horizon a request may ask for (16 days of hourly forecast).
pub const MAX_DURATION_HOURS: usize = 384;
