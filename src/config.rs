//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::estimator::LinearEstimator;
use crate::request::ValidatedRequest;
use crate::sim::types::{DEFAULT_SYSTEM_LOSS_FRACTION, SimulationConfig};
use crate::weather::{CsvWeatherFeed, SyntheticWeather, SyntheticWeatherFeed, WeatherFeed};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Where the array is and when the run starts.
    #[serde(default)]
    pub site: SiteConfig,
    /// Inverter and wiring parameters.
    #[serde(default)]
    pub system: SystemConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Household load.
    #[serde(default)]
    pub load: LoadConfig,
    /// Simulation horizon.
    #[serde(default)]
    pub simulation: HorizonConfig,
    /// Weather source.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Power fraction model coefficients.
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

/// Site location and start of the simulated window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Hour of day (0-23) of the first simulated hour.
    pub start_hour: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            latitude: 52.52,
            longitude: 13.41,
            start_hour: 0,
        }
    }
}

/// Inverter and wiring parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    /// Rated grid power (kW).
    pub max_grid_power_kw: f64,
    /// Derating applied to estimated power (0.0-1.0, exclusive).
    pub system_loss_fraction: f64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_grid_power_kw: 5.0,
            system_loss_fraction: DEFAULT_SYSTEM_LOSS_FRACTION,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable capacity (kWh). Zero disables storage.
    pub max_capacity_kwh: f64,
    /// Charge at the first hour (kWh).
    pub initial_capacity_kwh: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            max_capacity_kwh: 10.0,
            initial_capacity_kwh: 5.0,
        }
    }
}

/// Household load.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Constant consumption every hour (kWh).
    pub consumption_kwh_per_hour: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            consumption_kwh_per_hour: 1.0,
        }
    }
}

/// Simulation horizon.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HorizonConfig {
    /// Number of hours to simulate (must be > 0).
    pub duration_hours: usize,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self { duration_hours: 24 }
    }
}

/// Weather source and synthetic generator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Source: `"synthetic"` or `"csv"`.
    pub source: String,
    /// CSV file for the `"csv"` source.
    pub csv_path: Option<PathBuf>,
    /// `time` label of the first row to use from the CSV.
    pub start_time: Option<String>,
    /// Seed for the synthetic generator.
    pub seed: u64,
    /// Sunrise hour of day (inclusive).
    pub sunrise_hour: usize,
    /// Sunset hour of day (exclusive).
    pub sunset_hour: usize,
    /// Clear-sky direct irradiance at noon (W/m²).
    pub peak_direct_wm2: f64,
    /// Clear-sky diffuse irradiance at noon (W/m²).
    pub peak_diffuse_wm2: f64,
    /// AR(1) persistence of the cloud multiplier (0.0-1.0).
    pub cloud_alpha: f64,
    /// AR(1) innovation noise standard deviation.
    pub cloud_noise_std: f64,
    /// Daily mean temperature (°C).
    pub temp_mean_c: f64,
    /// Half the daily temperature swing (°C).
    pub temp_amplitude_c: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        let synthetic = SyntheticWeather::default();
        Self {
            source: "synthetic".to_string(),
            csv_path: None,
            start_time: None,
            seed: 42,
            sunrise_hour: synthetic.sunrise_hour,
            sunset_hour: synthetic.sunset_hour,
            peak_direct_wm2: synthetic.peak_direct_wm2,
            peak_diffuse_wm2: synthetic.peak_diffuse_wm2,
            cloud_alpha: synthetic.cloud_alpha,
            cloud_noise_std: synthetic.cloud_noise_std,
            temp_mean_c: synthetic.temp_mean_c,
            temp_amplitude_c: synthetic.temp_amplitude_c,
        }
    }
}

/// Linear power fraction model coefficients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimatorConfig {
    /// Weight on direct irradiance (kW/m²).
    pub direct_weight: f64,
    /// Weight on diffuse irradiance (kW/m²).
    pub diffuse_weight: f64,
    /// Weight on temperature (°C).
    pub temperature_weight: f64,
    pub intercept: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        let model = LinearEstimator::default();
        Self {
            direct_weight: model.weights[0],
            diffuse_weight: model.weights[1],
            temperature_weight: model.weights[2],
            intercept: model.intercept,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.max_capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: a 5 kW array with a 10 kWh battery
    /// over one clear-ish day.
    pub fn baseline() -> Self {
        Self {
            site: SiteConfig::default(),
            system: SystemConfig::default(),
            battery: BatteryConfig::default(),
            load: LoadConfig::default(),
            simulation: HorizonConfig::default(),
            weather: WeatherConfig::default(),
            estimator: EstimatorConfig::default(),
        }
    }

    /// Returns the cloudy preset: two overcast days with persistent cloud
    /// cover and weak direct irradiance.
    pub fn cloudy() -> Self {
        Self {
            simulation: HorizonConfig { duration_hours: 48 },
            weather: WeatherConfig {
                peak_direct_wm2: 450.0,
                peak_diffuse_wm2: 180.0,
                cloud_alpha: 0.95,
                cloud_noise_std: 0.35,
                temp_mean_c: 11.0,
                temp_amplitude_c: 3.0,
                ..WeatherConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the no-battery preset: the baseline array without storage.
    pub fn no_battery() -> Self {
        Self {
            battery: BatteryConfig {
                max_capacity_kwh: 0.0,
                initial_capacity_kwh: 0.0,
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "cloudy", "no_battery"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "cloudy" => Ok(Self::cloudy()),
            "no_battery" => Ok(Self::no_battery()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Builds a scenario around a validated client request. Weather and
    /// estimator settings keep their baseline values.
    pub fn from_request(request: &ValidatedRequest) -> Self {
        let cfg = &request.config;
        Self {
            site: SiteConfig {
                latitude: request.latitude,
                longitude: request.longitude,
                ..SiteConfig::default()
            },
            system: SystemConfig {
                max_grid_power_kw: cfg.max_grid_power_kw,
                system_loss_fraction: cfg.system_loss_fraction,
            },
            battery: BatteryConfig {
                max_capacity_kwh: cfg.max_battery_capacity_kwh,
                initial_capacity_kwh: cfg.initial_battery_capacity_kwh,
            },
            load: LoadConfig {
                consumption_kwh_per_hour: cfg.energy_consumption_kwh_per_hour,
            },
            simulation: HorizonConfig {
                duration_hours: cfg.duration_hours,
            },
            ..Self::baseline()
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. An initial battery
    /// charge outside `[0, max_capacity_kwh]` is allowed; it is clamped at
    /// run start.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let site = &self.site;
        if !(-90.0..=90.0).contains(&site.latitude) {
            errors.push(ConfigError::new("site.latitude", "must be in [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&site.longitude) {
            errors.push(ConfigError::new("site.longitude", "must be in [-180, 180]"));
        }
        if site.start_hour >= 24 {
            errors.push(ConfigError::new("site.start_hour", "must be < 24"));
        }

        let sys = &self.system;
        if !(sys.max_grid_power_kw > 0.0 && sys.max_grid_power_kw.is_finite()) {
            errors.push(ConfigError::new("system.max_grid_power_kw", "must be > 0"));
        }
        if !(0.0..1.0).contains(&sys.system_loss_fraction) {
            errors.push(ConfigError::new(
                "system.system_loss_fraction",
                "must be in [0.0, 1.0)",
            ));
        }

        let bat = &self.battery;
        if !(bat.max_capacity_kwh >= 0.0 && bat.max_capacity_kwh.is_finite()) {
            errors.push(ConfigError::new("battery.max_capacity_kwh", "must be >= 0"));
        }
        if !bat.initial_capacity_kwh.is_finite() {
            errors.push(ConfigError::new(
                "battery.initial_capacity_kwh",
                "must be a finite number",
            ));
        }

        let load = self.load.consumption_kwh_per_hour;
        if !(load >= 0.0 && load.is_finite()) {
            errors.push(ConfigError::new(
                "load.consumption_kwh_per_hour",
                "must be >= 0",
            ));
        }

        if self.simulation.duration_hours == 0 {
            errors.push(ConfigError::new("simulation.duration_hours", "must be > 0"));
        }

        let w = &self.weather;
        match w.source.as_str() {
            "synthetic" => {}
            "csv" => {
                if w.csv_path.is_none() {
                    errors.push(ConfigError::new(
                        "weather.csv_path",
                        "required when weather.source = \"csv\"",
                    ));
                }
            }
            other => errors.push(ConfigError::new(
                "weather.source",
                format!("must be \"synthetic\" or \"csv\", got \"{other}\""),
            )),
        }
        if w.sunrise_hour >= w.sunset_hour {
            errors.push(ConfigError::new(
                "weather.sunrise_hour",
                "must be < weather.sunset_hour",
            ));
        }
        if w.sunset_hour > 24 {
            errors.push(ConfigError::new("weather.sunset_hour", "must be <= 24"));
        }
        if w.peak_direct_wm2 < 0.0 || w.peak_diffuse_wm2 < 0.0 {
            errors.push(ConfigError::new(
                "weather.peak_direct_wm2",
                "peak irradiance must be >= 0",
            ));
        }
        if !(0.0..=1.0).contains(&w.cloud_alpha) {
            errors.push(ConfigError::new("weather.cloud_alpha", "must be in [0.0, 1.0]"));
        }
        if w.cloud_noise_std < 0.0 {
            errors.push(ConfigError::new("weather.cloud_noise_std", "must be >= 0"));
        }

        let est = &self.estimator;
        let coefficients = [
            ("estimator.direct_weight", est.direct_weight),
            ("estimator.diffuse_weight", est.diffuse_weight),
            ("estimator.temperature_weight", est.temperature_weight),
            ("estimator.intercept", est.intercept),
        ];
        for (field, value) in coefficients {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be a finite number"));
            }
        }

        errors
    }

    /// Engine configuration for this scenario.
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            max_grid_power_kw: self.system.max_grid_power_kw,
            max_battery_capacity_kwh: self.battery.max_capacity_kwh,
            initial_battery_capacity_kwh: self.battery.initial_capacity_kwh,
            energy_consumption_kwh_per_hour: self.load.consumption_kwh_per_hour,
            duration_hours: self.simulation.duration_hours,
            system_loss_fraction: self.system.system_loss_fraction,
        }
    }

    /// Power fraction model for this scenario.
    pub fn estimator(&self) -> LinearEstimator {
        let e = &self.estimator;
        LinearEstimator::new(
            [e.direct_weight, e.diffuse_weight, e.temperature_weight],
            e.intercept,
        )
    }

    /// Builds the configured weather feed.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the source is unknown, the daylight hours
    /// are inconsistent, or the CSV file cannot be loaded.
    pub fn weather_feed(&self) -> Result<Box<dyn WeatherFeed>, ConfigError> {
        let w = &self.weather;
        match w.source.as_str() {
            "synthetic" => {
                if w.sunrise_hour >= w.sunset_hour || w.sunset_hour > 24 {
                    return Err(ConfigError::new(
                        "weather.sunrise_hour",
                        "daylight hours must satisfy sunrise < sunset <= 24",
                    ));
                }
                let params = SyntheticWeather {
                    start_hour: self.site.start_hour,
                    sunrise_hour: w.sunrise_hour,
                    sunset_hour: w.sunset_hour,
                    peak_direct_wm2: w.peak_direct_wm2,
                    peak_diffuse_wm2: w.peak_diffuse_wm2,
                    cloud_alpha: w.cloud_alpha,
                    cloud_noise_std: w.cloud_noise_std,
                    temp_mean_c: w.temp_mean_c,
                    temp_amplitude_c: w.temp_amplitude_c,
                };
                Ok(Box::new(SyntheticWeatherFeed::new(params, w.seed)))
            }
            "csv" => {
                let path = w.csv_path.as_deref().ok_or_else(|| {
                    ConfigError::new("weather.csv_path", "required when weather.source = \"csv\"")
                })?;
                let mut feed = CsvWeatherFeed::from_path(path).map_err(|e| {
                    ConfigError::new("weather.csv_path", format!("{}: {e}", path.display()))
                })?;
                if let Some(start) = &w.start_time {
                    feed = feed.starting_at(start.clone());
                }
                Ok(Box::new(feed))
            }
            other => Err(ConfigError::new(
                "weather.source",
                format!("must be \"synthetic\" or \"csv\", got \"{other}\""),
            )),
        }
    }
}
