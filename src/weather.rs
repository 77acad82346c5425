//! Hourly weather samples and the feeds that produce them.
//!
//! The simulation core only ever sees an ordered `&[WeatherSample]`. Feeds
//! are responsible for producing exactly as many samples as hours requested,
//! aligned to the first simulated hour.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FeedError;

/// One hour's forecast input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Air temperature (°C).
    pub temperature_c: f64,
    /// Direct normal irradiance (W/m², >= 0).
    pub direct_irradiance_wm2: f64,
    /// Diffuse horizontal irradiance (W/m², >= 0).
    pub diffuse_irradiance_wm2: f64,
}

impl WeatherSample {
    pub fn new(temperature_c: f64, direct_irradiance_wm2: f64, diffuse_irradiance_wm2: f64) -> Self {
        Self {
            temperature_c,
            direct_irradiance_wm2,
            diffuse_irradiance_wm2,
        }
    }

    /// Checks that every field is finite and irradiance is non-negative.
    fn check(&self, index: usize) -> Result<(), FeedError> {
        let fields = [
            ("temperature_c", self.temperature_c),
            ("direct_irradiance_wm2", self.direct_irradiance_wm2),
            ("diffuse_irradiance_wm2", self.diffuse_irradiance_wm2),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(FeedError::InvalidSample {
                    index,
                    message: format!("{name} is not finite"),
                });
            }
        }
        if self.direct_irradiance_wm2 < 0.0 || self.diffuse_irradiance_wm2 < 0.0 {
            return Err(FeedError::InvalidSample {
                index,
                message: "irradiance must be >= 0".to_string(),
            });
        }
        Ok(())
    }
}

/// A source of hourly weather samples.
pub trait WeatherFeed {
    /// Returns exactly `hours` samples in chronological order.
    ///
    /// # Errors
    ///
    /// Returns a `FeedError` if the source cannot be read, is malformed, or
    /// holds fewer samples than requested.
    fn fetch(&mut self, hours: usize) -> Result<Vec<WeatherSample>, FeedError>;
}

/// Finds the index of `start` in `labels`, falling back to the beginning of
/// the window when the label is absent.
///
/// A feed that cannot line up with the requested hour still returns data
/// from index 0; timestamps are never validated beyond this lookup.
pub fn align_window(labels: &[String], start: Option<&str>) -> usize {
    let Some(start) = start else {
        return 0;
    };
    match labels.iter().position(|label| label == start) {
        Some(idx) => idx,
        None => {
            warn!(start, "start hour not found in weather window, using index 0");
            0
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherRow {
    #[serde(default)]
    time: Option<String>,
    temperature_c: f64,
    direct_irradiance_wm2: f64,
    diffuse_irradiance_wm2: f64,
}

/// Weather feed backed by a CSV export of an hourly forecast.
///
/// Expected header: `time,temperature_c,direct_irradiance_wm2,diffuse_irradiance_wm2`.
/// The `time` column is optional and only used for alignment.
#[derive(Debug, Clone)]
pub struct CsvWeatherFeed {
    labels: Vec<String>,
    samples: Vec<WeatherSample>,
    start: Option<String>,
}

impl CsvWeatherFeed {
    /// Reads all rows from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns a `FeedError` if the file cannot be opened or a row is malformed.
    pub fn from_path(path: &Path) -> Result<Self, FeedError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads all rows from any CSV source.
    ///
    /// # Errors
    ///
    /// Returns a `FeedError` if a row cannot be parsed or holds invalid values.
    pub fn from_reader(reader: impl Read) -> Result<Self, FeedError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut labels = Vec::new();
        let mut samples = Vec::new();
        for (index, row) in rdr.deserialize::<WeatherRow>().enumerate() {
            let row = row?;
            let sample = WeatherSample::new(
                row.temperature_c,
                row.direct_irradiance_wm2,
                row.diffuse_irradiance_wm2,
            );
            sample.check(index)?;
            labels.push(row.time.unwrap_or_default());
            samples.push(sample);
        }
        debug!(rows = samples.len(), "loaded weather csv");
        Ok(Self {
            labels,
            samples,
            start: None,
        })
    }

    /// Starts the returned window at the row whose `time` equals `label`.
    pub fn starting_at(mut self, label: impl Into<String>) -> Self {
        self.start = Some(label.into());
        self
    }

    /// Number of rows loaded.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl WeatherFeed for CsvWeatherFeed {
    fn fetch(&mut self, hours: usize) -> Result<Vec<WeatherSample>, FeedError> {
        let offset = align_window(&self.labels, self.start.as_deref());
        let available = self.samples.len() - offset;
        if available < hours {
            return Err(FeedError::TooFewSamples {
                requested: hours,
                available,
            });
        }
        Ok(self.samples[offset..offset + hours].to_vec())
    }
}

/// Parameters for [`SyntheticWeatherFeed`].
#[derive(Debug, Clone)]
pub struct SyntheticWeather {
    /// Hour of day (0–23) of the first sample.
    pub start_hour: usize,
    /// Hour of day when irradiance starts (inclusive).
    pub sunrise_hour: usize,
    /// Hour of day when irradiance stops (exclusive).
    pub sunset_hour: usize,
    /// Clear-sky direct irradiance at solar noon (W/m²).
    pub peak_direct_wm2: f64,
    /// Clear-sky diffuse irradiance at solar noon (W/m²).
    pub peak_diffuse_wm2: f64,
    /// AR(1) persistence of the cloud multiplier (0.0–1.0).
    pub cloud_alpha: f64,
    /// Standard deviation of the cloud innovation noise.
    pub cloud_noise_std: f64,
    /// Daily mean temperature (°C).
    pub temp_mean_c: f64,
    /// Half of the daily temperature swing (°C).
    pub temp_amplitude_c: f64,
}

impl Default for SyntheticWeather {
    fn default() -> Self {
        Self {
            start_hour: 0,
            sunrise_hour: 6,
            sunset_hour: 18,
            peak_direct_wm2: 850.0,
            peak_diffuse_wm2: 120.0,
            cloud_alpha: 0.8,
            cloud_noise_std: 0.2,
            temp_mean_c: 18.0,
            temp_amplitude_c: 6.0,
        }
    }
}

/// Lower bound of the cloud multiplier (heavy overcast).
const CLOUD_MIN: f64 = 0.1;
/// Upper bound of the cloud multiplier (cloud-edge enhancement).
const CLOUD_MAX: f64 = 1.1;
/// Hour of day with the highest temperature.
const TEMP_PEAK_HOUR: f64 = 15.0;

/// Deterministic weather generator for offline runs and tests.
///
/// Irradiance follows a half-sine daylight profile scaled by a cloud
/// multiplier that evolves as
/// ```text
/// m(t) = alpha * m(t-1) + (1 - alpha) * (1 + epsilon(t))
/// ```
/// Clouds move energy from the direct to the diffuse component. Temperature
/// is a daily sinusoid peaking mid-afternoon.
#[derive(Debug, Clone)]
pub struct SyntheticWeatherFeed {
    params: SyntheticWeather,
    multiplier: f64,
    rng: StdRng,
}

impl SyntheticWeatherFeed {
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour` or `sunset_hour > 24`.
    pub fn new(params: SyntheticWeather, seed: u64) -> Self {
        assert!(
            params.sunrise_hour < params.sunset_hour && params.sunset_hour <= 24,
            "sunrise_hour must be < sunset_hour and sunset_hour must be <= 24"
        );
        Self {
            params,
            multiplier: 1.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn daylight_frac(&self, hour_of_day: usize) -> f64 {
        let p = &self.params;
        if hour_of_day < p.sunrise_hour || hour_of_day >= p.sunset_hour {
            return 0.0;
        }
        let span = (p.sunset_hour - p.sunrise_hour) as f64;
        let x = (hour_of_day - p.sunrise_hour) as f64 + 0.5;
        (std::f64::consts::PI * x / span).sin()
    }

    fn advance_multiplier(&mut self) -> f64 {
        let alpha = self.params.cloud_alpha.clamp(0.0, 1.0);
        let epsilon = gaussian_noise(&mut self.rng, self.params.cloud_noise_std);
        self.multiplier = alpha * self.multiplier + (1.0 - alpha) * (1.0 + epsilon);
        self.multiplier = self.multiplier.clamp(CLOUD_MIN, CLOUD_MAX);
        self.multiplier
    }

    fn sample_at(&mut self, hour_of_day: usize) -> WeatherSample {
        let m = self.advance_multiplier();
        let frac = self.daylight_frac(hour_of_day);
        let p = &self.params;

        let direct = (p.peak_direct_wm2 * frac * m).max(0.0);
        let diffuse = (p.peak_diffuse_wm2 * frac * (1.5 - 0.5 * m)).max(0.0);
        let phase = 2.0 * std::f64::consts::PI * (hour_of_day as f64 - TEMP_PEAK_HOUR) / 24.0;
        let temperature = p.temp_mean_c + p.temp_amplitude_c * phase.cos();

        WeatherSample::new(temperature, direct, diffuse)
    }
}

impl WeatherFeed for SyntheticWeatherFeed {
    fn fetch(&mut self, hours: usize) -> Result<Vec<WeatherSample>, FeedError> {
        let start = self.params.start_hour % 24;
        Ok((0..hours).map(|i| self.sample_at((start + i) % 24)).collect())
    }
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
