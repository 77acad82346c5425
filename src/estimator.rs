//! Power fraction estimation.
//!
//! The estimator maps one normalized weather sample to the fraction of rated
//! grid power produced before system losses. It is an injected collaborator:
//! the simulation never loads or owns a global model.

use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;
use crate::weather::WeatherSample;

/// Irradiance is divided by this before being passed to the estimator
/// (W/m² → kW/m², the units the model was trained on).
pub const IRRADIANCE_SCALE: f64 = 1000.0;

/// Normalized estimator inputs.
///
/// The estimator's feature vector order is `[direct, diffuse, temperature]`.
/// [`PowerFeatures::to_array`] is the only place that order is produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerFeatures {
    /// Direct irradiance in kW/m².
    pub direct_normalized: f64,
    /// Diffuse irradiance in kW/m².
    pub diffuse_normalized: f64,
    /// Air temperature in °C, unscaled.
    pub temperature_c: f64,
}

impl PowerFeatures {
    /// Normalizes one weather sample.
    pub fn from_sample(sample: &WeatherSample) -> Self {
        Self {
            direct_normalized: sample.direct_irradiance_wm2 / IRRADIANCE_SCALE,
            diffuse_normalized: sample.diffuse_irradiance_wm2 / IRRADIANCE_SCALE,
            temperature_c: sample.temperature_c,
        }
    }

    /// Ordered feature vector: `[direct, diffuse, temperature]`.
    pub fn to_array(&self) -> [f64; 3] {
        [
            self.direct_normalized,
            self.diffuse_normalized,
            self.temperature_c,
        ]
    }

    fn check_finite(&self) -> Result<(), EstimatorError> {
        let named = [
            ("direct_normalized", self.direct_normalized),
            ("diffuse_normalized", self.diffuse_normalized),
            ("temperature_c", self.temperature_c),
        ];
        for (feature, value) in named {
            if !value.is_finite() {
                return Err(EstimatorError::MalformedFeatures { feature, value });
            }
        }
        Ok(())
    }
}

/// A pre-trained model predicting the power fraction for one hour.
///
/// Implementations must not mutate shared state: the same instance may be
/// used by several simulation runs at once. The raw prediction may fall
/// outside [0, 1]; callers clamp it.
pub trait PowerEstimator: Sync {
    /// Predicts the raw power fraction for `features`.
    ///
    /// # Errors
    ///
    /// Returns an `EstimatorError` if the features are malformed or the model fails.
    fn predict(&self, features: &PowerFeatures) -> Result<f64, EstimatorError>;
}

impl<F> PowerEstimator for F
where
    F: Fn(&PowerFeatures) -> Result<f64, EstimatorError> + Sync,
{
    fn predict(&self, features: &PowerFeatures) -> Result<f64, EstimatorError> {
        self(features)
    }
}

/// Linear regression over the ordered feature vector.
///
/// ```
/// use solar_sim::estimator::{LinearEstimator, PowerEstimator, PowerFeatures};
/// use solar_sim::weather::WeatherSample;
///
/// let model = LinearEstimator::new([0.8, 0.5, -0.002], 0.02);
/// let features = PowerFeatures::from_sample(&WeatherSample::new(25.0, 800.0, 100.0));
/// let fraction = model.predict(&features).unwrap();
/// assert!((fraction - 0.66).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimator {
    /// Coefficients in feature order `[direct, diffuse, temperature]`.
    pub weights: [f64; 3],
    pub intercept: f64,
}

impl LinearEstimator {
    pub fn new(weights: [f64; 3], intercept: f64) -> Self {
        Self { weights, intercept }
    }
}

impl Default for LinearEstimator {
    fn default() -> Self {
        // Fitted on hourly output of a fixed-tilt residential array.
        Self::new([0.82, 0.55, -0.0025], 0.01)
    }
}

impl PowerEstimator for LinearEstimator {
    fn predict(&self, features: &PowerFeatures) -> Result<f64, EstimatorError> {
        features.check_finite()?;
        let x = features.to_array();
        let y = self
            .weights
            .iter()
            .zip(x.iter())
            .fold(self.intercept, |acc, (w, v)| acc + w * v);
        if !y.is_finite() {
            return Err(EstimatorError::NonFinitePrediction(y));
        }
        Ok(y)
    }
}
