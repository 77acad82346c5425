//! Hourly generation: weather sample → estimator → clamped, derated energy.

use crate::error::EstimatorError;
use crate::estimator::{PowerEstimator, PowerFeatures};
use crate::weather::WeatherSample;

/// Length of one simulation step in hours.
///
/// Every step is one hour, so power in kW and energy in kWh are numerically
/// equal. Any change to this value must convert power to energy explicitly.
pub const HOUR_STEP_H: f64 = 1.0;

/// Clamps a raw estimator output to the physical range `[0, 1]`.
pub fn clamp_power_fraction(raw: f64) -> f64 {
    raw.clamp(0.0, 1.0)
}

/// Energy generated during one hour.
///
/// ```text
/// energy = clamp(predict(features), 0, 1) * (1 - loss) * max_grid_power_kw * 1h
/// ```
///
/// # Errors
///
/// Propagates estimator failures. A NaN prediction is a failure; infinities
/// clamp like any other out-of-range value.
pub fn compute_generated_energy<E>(
    sample: &WeatherSample,
    estimator: &E,
    max_grid_power_kw: f64,
    system_loss_fraction: f64,
) -> Result<f64, EstimatorError>
where
    E: PowerEstimator + ?Sized,
{
    let features = PowerFeatures::from_sample(sample);
    let raw = estimator.predict(&features)?;
    if raw.is_nan() {
        return Err(EstimatorError::NonFinitePrediction(raw));
    }
    let effective = clamp_power_fraction(raw) * (1.0 - system_loss_fraction);
    Ok(effective * max_grid_power_kw * HOUR_STEP_H)
}
