//! Error taxonomy for simulation runs.
//!
//! Only two numeric conditions are recovered silently (power fraction and
//! battery capacity clamping). Everything else surfaces as one of these.

use thiserror::Error;

/// Malformed or missing simulation inputs. The simulation does not run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid value for `{field}`: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("expected {expected} weather samples (one per hour), got {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },
}

impl ValidationError {
    /// Shorthand for an [`ValidationError::InvalidField`].
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

/// The power fraction estimator rejected a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("feature `{feature}` is not a finite number ({value})")]
    MalformedFeatures { feature: &'static str, value: f64 },

    #[error("estimator produced a non-finite prediction ({0})")]
    NonFinitePrediction(f64),

    #[error("estimator failed: {0}")]
    Failed(String),
}

/// The weather sample feed failed or returned an unexpected shape.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot read weather feed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed weather row: {0}")]
    Csv(#[from] csv::Error),

    #[error("weather feed returned {available} samples, {requested} hours requested")]
    TooFewSamples { requested: usize, available: usize },

    #[error("weather sample at index {index} is invalid: {message}")]
    InvalidSample { index: usize, message: String },
}

/// Umbrella error for one simulation request.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("power estimation failed at hour {hour}: {source}")]
    Estimator {
        hour: usize,
        #[source]
        source: EstimatorError,
    },

    #[error(transparent)]
    Feed(#[from] FeedError),
}
