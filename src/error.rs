use serde::{Serialize, Serializer};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Which measured quantity failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Duration,
    Distance,
    Weight,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Duration => "duration",
            Self::Distance => "distance",
            Self::Weight => "weight",
        };
        f.write_str(s)
    }
}

/// Raised by the metrics functions and by creation-time validation.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MeasurementError {
    #[error("invalid measurement: {quantity} must be a positive number, got {value}")]
    InvalidMeasurement { quantity: Quantity, value: f64 },
}

impl MeasurementError {
    pub const fn quantity(&self) -> Quantity {
        match self {
            Self::InvalidMeasurement { quantity, .. } => *quantity,
        }
    }
}

impl Serialize for MeasurementError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidMeasurement(#[from] MeasurementError),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{failed} of {total} workouts could not be enriched")]
    PartialAggregationFailure { failed: usize, total: usize },

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("GPX error: {0}")]
    Gpx(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by caller input rather than the environment.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMeasurement(_)
                | Self::MissingField(_)
                | Self::InvalidDate(_)
                | Self::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_error_message() {
        let e = MeasurementError::InvalidMeasurement {
            quantity: Quantity::Distance,
            value: 0.0,
        };
        assert_eq!(
            e.to_string(),
            "invalid measurement: distance must be a positive number, got 0"
        );
        assert_eq!(e.quantity(), Quantity::Distance);
    }

    #[test]
    fn test_measurement_error_serializes_as_message() {
        let e = MeasurementError::InvalidMeasurement {
            quantity: Quantity::Weight,
            value: -3.5,
        };
        let json = serde_json::to_value(e).unwrap();
        assert_eq!(
            json,
            serde_json::json!("invalid measurement: weight must be a positive number, got -3.5")
        );
    }

    #[test]
    fn test_client_error_classification() {
        let invalid: Error = MeasurementError::InvalidMeasurement {
            quantity: Quantity::Duration,
            value: 0.0,
        }
        .into();
        assert!(invalid.is_client_error());
        assert!(
            Error::NotFound {
                entity: "workout",
                id: 7
            }
            .is_client_error()
        );
        assert!(!Error::Io(std::io::Error::other("disk")).is_client_error());
    }
}
