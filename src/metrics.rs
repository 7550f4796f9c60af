//! Pace and calorie estimation.
//!
//! Calories use a banded MET model: average speed (mph) selects a MET
//! constant from half-open bands `[low, high)`, then
//! `calories = MET * weight_kg * hours`.

use crate::error::{MeasurementError, Quantity};

pub const LBS_TO_KG: f64 = 0.453592;
pub const DEFAULT_WEIGHT_LBS: f64 = 150.0;

/// `(lower bound mph, MET)`, ascending. Speeds below the first bound use `BASE_MET`.
const MET_BANDS: [(f64, f64); 5] = [(5.0, 8.3), (6.0, 9.8), (7.0, 11.0), (8.0, 11.8), (9.0, 12.8)];
const BASE_MET: f64 = 6.0;

pub fn ensure_positive(quantity: Quantity, value: f64) -> Result<f64, MeasurementError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MeasurementError::InvalidMeasurement { quantity, value })
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Minutes per mile, rounded to 2 decimals.
pub fn compute_pace(duration: f64, distance: f64) -> Result<f64, MeasurementError> {
    let duration = ensure_positive(Quantity::Duration, duration)?;
    let distance = ensure_positive(Quantity::Distance, distance)?;
    Ok(round2(duration / distance))
}

/// Average speed in miles per hour.
///
/// Multiplies before dividing so whole-number speeds (the band edges) come out exact.
pub fn speed_mph(duration: f64, distance: f64) -> Result<f64, MeasurementError> {
    let duration = ensure_positive(Quantity::Duration, duration)?;
    let distance = ensure_positive(Quantity::Distance, distance)?;
    Ok(distance * 60.0 / duration)
}

pub fn met_for_speed(speed_mph: f64) -> f64 {
    MET_BANDS
        .iter()
        .rev()
        .find(|(low, _)| speed_mph >= *low)
        .map_or(BASE_MET, |(_, met)| *met)
}

pub fn lbs_to_kg(weight_lbs: f64) -> f64 {
    weight_lbs * LBS_TO_KG
}

/// Estimated kcal for a session, rounded to 2 decimals.
pub fn compute_calories_burned(
    duration: f64,
    distance: f64,
    weight_lbs: f64,
) -> Result<f64, MeasurementError> {
    let speed = speed_mph(duration, distance)?;
    let weight_lbs = ensure_positive(Quantity::Weight, weight_lbs)?;

    let met = met_for_speed(speed);
    let hours = duration / 60.0;
    Ok(round2(met * lbs_to_kg(weight_lbs) * hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace() {
        assert_eq!(compute_pace(60.0, 10.0), Ok(6.0));
        assert_eq!(compute_pace(25.0, 3.0), Ok(8.33));
        assert_eq!(compute_pace(31.0, 3.1), Ok(10.0));
    }

    #[test]
    fn test_pace_rejects_non_positive() {
        assert_eq!(
            compute_pace(0.0, 5.0),
            Err(MeasurementError::InvalidMeasurement {
                quantity: Quantity::Duration,
                value: 0.0
            })
        );
        assert_eq!(
            compute_pace(30.0, 0.0),
            Err(MeasurementError::InvalidMeasurement {
                quantity: Quantity::Distance,
                value: 0.0
            })
        );
        assert!(compute_pace(-5.0, 1.0).is_err());
        assert!(compute_pace(f64::NAN, 1.0).is_err());
        assert!(compute_pace(30.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_met_band_edges() {
        assert_eq!(met_for_speed(0.5), 6.0);
        assert_eq!(met_for_speed(4.99), 6.0);
        assert_eq!(met_for_speed(5.0), 8.3);
        assert_eq!(met_for_speed(5.99), 8.3);
        assert_eq!(met_for_speed(6.0), 9.8);
        assert_eq!(met_for_speed(7.0), 11.0);
        assert_eq!(met_for_speed(8.0), 11.8);
        assert_eq!(met_for_speed(8.99), 11.8);
        assert_eq!(met_for_speed(9.0), 12.8);
        assert_eq!(met_for_speed(15.0), 12.8);
    }

    #[test]
    fn test_speed_is_exact_at_band_edges() {
        assert_eq!(speed_mph(60.0, 5.0), Ok(5.0));
        assert_eq!(speed_mph(30.0, 3.0), Ok(6.0));
        assert_eq!(speed_mph(60.0, 7.0), Ok(7.0));
        assert_eq!(speed_mph(45.0, 6.0), Ok(8.0));
        assert_eq!(speed_mph(20.0, 3.0), Ok(9.0));
    }

    #[test]
    fn test_calories_reference_values() {
        // 6 mph -> MET 9.8; 150 lbs = 68.0388 kg; half an hour
        assert_eq!(compute_calories_burned(30.0, 3.0, 150.0), Ok(333.39));

        // 6 mph for an hour at 154 lbs (69.853168 kg)
        assert_eq!(compute_calories_burned(60.0, 6.0, 154.0), Ok(684.56));
    }

    #[test]
    fn test_calories_use_band_at_exact_boundary() {
        // exactly 5 mph must take 8.3, not 6.0
        let kcal = compute_calories_burned(60.0, 5.0, 150.0).unwrap();
        assert_eq!(kcal, 564.72);

        // exactly 9 mph must take 12.8
        let kcal = compute_calories_burned(20.0, 3.0, 150.0).unwrap();
        assert_eq!(kcal, 290.3);
    }

    #[test]
    fn test_calories_slow_walk() {
        // 2 mph -> base MET 6.0
        let kcal = compute_calories_burned(60.0, 2.0, 200.0).unwrap();
        assert!((kcal - 544.31).abs() < 0.01);
    }

    #[test]
    fn test_calories_reject_invalid_inputs() {
        for weight in [1.0, 150.0, 300.0] {
            assert!(compute_calories_burned(0.0, 3.0, weight).is_err());
            assert!(compute_calories_burned(30.0, 0.0, weight).is_err());
        }
        assert_eq!(
            compute_calories_burned(30.0, 3.0, 0.0),
            Err(MeasurementError::InvalidMeasurement {
                quantity: Quantity::Weight,
                value: 0.0
            })
        );
    }
}
