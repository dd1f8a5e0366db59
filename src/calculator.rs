use serde::Deserialize;

use crate::errors::EmissionError;
use crate::factors;

/// An activity as logged by a user, before conversion
#[derive(Debug, Clone, Deserialize)]
pub struct LoggedActivity {
    pub category: String,
    pub subcategory: String,
    pub quantity: f64,
    /// Informational only, never part of the factor lookup
    #[serde(default)]
    pub unit: Option<String>,
}

impl LoggedActivity {
    pub fn co2_equivalent(&self) -> Result<f64, EmissionError> {
        compute(&self.category, &self.subcategory, self.quantity)
    }
}

/// Converts an activity quantity into kg CO2e.
///
/// Category and subcategory are matched case-insensitively. Quantity is not
/// validated: zero or negative quantities produce zero or negative results.
pub fn compute(category: &str, subcategory: &str, quantity: f64) -> Result<f64, EmissionError> {
    let factor = factors::lookup(category, subcategory)?;
    Ok(round2(factor * quantity))
}

/// Rounds to 2 decimal places, ties to even.
/// Magnitudes too large to scale carry no fractional digits and are returned as is.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::Category;

    #[test]
    fn test_compute_car() {
        assert_eq!(compute("transport", "car", 100.0).unwrap(), 21.0);
    }

    #[test]
    fn test_compute_matches_factor_times_quantity() {
        assert_eq!(compute("energy", "electricity", 200.0).unwrap(), 77.0);
        assert_eq!(compute("food", "beef", 2.0).unwrap(), 54.0);
        assert_eq!(compute("transport", "flight", 1000.0).unwrap(), 250.0);
        assert_eq!(compute("energy", "heating_oil", 10.0).unwrap(), 2.68);
    }

    #[test]
    fn test_compute_every_known_pair() {
        for category in Category::ALL {
            for (subcategory, factor) in category.factors() {
                for quantity in [0.0, 1.0, 12.5, 100.0, -3.0] {
                    assert_eq!(
                        compute(category.as_str(), subcategory, quantity).unwrap(),
                        round2(factor * quantity),
                        "{}/{} x {}",
                        category.as_str(),
                        subcategory,
                        quantity
                    );
                }
            }
        }
    }

    #[test]
    fn test_compute_normalizes_case() {
        assert_eq!(compute("TRANSPORT", "Bus", 50.0).unwrap(), 3.0);
    }

    #[test]
    fn test_compute_unknown_inputs() {
        assert!(matches!(
            compute("transport", "rocket", 1.0),
            Err(EmissionError::UnknownSubcategory { .. })
        ));
        assert!(matches!(
            compute("space", "x", 1.0),
            Err(EmissionError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_error_keeps_caller_spelling() {
        let err = compute("Space", "X", 1.0).unwrap_err();
        assert_eq!(err.to_string(), "Unknown category: Space");
    }

    #[test]
    fn test_negative_and_zero_quantities_allowed() {
        assert_eq!(compute("transport", "car", 0.0).unwrap(), 0.0);
        assert_eq!(compute("transport", "car", -100.0).unwrap(), -21.0);
    }

    #[test]
    fn test_logged_activity_ignores_unit() {
        let activity = LoggedActivity {
            category: "food".to_string(),
            subcategory: "chicken".to_string(),
            quantity: 4.0,
            unit: Some("parsecs".to_string()),
        };
        assert_eq!(activity.co2_equivalent().unwrap(), 10.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(-3.333), -3.33);
    }

    #[test]
    fn test_round2_huge_values_stay_finite() {
        assert_eq!(round2(2.1e306), 2.1e306);
        assert_eq!(round2(-f64::MAX), -f64::MAX);

        let co2 = compute("transport", "car", 1e307).unwrap();
        assert!(co2.is_finite());
        assert_eq!(co2, 0.21 * 1e307);
    }
}
