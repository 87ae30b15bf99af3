//! Patient data collected on the detection page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::encoding::{CategoricalSelections, ClinicalMeasurements};
use super::record::{Gender, Level, YesNo};

/// Inclusive range accepted for height, weight and both blood pressures.
pub const MEASUREMENT_RANGE: (f64, f64) = (0.0, 200.0);

/// Raw patient input from the TUI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    pub birth_date: NaiveDate,
    /// Height in cm
    pub height: f64,
    /// Weight in kg
    pub weight: f64,
    /// Systolic blood pressure
    pub ap_hi: f64,
    /// Diastolic blood pressure
    pub ap_lo: f64,
    pub selections: CategoricalSelections,
}

impl Default for PatientInput {
    fn default() -> Self {
        Self {
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN),
            height: 180.0,
            weight: 75.0,
            ap_hi: 120.0,
            ap_lo: 80.0,
            selections: CategoricalSelections {
                gender: Gender::Men,
                cholesterol: Level::Normal,
                gluc: Level::Normal,
                smoke: YesNo::Yes,
                alco: YesNo::Yes,
                active: YesNo::Yes,
            },
        }
    }
}

impl PatientInput {
    /// Age in completed years on `today`.
    ///
    /// Returns `None` when the birth date lies after `today`.
    #[must_use]
    pub fn age_years(&self, today: NaiveDate) -> Option<u32> {
        today.years_since(self.birth_date)
    }

    /// Validate that all measurements are within the accepted ranges.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.age_years(today).is_none() {
            errors.push(format!("Birth date {} is in the future", self.birth_date));
        }

        let (lo, hi) = MEASUREMENT_RANGE;
        for (label, value) in [
            ("Height", self.height),
            ("Weight", self.weight),
            ("Systolic BP", self.ap_hi),
            ("Diastolic BP", self.ap_lo),
        ] {
            if !(lo..=hi).contains(&value) {
                errors.push(format!("{label} {value} out of range [{lo}, {hi}]"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Continuous measurements with age in whole years.
    ///
    /// Returns `None` when the birth date lies after `today`.
    #[must_use]
    pub fn measurements(&self, today: NaiveDate) -> Option<ClinicalMeasurements> {
        let age = self.age_years(today)?;
        Some(ClinicalMeasurements {
            age_years: f64::from(age),
            height: self.height,
            weight: self.weight,
            ap_hi: self.ap_hi,
            ap_lo: self.ap_lo,
        })
    }
}
