//! Reference statistics used to standardize live inputs.
//!
//! Mean and sample standard deviation of each continuous field, computed over
//! the full dataset with age converted from days to years.

use serde::{Deserialize, Serialize};

use super::encoding::CONTINUOUS_COLUMNS;
use super::record::CardioRecord;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReferenceError {
    #[error("at least 2 records are required, got {0}")]
    TooFewRecords(usize),

    #[error("standard deviation of {field} is {value}, expected a positive finite number")]
    DegenerateStd { field: &'static str, value: f64 },
}

/// Per-field mean and standard deviation, in `CONTINUOUS_COLUMNS` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStats {
    pub mean: [f64; 5],
    pub std: [f64; 5],
}

impl ReferenceStats {
    /// Build statistics from explicit vectors.
    ///
    /// # Errors
    /// Returns `DegenerateStd` if any deviation is zero, negative or non-finite.
    pub fn new(mean: [f64; 5], std: [f64; 5]) -> Result<Self, ReferenceError> {
        for (&field, &value) in CONTINUOUS_COLUMNS.iter().zip(std.iter()) {
            if !(value.is_finite() && value > 0.0) {
                return Err(ReferenceError::DegenerateStd { field, value });
            }
        }
        Ok(Self { mean, std })
    }

    /// Compute statistics over dataset records (sample std, divisor N - 1).
    ///
    /// # Errors
    /// Fails with fewer than two records or a constant column.
    pub fn from_records(records: &[CardioRecord]) -> Result<Self, ReferenceError> {
        let n = records.len();
        if n < 2 {
            return Err(ReferenceError::TooFewRecords(n));
        }

        let mut mean = [0.0; 5];
        for record in records {
            for (m, v) in mean.iter_mut().zip(record.continuous()) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        let mut var = [0.0; 5];
        for record in records {
            for ((s, v), m) in var.iter_mut().zip(record.continuous()).zip(mean) {
                *s += (v - m).powi(2);
            }
        }
        let std = var.map(|s| (s / (n - 1) as f64).sqrt());

        Self::new(mean, std)
    }

    /// Z-score of `value` for the field at `index`.
    #[must_use]
    pub fn standardize(&self, index: usize, value: f64) -> f64 {
        (value - self.mean[index]) / self.std[index]
    }
}
