//! Detection service: Risk estimation for one patient.
//!
//! This service coordinates:
//! - Reference statistics (computed once from the dataset)
//! - Feature encoding
//! - Model scoring

use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use ndarray::Array2;

use crate::domain::{encode, PatientInput, ReferenceStats, RiskAssessment, N_FEATURES};
use crate::ports::{DatasetSource, ModelError, RiskModel};
use crate::{CardiolensError, Result};

/// Service for scoring patients against the pretrained model.
pub struct DetectionService<S, M>
where
    S: DatasetSource,
    M: RiskModel,
{
    source: S,
    model: Arc<M>,
    reference: OnceLock<ReferenceStats>,
}

impl<S, M> DetectionService<S, M>
where
    S: DatasetSource,
    M: RiskModel,
{
    /// Create a new detection service.
    pub fn new(source: S, model: Arc<M>) -> Self {
        Self {
            source,
            model,
            reference: OnceLock::new(),
        }
    }

    /// Initialize the service by checking the model and computing the
    /// reference statistics.
    ///
    /// # Errors
    /// Returns error if the model layout is wrong or no dataset is available.
    pub fn initialize(&self) -> Result<()> {
        tracing::info!("Initializing detection service...");

        let width = self.model.input_width();
        if width != N_FEATURES {
            return Err(ModelError::InputShape {
                expected: N_FEATURES,
                actual: width,
            }
            .into());
        }

        self.reference_stats()?;
        Ok(())
    }

    /// Reference statistics over the full dataset.
    ///
    /// The dataset is fetched on the first successful call only; later calls
    /// return the cached value.
    ///
    /// # Errors
    /// Returns error if the dataset cannot be loaded or is degenerate.
    pub fn reference_stats(&self) -> Result<&ReferenceStats> {
        if let Some(stats) = self.reference.get() {
            return Ok(stats);
        }

        tracing::info!("Computing reference statistics from {}", self.source.describe());
        let records = self.source.fetch()?;
        let stats = ReferenceStats::from_records(&records)?;
        tracing::debug!(mean = ?stats.mean, std = ?stats.std, "Reference statistics");

        Ok(self.reference.get_or_init(|| stats))
    }

    /// Estimate the disease probability for a patient.
    ///
    /// # Errors
    /// Returns error if the input is invalid or the model output is not a probability.
    pub fn assess(&self, input: &PatientInput, today: NaiveDate) -> Result<RiskAssessment> {
        input
            .validate(today)
            .map_err(|errors| CardiolensError::Validation(errors.join("; ")))?;
        let measurements = input.measurements(today).ok_or_else(|| {
            CardiolensError::Validation(format!("Birth date {} is in the future", input.birth_date))
        })?;

        let stats = self.reference_stats()?;
        let encoded = encode(&measurements, &input.selections, stats)?;
        let row = Array2::from_shape_fn((1, N_FEATURES), |(_, j)| encoded.as_slice()[j]);

        let output = self.model.predict(row.view())?;
        let probability = output
            .get((0, 0))
            .copied()
            .ok_or_else(|| ModelError::Invalid("model returned no output".into()))?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ModelError::OutputOutOfRange(probability).into());
        }

        let assessment = RiskAssessment::new(probability);
        tracing::info!("Risk assessment complete: risk={}", assessment.risk_level());
        Ok(assessment)
    }
}
