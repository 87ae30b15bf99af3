//! Risk model port: Trait for the pretrained classifier.
//!
//! The model is an opaque scoring function from encoded feature rows to
//! disease probabilities.

use ndarray::{Array2, ArrayView2};

/// Errors raised by model loading and scoring.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model artifact not found at {0}")]
    NotFound(String),

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("expected {expected} input features, got {actual}")]
    InputShape { expected: usize, actual: usize },

    #[error("model output {0} is not a probability in [0, 1]")]
    OutputOutOfRange(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for risk scoring models.
pub trait RiskModel: Send + Sync {
    /// Number of input columns the model expects.
    fn input_width(&self) -> usize;

    /// Score a batch of encoded rows.
    ///
    /// Returns an `N x 1` matrix of probabilities for `N` input rows.
    ///
    /// # Errors
    /// Returns `ModelError::InputShape` on a column-count mismatch.
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError>;
}
