//! Risk assessment result types.
//!
//! Represents the output of the cardiovascular risk model for one patient.

use serde::{Deserialize, Serialize};

/// Risk band derived from the predicted probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk of cardiovascular disease
    Low,
    /// Moderate risk, monitoring recommended
    Moderate,
    /// High risk, consultation recommended
    High,
}

impl RiskLevel {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Medical consultation advised",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Model output for one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Predicted probability of disease (0.0 to 1.0)
    pub probability: f64,

    /// Timestamp of the assessment
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RiskAssessment {
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            created_at: chrono::Utc::now(),
        }
    }

    /// Probability as a percentage rounded to 2 decimals.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        (self.probability * 100.0 * 100.0).round() / 100.0
    }

    /// Get the risk level based on probability thresholds.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        if self.probability < 0.3 {
            RiskLevel::Low
        } else if self.probability < 0.7 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

impl std::fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.percentage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_probability() {
        assert_eq!(RiskAssessment::new(0.1).risk_level(), RiskLevel::Low);
        assert_eq!(RiskAssessment::new(0.5).risk_level(), RiskLevel::Moderate);
        assert_eq!(RiskAssessment::new(0.9).risk_level(), RiskLevel::High);
    }

    #[test]
    fn test_percentage_rounding() {
        let assessment = RiskAssessment::new(0.123_456);
        assert!((assessment.percentage() - 12.35).abs() < 1e-9);
        assert_eq!(assessment.to_string(), "12.35%");
        assert_eq!(RiskAssessment::new(1.0).to_string(), "100.00%");
    }
}
