//! Domain layer: Core types and numeric procedures.
//!
//! Pure Rust types with no I/O. The outlier filter, the reference statistics
//! and the feature encoder live here so they can be tested in isolation.

pub mod charts;
mod diagnosis;
pub mod encoding;
pub mod outlier;
mod patient;
mod record;
mod reference;

pub use diagnosis::{RiskAssessment, RiskLevel};
pub use encoding::{
    encode, CategoricalField, CategoricalSelections, ClinicalMeasurements, EncodedFeatures,
    EncodingError, FEATURE_COLUMNS, N_FEATURES,
};
pub use outlier::{MahalanobisFilter, OutlierError, OutlierReport};
pub use patient::{PatientInput, MEASUREMENT_RANGE};
pub use record::{CardioRecord, Gender, Level, YesNo, DAYS_PER_YEAR};
pub use reference::{ReferenceError, ReferenceStats};
