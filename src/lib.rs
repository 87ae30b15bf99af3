//! # Cardiolens
//!
//! Cardiovascular disease exploration and risk estimation in the terminal.
//!
//! This crate provides:
//! - A Mahalanobis outlier filter over the cardiovascular dataset
//! - Chart aggregations for an interactive visualization page
//! - One-hot feature encoding and scoring with a pretrained network
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and numeric procedures (records, filter, encoder)
//! - `ports`: Trait definitions for the dataset and the model
//! - `adapters`: Concrete implementations (CSV, HTTP, dense network)
//! - `application`: Services orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::{AppConfig, ConfigError};
pub use domain::{PatientInput, RiskAssessment, RiskLevel};

/// Result type for Cardiolens operations
pub type Result<T> = std::result::Result<T, CardiolensError>;

/// Main error type for Cardiolens
#[derive(Debug, thiserror::Error)]
pub enum CardiolensError {
    #[error("Outlier filter failed: {0}")]
    Outlier(#[from] domain::OutlierError),

    #[error("Feature encoding failed: {0}")]
    Encoding(#[from] domain::EncodingError),

    #[error("Reference statistics failed: {0}")]
    Reference(#[from] domain::ReferenceError),

    #[error("Dataset unavailable: {0}")]
    Dataset(#[from] ports::DatasetError),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid patient data: {0}")]
    Validation(String),
}
