//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the two pages of the application.

mod detection;
mod visualization;

pub use detection::DetectionService;
pub use visualization::{FilterOutcome, VisualSample, VisualizationService};
