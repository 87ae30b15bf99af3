//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the outside world (dataset download, model
//! artifact).

mod dataset;
mod model;

pub use dataset::{DatasetError, DatasetSource};
pub use model::{ModelError, RiskModel};
