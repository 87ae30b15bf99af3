//! TUI module: Terminal User Interface using Ratatui.
//!
//! Two pages, switched with Tab:
//! - Visualization of a filtered dataset sample
//! - Cardiovascular disease risk detection

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
