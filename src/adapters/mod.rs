//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `csv_file`: semicolon CSV parsing with the `csv` crate
//! - `http`: dataset download with `reqwest`
//! - `fallback`: remote-then-local dataset resolution
//! - `cached`: single fetch shared by both pages
//! - `network`: JSON dense network scored with `ndarray`

pub mod cached;
pub mod csv_file;
pub mod fallback;
pub mod http;
pub mod network;

pub use cached::CachedSource;
pub use csv_file::CsvFileSource;
pub use fallback::FallbackSource;
pub use http::{default_dataset_url, Credentials, RemoteCsvSource};
pub use network::DenseNetwork;
