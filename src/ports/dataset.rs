//! Dataset port: Trait for loading the cardiovascular dataset.
//!
//! This trait abstracts where `cardio_train.csv` comes from (remote download,
//! local file) from the services that consume its records.

use std::sync::Arc;

use crate::domain::CardioRecord;

/// Errors that can occur while loading the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("download failed: {0}")]
    Download(String),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unreadable archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("dataset is empty")]
    Empty,

    #[error("no dataset source available: {0}")]
    Unavailable(String),
}

/// Trait for dataset sources.
///
/// Implementations yield every record of the dataset, in file order. Records
/// are shared behind an `Arc` so caches and services never copy the dataset.
pub trait DatasetSource: Send + Sync {
    /// Short description used in logs.
    fn describe(&self) -> String;

    /// Load all records.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source cannot be read or parsed.
    fn fetch(&self) -> Result<Arc<[CardioRecord]>, DatasetError>;
}

impl<T: DatasetSource + ?Sized> DatasetSource for Arc<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn fetch(&self) -> Result<Arc<[CardioRecord]>, DatasetError> {
        (**self).fetch()
    }
}
