//! Cached adapter: Fetches the wrapped source once and serves copies.

use std::sync::{Arc, OnceLock};

use crate::domain::CardioRecord;
use crate::ports::{DatasetError, DatasetSource};

/// Dataset source that remembers the first successful fetch.
///
/// Every later call hands out the same shared allocation.
///
/// Failures are not cached, so a later call retries the inner source.
pub struct CachedSource<S> {
    inner: S,
    records: OnceLock<Arc<[CardioRecord]>>,
}

impl<S: DatasetSource> CachedSource<S> {
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            records: OnceLock::new(),
        }
    }
}

impl<S: DatasetSource> DatasetSource for CachedSource<S> {
    fn describe(&self) -> String {
        self.inner.describe()
    }

    fn fetch(&self) -> Result<Arc<[CardioRecord]>, DatasetError> {
        if let Some(records) = self.records.get() {
            tracing::debug!("Serving {} cached records", records.len());
            return Ok(Arc::clone(records));
        }

        let records = self.inner.fetch()?;
        Ok(Arc::clone(self.records.get_or_init(|| records)))
    }
}
