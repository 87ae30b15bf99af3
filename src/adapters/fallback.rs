//! Fallback adapter: Tries a primary dataset source, then a local copy.

use std::sync::Arc;

use crate::domain::CardioRecord;
use crate::ports::{DatasetError, DatasetSource};

/// Dataset source that recovers from a failing primary with a fallback.
pub struct FallbackSource<P, F> {
    primary: Option<P>,
    fallback: F,
}

impl<P, F> FallbackSource<P, F>
where
    P: DatasetSource,
    F: DatasetSource,
{
    #[must_use]
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary: Some(primary),
            fallback,
        }
    }

    /// Use only the fallback (offline mode).
    #[must_use]
    pub fn fallback_only(fallback: F) -> Self {
        Self {
            primary: None,
            fallback,
        }
    }
}

impl<P, F> DatasetSource for FallbackSource<P, F>
where
    P: DatasetSource,
    F: DatasetSource,
{
    fn describe(&self) -> String {
        match &self.primary {
            Some(p) => format!("{} (fallback: {})", p.describe(), self.fallback.describe()),
            None => self.fallback.describe(),
        }
    }

    fn fetch(&self) -> Result<Arc<[CardioRecord]>, DatasetError> {
        let primary_error = match &self.primary {
            Some(primary) => match primary.fetch() {
                Ok(records) => return Ok(records),
                Err(e) => {
                    tracing::warn!(
                        "Primary dataset source failed ({}): {}; using {}",
                        primary.describe(),
                        e,
                        self.fallback.describe()
                    );
                    Some(e)
                }
            },
            None => None,
        };

        self.fallback.fetch().map_err(|fallback_error| {
            let detail = match primary_error {
                Some(p) => format!("primary: {p}; fallback: {fallback_error}"),
                None => format!("fallback: {fallback_error}"),
            };
            DatasetError::Unavailable(detail)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_file::parse_records;
    use crate::adapters::csv_file::tests::SAMPLE_CSV;

    struct Failing;

    impl DatasetSource for Failing {
        fn describe(&self) -> String {
            "failing".into()
        }

        fn fetch(&self) -> Result<Arc<[CardioRecord]>, DatasetError> {
            Err(DatasetError::Download("connection refused".into()))
        }
    }

    struct InMemory;

    impl DatasetSource for InMemory {
        fn describe(&self) -> String {
            "memory".into()
        }

        fn fetch(&self) -> Result<Arc<[CardioRecord]>, DatasetError> {
            parse_records(SAMPLE_CSV.as_bytes()).map(Arc::from)
        }
    }

    #[test]
    fn test_primary_used_when_available() {
        let source = FallbackSource::new(InMemory, Failing);
        assert_eq!(source.fetch().expect("primary").len(), 5);
    }

    #[test]
    fn test_fallback_recovers() {
        let source = FallbackSource::new(Failing, InMemory);
        assert_eq!(source.fetch().expect("fallback").len(), 5);
        assert_eq!(source.describe(), "failing (fallback: memory)");
    }

    #[test]
    fn test_both_failing_is_unavailable() {
        let source = FallbackSource::new(Failing, Failing);
        match source.fetch() {
            Err(DatasetError::Unavailable(detail)) => {
                assert!(detail.contains("primary"));
                assert!(detail.contains("fallback"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_only() {
        let source: FallbackSource<Failing, InMemory> = FallbackSource::fallback_only(InMemory);
        assert_eq!(source.fetch().expect("fallback").len(), 5);
        assert_eq!(source.describe(), "memory");
    }
}
