//! Visualization service: Sampled, outlier-filtered dataset for the charts.
//!
//! The full dataset is fetched once and shared with the source. A random sample is drawn from it, the
//! Mahalanobis filter removes outliers on the continuous columns, and the
//! result is cached until [`VisualizationService::resample`] is called.

use std::sync::{Arc, OnceLock};

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::charts::{self, Histogram, NominalColumn, NumericColumn, ScatterSeries, Slice};
use crate::domain::{CardioRecord, MahalanobisFilter, OutlierError};
use crate::ports::DatasetSource;
use crate::Result;

/// What the outlier filter did to the current sample.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// Rows with a distance at or above `critical_value` were removed.
    Applied { critical_value: f64, removed: usize },
    /// The sample was degenerate; records are shown unfiltered.
    Skipped(OutlierError),
}

/// Cached sample shown on the visualization page.
#[derive(Debug, Clone)]
pub struct VisualSample {
    records: Vec<CardioRecord>,
    drawn: usize,
    outcome: FilterOutcome,
}

impl VisualSample {
    /// Records left after filtering.
    #[must_use]
    pub fn records(&self) -> &[CardioRecord] {
        &self.records
    }

    /// Number of records drawn before filtering.
    #[must_use]
    pub fn drawn(&self) -> usize {
        self.drawn
    }

    #[must_use]
    pub fn outcome(&self) -> &FilterOutcome {
        &self.outcome
    }
}

/// Service producing chart data from a filtered random sample.
pub struct VisualizationService<S>
where
    S: DatasetSource,
{
    source: S,
    filter: MahalanobisFilter,
    sample_size: usize,
    seed: Option<u64>,
    draws: u64,
    full: OnceLock<Arc<[CardioRecord]>>,
    sample: OnceLock<VisualSample>,
}

impl<S> VisualizationService<S>
where
    S: DatasetSource,
{
    /// Create a new visualization service.
    ///
    /// With `seed` set, successive samples are reproducible across runs.
    pub fn new(source: S, filter: MahalanobisFilter, sample_size: usize, seed: Option<u64>) -> Self {
        Self {
            source,
            filter,
            sample_size: sample_size.max(1),
            seed,
            draws: 0,
            full: OnceLock::new(),
            sample: OnceLock::new(),
        }
    }

    /// The filtered sample, drawn on first access.
    ///
    /// # Errors
    /// Returns error if the dataset cannot be loaded.
    pub fn dataset(&self) -> Result<&VisualSample> {
        if let Some(sample) = self.sample.get() {
            return Ok(sample);
        }

        let full = self.full_dataset()?;
        let sample = self.draw(full);
        Ok(self.sample.get_or_init(|| sample))
    }

    /// Drop the cached sample so the next access draws a new one.
    pub fn resample(&mut self) {
        self.sample.take();
        self.draws = self.draws.wrapping_add(1);
        tracing::info!("Sample cleared, next access draws sample #{}", self.draws);
    }

    fn full_dataset(&self) -> Result<&[CardioRecord]> {
        if let Some(records) = self.full.get() {
            return Ok(&records[..]);
        }

        tracing::info!("Loading dataset from {}", self.source.describe());
        let records = self.source.fetch()?;
        tracing::info!("Loaded {} records", records.len());
        Ok(&self.full.get_or_init(|| records)[..])
    }

    fn draw(&self, full: &[CardioRecord]) -> VisualSample {
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(self.draws)),
            None => ChaCha8Rng::from_entropy(),
        };

        let size = self.sample_size.min(full.len());
        let drawn: Vec<CardioRecord> = rand::seq::index::sample(&mut rng, full.len(), size)
            .into_iter()
            .map(|i| full[i].clone())
            .collect();

        let matrix = Array2::from_shape_fn((drawn.len(), 5), |(i, j)| drawn[i].continuous()[j]);

        match self.filter.apply(matrix.view()) {
            Ok(report) => {
                tracing::info!(
                    "Outlier filter kept {} of {} rows (critical value {:.4})",
                    report.retained.len(),
                    drawn.len(),
                    report.critical_value
                );
                let outcome = FilterOutcome::Applied {
                    critical_value: report.critical_value,
                    removed: report.removed(),
                };
                let records = report.retained.iter().map(|&i| drawn[i].clone()).collect();
                VisualSample {
                    records,
                    drawn: size,
                    outcome,
                }
            }
            Err(e) => {
                tracing::warn!("Outlier filter skipped: {}", e);
                VisualSample {
                    records: drawn,
                    drawn: size,
                    outcome: FilterOutcome::Skipped(e),
                }
            }
        }
    }

    /// Per-category counts of a nominal column.
    ///
    /// # Errors
    /// Returns error if the dataset cannot be loaded.
    pub fn proportions(&self, column: NominalColumn) -> Result<Vec<Slice>> {
        Ok(charts::proportions(self.dataset()?.records(), column))
    }

    /// Binned counts of `x`, split by `color`.
    ///
    /// # Errors
    /// Returns error if the dataset cannot be loaded.
    pub fn histogram(&self, x: NumericColumn, color: NominalColumn) -> Result<Histogram> {
        Ok(charts::histogram(
            self.dataset()?.records(),
            x,
            color,
            charts::DEFAULT_BINS,
        ))
    }

    /// Scatter series of `(x, y)` grouped by `color`.
    ///
    /// # Errors
    /// Returns error if the dataset cannot be loaded.
    pub fn scatter(
        &self,
        x: NumericColumn,
        y: NumericColumn,
        color: NominalColumn,
    ) -> Result<Vec<ScatterSeries>> {
        Ok(charts::scatter(self.dataset()?.records(), x, y, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Level, YesNo};
    use crate::ports::DatasetError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(id: u64, age_days: f64, height: f64, weight: f64, ap_hi: f64, ap_lo: f64) -> CardioRecord {
        CardioRecord {
            id,
            age_days,
            gender: if id % 2 == 0 { Gender::Men } else { Gender::Women },
            height,
            weight,
            ap_hi,
            ap_lo,
            cholesterol: Level::Normal,
            gluc: Level::Normal,
            smoke: YesNo::No,
            alco: YesNo::No,
            active: YesNo::Yes,
            cardio: if id % 3 == 0 { YesNo::Yes } else { YesNo::No },
        }
    }

    /// Deterministic, well-spread records with one gross outlier at the end.
    fn spread_records(n: u64) -> Vec<CardioRecord> {
        let mut records: Vec<CardioRecord> = (0..n)
            .map(|i| {
                let f = i as f64;
                record(
                    i,
                    18000.0 + (f * 37.0) % 3000.0,
                    160.0 + (f * 7.0) % 25.0,
                    60.0 + (f * 11.0) % 30.0,
                    110.0 + (f * 13.0) % 40.0,
                    70.0 + (f * 5.0) % 20.0,
                )
            })
            .collect();
        records.push(record(n, 30000.0, 250.0, 200.0, 240.0, 190.0));
        records
    }

    struct VecSource {
        records: Arc<[CardioRecord]>,
        fetches: AtomicUsize,
    }

    impl VecSource {
        fn new(records: Vec<CardioRecord>) -> Self {
            Self {
                records: records.into(),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl DatasetSource for VecSource {
        fn describe(&self) -> String {
            "vec".into()
        }

        fn fetch(&self) -> std::result::Result<Arc<[CardioRecord]>, DatasetError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&self.records))
        }
    }

    fn ids(sample: &VisualSample) -> Vec<u64> {
        sample.records().iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_filter_applied_and_outlier_removed() {
        let outlier_id = 200;
        let service = VisualizationService::new(
            VecSource::new(spread_records(outlier_id)),
            MahalanobisFilter::default(),
            5000,
            Some(7),
        );

        let sample = service.dataset().expect("dataset");
        assert_eq!(sample.drawn(), 201);
        match sample.outcome() {
            FilterOutcome::Applied { removed, .. } => {
                assert!(*removed >= 1);
                assert_eq!(sample.records().len() + removed, 201);
            }
            FilterOutcome::Skipped(e) => panic!("filter skipped: {e}"),
        }
        assert!(!sample.records().is_empty());
        assert!(!ids(sample).contains(&outlier_id));
    }

    #[test]
    fn test_sample_size_respected() {
        let service = VisualizationService::new(
            VecSource::new(spread_records(300)),
            MahalanobisFilter::default(),
            50,
            Some(1),
        );
        let sample = service.dataset().expect("dataset");
        assert_eq!(sample.drawn(), 50);
        assert!(sample.records().len() <= 50);
    }

    #[test]
    fn test_dataset_cached_until_resample() {
        let mut service = VisualizationService::new(
            VecSource::new(spread_records(300)),
            MahalanobisFilter::default(),
            50,
            Some(3),
        );

        let first = ids(service.dataset().expect("dataset"));
        let again = ids(service.dataset().expect("dataset"));
        assert_eq!(first, again);

        service.resample();
        let second = ids(service.dataset().expect("dataset"));
        assert_ne!(first, second);

        // The full dataset is fetched once across resamples.
        assert_eq!(service.source.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_full_dataset_shares_source_allocation() {
        let service = VisualizationService::new(
            VecSource::new(spread_records(100)),
            MahalanobisFilter::default(),
            20,
            Some(2),
        );
        service.dataset().expect("dataset");

        let full = service.full.get().expect("full dataset cached");
        assert!(Arc::ptr_eq(full, &service.source.records));
    }

    #[test]
    fn test_seed_reproducible() {
        let make = || {
            VisualizationService::new(
                VecSource::new(spread_records(300)),
                MahalanobisFilter::default(),
                50,
                Some(11),
            )
        };
        let a = make();
        let b = make();
        assert_eq!(
            ids(a.dataset().expect("dataset")),
            ids(b.dataset().expect("dataset"))
        );
    }

    #[test]
    fn test_degenerate_sample_skips_filter() {
        // Fewer rows than columns: covariance is singular.
        let records: Vec<CardioRecord> = spread_records(300).into_iter().take(3).collect();
        let service =
            VisualizationService::new(VecSource::new(records), MahalanobisFilter::default(), 5000, None);

        let sample = service.dataset().expect("dataset");
        assert_eq!(sample.records().len(), 3);
        assert_eq!(
            sample.outcome(),
            &FilterOutcome::Skipped(OutlierError::DegenerateCovariance)
        );
    }

    #[test]
    fn test_chart_accessors() {
        let service = VisualizationService::new(
            VecSource::new(spread_records(200)),
            MahalanobisFilter::default(),
            5000,
            Some(5),
        );
        let n = service.dataset().expect("dataset").records().len();

        let slices = service.proportions(NominalColumn::Gender).expect("slices");
        assert_eq!(slices.iter().map(|s| s.count).sum::<usize>(), n);

        let hist = service
            .histogram(NumericColumn::Weight, NominalColumn::Cardio)
            .expect("histogram");
        assert_eq!(hist.bins(), charts::DEFAULT_BINS);
        assert_eq!(hist.total(), n);

        let series = service
            .scatter(NumericColumn::ApHi, NumericColumn::ApLo, NominalColumn::Cardio)
            .expect("scatter");
        assert_eq!(series.iter().map(|s| s.points.len()).sum::<usize>(), n);
    }
}
