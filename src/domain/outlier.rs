//! Multivariate outlier filter based on the Mahalanobis distance.
//!
//! The filter estimates the sample covariance of a numeric matrix, checks that
//! both the covariance and its inverse are positive-definite, and keeps every
//! row whose distance from the column means is below a chi-squared critical
//! value.
//!
//! The critical value uses `k - 1` degrees of freedom for `k` columns, and is
//! compared against the distance itself rather than its square. Both choices
//! reproduce the reference analysis the dashboards were built from.

use faer::linalg::solvers::{Llt, Solve};
use faer::{Mat, Side};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.25;

/// Relative tolerance of the symmetry check (numpy `allclose` defaults).
const SYMMETRY_RTOL: f64 = 1e-5;
/// Absolute tolerance of the symmetry check.
const SYMMETRY_ATOL: f64 = 1e-8;

/// Errors raised by the outlier filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OutlierError {
    #[error("covariance matrix is not positive definite")]
    DegenerateCovariance,

    #[error("inverse of the covariance matrix is not positive definite")]
    DegenerateInverse,

    #[error("significance level must lie in (0, 1), got {0}")]
    InvalidAlpha(f64),

    #[error("at least 2 features are required for a chi-squared threshold, got {0}")]
    DegreesOfFreedom(usize),

    #[error("feature matrix contains a non-finite value at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },
}

/// Result of running the filter over a matrix.
#[derive(Debug, Clone)]
pub struct OutlierReport {
    /// Indices of rows kept, in input order
    pub retained: Vec<usize>,
    /// Mahalanobis distance of every row
    pub distances: Array1<f64>,
    /// Chi-squared critical value the distances were compared against
    pub critical_value: f64,
}

impl OutlierReport {
    /// Number of rows dropped as outliers.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.distances.len() - self.retained.len()
    }
}

/// Mahalanobis outlier filter with a chi-squared threshold.
#[derive(Debug, Clone, Copy)]
pub struct MahalanobisFilter {
    alpha: f64,
}

impl Default for MahalanobisFilter {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl MahalanobisFilter {
    /// Create a filter with the given significance level.
    ///
    /// # Errors
    /// Returns `InvalidAlpha` unless `0 < alpha < 1`.
    pub fn new(alpha: f64) -> Result<Self, OutlierError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(OutlierError::InvalidAlpha(alpha));
        }
        Ok(Self { alpha })
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Chi-squared critical value for `n_features` columns.
    ///
    /// # Errors
    /// Returns `DegreesOfFreedom` when fewer than two features are given.
    pub fn critical_value(&self, n_features: usize) -> Result<f64, OutlierError> {
        if n_features < 2 {
            return Err(OutlierError::DegreesOfFreedom(n_features));
        }
        let dof = n_features - 1;
        let chi2 =
            ChiSquared::new(dof as f64).map_err(|_| OutlierError::DegreesOfFreedom(n_features))?;
        Ok(chi2.inverse_cdf(1.0 - self.alpha))
    }

    /// Run the filter over an N x k matrix.
    ///
    /// # Errors
    /// Fails when the covariance or its inverse is degenerate, when the
    /// matrix has fewer than two columns, or when it holds non-finite values.
    pub fn apply(&self, data: ArrayView2<'_, f64>) -> Result<OutlierReport, OutlierError> {
        let critical_value = self.critical_value(data.ncols())?;
        let distances = mahalanobis_distances(data)?;

        let retained = distances
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d < critical_value)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        tracing::debug!(
            rows = data.nrows(),
            retained = retained.len(),
            critical_value,
            "Mahalanobis filter applied"
        );

        Ok(OutlierReport {
            retained,
            distances,
            critical_value,
        })
    }
}

/// Mahalanobis distance of every row from the column means.
///
/// # Errors
/// See [`MahalanobisFilter::apply`].
pub fn mahalanobis_distances(data: ArrayView2<'_, f64>) -> Result<Array1<f64>, OutlierError> {
    if let Some(((row, column), _)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(OutlierError::NonFinite { row, column });
    }

    // With N <= k the centred rows span at most N - 1 dimensions.
    if data.nrows() <= data.ncols() {
        return Err(OutlierError::DegenerateCovariance);
    }

    let means = data
        .mean_axis(Axis(0))
        .ok_or(OutlierError::DegenerateCovariance)?;
    let covariance = covariance(data);
    if !is_positive_definite(&covariance) {
        return Err(OutlierError::DegenerateCovariance);
    }

    let inverse = invert_spd(&covariance).ok_or(OutlierError::DegenerateCovariance)?;
    if !is_positive_definite(&inverse) {
        return Err(OutlierError::DegenerateInverse);
    }

    tracing::debug!("Covariance matrix:\n{covariance:.4}");
    tracing::debug!("Inverse covariance matrix:\n{inverse:.4}");
    tracing::debug!("Column means: {means:.4}");

    let distances = data
        .rows()
        .into_iter()
        .map(|row| {
            let diff = &row - &means;
            diff.dot(&inverse.dot(&diff)).max(0.0).sqrt()
        })
        .collect::<Array1<f64>>();

    Ok(distances)
}

/// Unbiased sample covariance (divisor N - 1) of the columns of `data`.
#[must_use]
pub fn covariance(data: ArrayView2<'_, f64>) -> Array2<f64> {
    let n = data.nrows();
    let k = data.ncols();
    if n < 2 {
        return Array2::zeros((k, k));
    }

    let means = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(k));
    let centred = &data - &means;
    centred.t().dot(&centred) / (n - 1) as f64
}

/// A matrix is positive-definite when it is symmetric and admits a Cholesky factor.
#[must_use]
pub fn is_positive_definite(a: &Array2<f64>) -> bool {
    is_symmetric(a) && llt(a).is_some()
}

fn is_symmetric(a: &Array2<f64>) -> bool {
    if !a.is_square() {
        return false;
    }
    a.indexed_iter().all(|((i, j), &v)| {
        let w = a[[j, i]];
        (v - w).abs() <= SYMMETRY_ATOL + SYMMETRY_RTOL * w.abs()
    })
}

/// Cholesky factorization `A = L Lᵀ` of a finite square matrix.
///
/// faer rejects a pivot that is not strictly positive, the same rule LAPACK
/// applies.
fn llt(a: &Array2<f64>) -> Option<Llt<f64>> {
    if !a.is_square() || a.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mat = Mat::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]]);
    mat.as_ref().llt(Side::Lower).ok()
}

/// Inverse of a symmetric positive-definite matrix through its Cholesky factor.
fn invert_spd(a: &Array2<f64>) -> Option<Array2<f64>> {
    let factor = llt(a)?;
    let n = a.nrows();
    let identity = Mat::<f64>::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 });
    let inverse = factor.solve(identity.as_ref());
    let inverse = inverse.as_ref();
    Some(Array2::from_shape_fn((n, n), |(i, j)| inverse[(i, j)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_matrix(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Array2::from_shape_fn((rows, cols), |(_, c)| {
            (c as f64 + 1.0) * 10.0 + rng.gen_range(-5.0..5.0)
        })
    }

    #[test]
    fn test_identity_is_positive_definite() {
        let identity = array![[1.0, 0.0], [0.0, 1.0]];
        assert!(is_positive_definite(&identity));
    }

    #[test]
    fn test_indefinite_matrix_rejected() {
        // Eigenvalues -1 and 3.
        let indefinite = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(!is_positive_definite(&indefinite));
    }

    #[test]
    fn test_scaled_diagonal_is_positive_definite() {
        assert!(is_positive_definite(&array![[1e-6, 0.0], [0.0, 1e7]]));
        assert!(!is_positive_definite(&array![[1e-6, 0.0], [0.0, 0.0]]));
        assert!(!is_positive_definite(&array![[f64::NAN, 0.0], [0.0, 1.0]]));
    }

    #[test]
    fn test_distances_invariant_to_column_scale() {
        let data = random_matrix(200, 3, 9);
        let mut scaled = data.clone();
        scaled.column_mut(0).mapv_inplace(|v| v * 1e-4);
        scaled.column_mut(2).mapv_inplace(|v| v * 1e5);

        let expected = mahalanobis_distances(data.view()).unwrap();
        let distances = mahalanobis_distances(scaled.view()).expect("scaled columns stay SPD");
        for (d, e) in distances.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*d, *e, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_asymmetric_matrix_rejected() {
        let asymmetric = array![[2.0, 0.5], [0.0, 2.0]];
        assert!(!is_positive_definite(&asymmetric));
    }

    #[test]
    fn test_covariance_matches_unbiased_estimate() {
        let data = array![[1.0, 2.0], [2.0, 4.0], [3.0, 7.0]];
        let cov = covariance(data.view());
        assert_abs_diff_eq!(cov[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[0, 1]], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 0]], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 1]], 6.333_333_333_333_333, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_times_matrix_is_identity() {
        let a = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let inv = invert_spd(&a).expect("SPD matrix");
        let product = a.dot(&inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(product[[i, j]], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_critical_value_uses_k_minus_one_dof() {
        let filter = MahalanobisFilter::default();
        // chi2.ppf(0.75, df=4)
        assert_abs_diff_eq!(filter.critical_value(5).unwrap(), 5.385_269_4, epsilon = 1e-4);
        // chi2.ppf(0.75, df=1)
        assert_abs_diff_eq!(filter.critical_value(2).unwrap(), 1.323_303_7, epsilon = 1e-4);
        assert_eq!(
            filter.critical_value(1),
            Err(OutlierError::DegreesOfFreedom(1))
        );
    }

    #[test]
    fn test_invalid_alpha() {
        assert_eq!(
            MahalanobisFilter::new(0.0).unwrap_err(),
            OutlierError::InvalidAlpha(0.0)
        );
        assert!(MahalanobisFilter::new(1.0).is_err());
        assert!(MahalanobisFilter::new(f64::NAN).is_err());
        assert!(MahalanobisFilter::new(0.05).is_ok());
    }

    #[test]
    fn test_well_conditioned_matrix_retains_rows_below_threshold() {
        let data = random_matrix(200, 5, 7);
        let report = MahalanobisFilter::default()
            .apply(data.view())
            .expect("well-conditioned data");

        assert!(!report.retained.is_empty());
        assert_eq!(report.distances.len(), 200);
        for &i in &report.retained {
            assert!(report.distances[i] < report.critical_value);
        }
        for (i, &d) in report.distances.iter().enumerate() {
            if !report.retained.contains(&i) {
                assert!(d >= report.critical_value);
            }
        }
        assert_eq!(report.removed() + report.retained.len(), 200);
    }

    #[test]
    fn test_minimal_row_count() {
        // N = k + 1 is the smallest shape with a full-rank covariance.
        let data = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let report = MahalanobisFilter::default().apply(data.view()).unwrap();
        assert!(!report.retained.is_empty());
    }

    #[test]
    fn test_too_few_rows_is_degenerate() {
        let data = random_matrix(3, 5, 1);
        for _ in 0..3 {
            assert_eq!(
                MahalanobisFilter::default().apply(data.view()).unwrap_err(),
                OutlierError::DegenerateCovariance
            );
        }
    }

    #[test]
    fn test_identical_rows_are_degenerate() {
        let data = Array2::from_elem((20, 5), 3.0);
        assert_eq!(
            mahalanobis_distances(data.view()).unwrap_err(),
            OutlierError::DegenerateCovariance
        );
    }

    #[test]
    fn test_constant_column_is_degenerate() {
        let data = Array2::from_shape_fn((30, 2), |(r, c)| if c == 0 { r as f64 } else { 4.0 });
        assert_eq!(
            mahalanobis_distances(data.view()).unwrap_err(),
            OutlierError::DegenerateCovariance
        );
    }

    #[test]
    fn test_non_finite_input() {
        let mut data = random_matrix(10, 3, 2);
        data[[4, 1]] = f64::NAN;
        assert_eq!(
            mahalanobis_distances(data.view()).unwrap_err(),
            OutlierError::NonFinite { row: 4, column: 1 }
        );
    }

    #[test]
    fn test_input_not_mutated() {
        let data = random_matrix(50, 4, 3);
        let before = data.clone();
        let _ = MahalanobisFilter::default().apply(data.view()).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn test_distance_of_uncorrelated_unit_data() {
        // Two symmetric columns with identity-scaled covariance.
        let data = array![[1.0, 0.0], [-1.0, 0.0], [0.0, 1.0], [0.0, -1.0]];
        let distances = mahalanobis_distances(data.view()).unwrap();
        // Covariance is diag(2/3, 2/3); each point is at distance sqrt(1.5).
        for d in distances.iter() {
            assert_abs_diff_eq!(*d, 1.5_f64.sqrt(), epsilon = 1e-12);
        }
    }
}
