//! Chart aggregations for the visualization page.
//!
//! Each chart is parameterized by columns picked from the numerical and
//! nominal column sets. Aggregations are pure functions over records; the TUI
//! only draws their output.

use std::collections::BTreeMap;
use std::fmt;

use super::record::{CardioRecord, Gender, Level, YesNo};

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 10;

/// Columns usable on a quantitative axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    Age,
    Height,
    Weight,
    ApHi,
    ApLo,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 5] = [
        Self::Age,
        Self::Height,
        Self::Weight,
        Self::ApHi,
        Self::ApLo,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Height => "height",
            Self::Weight => "weight",
            Self::ApHi => "ap_hi",
            Self::ApLo => "ap_lo",
        }
    }

    /// Value of this column for a record (age in years).
    #[must_use]
    pub fn value(self, record: &CardioRecord) -> f64 {
        match self {
            Self::Age => record.age_years(),
            Self::Height => record.height,
            Self::Weight => record.weight,
            Self::ApHi => record.ap_hi,
            Self::ApLo => record.ap_lo,
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        cycle(&Self::ALL, self)
    }
}

/// Columns usable as a colour encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalColumn {
    Gender,
    Cholesterol,
    Gluc,
    Smoke,
    Alco,
    Active,
    Cardio,
}

impl NominalColumn {
    pub const ALL: [NominalColumn; 7] = [
        Self::Gender,
        Self::Cholesterol,
        Self::Gluc,
        Self::Smoke,
        Self::Alco,
        Self::Active,
        Self::Cardio,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Cholesterol => "cholesterol",
            Self::Gluc => "gluc",
            Self::Smoke => "smoke",
            Self::Alco => "alco",
            Self::Active => "active",
            Self::Cardio => "cardio",
        }
    }

    /// Dataset code of this column for a record.
    #[must_use]
    pub fn code(self, record: &CardioRecord) -> u8 {
        match self {
            Self::Gender => record.gender.code(),
            Self::Cholesterol => record.cholesterol.code(),
            Self::Gluc => record.gluc.code(),
            Self::Smoke => record.smoke.code(),
            Self::Alco => record.alco.code(),
            Self::Active => record.active.code(),
            Self::Cardio => record.cardio.code(),
        }
    }

    /// Display label for a code of this column.
    #[must_use]
    pub fn label(self, code: u8) -> String {
        let label = match self {
            Self::Gender => Gender::from_code(code).map(Gender::label),
            Self::Cholesterol | Self::Gluc => Level::from_code(code).map(Level::label),
            Self::Smoke | Self::Alco | Self::Active | Self::Cardio => {
                YesNo::from_code(code).map(YesNo::label)
            }
        };
        match label {
            Some(l) => format!("{code} ({l})"),
            None => code.to_string(),
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        cycle(&Self::ALL, self)
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for NominalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let i = all.iter().position(|&c| c == current).unwrap_or(0);
    all[(i + 1) % all.len()]
}

/// One slice of a proportion (donut) chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub code: u8,
    pub label: String,
    pub count: usize,
    /// Fraction of all records, in [0, 1]
    pub share: f64,
}

/// Count records per category of `column`, sorted by code.
#[must_use]
pub fn proportions(records: &[CardioRecord], column: NominalColumn) -> Vec<Slice> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(column.code(record)).or_default() += 1;
    }

    let total = records.len().max(1) as f64;
    counts
        .into_iter()
        .map(|(code, count)| Slice {
            code,
            label: column.label(code),
            count,
            share: count as f64 / total,
        })
        .collect()
}

/// Binned counts of a numeric column, split by a nominal column.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin edges, `bins + 1` values
    pub edges: Vec<f64>,
    /// Category codes, sorted
    pub categories: Vec<u8>,
    /// `counts[bin][category]`
    pub counts: Vec<Vec<usize>>,
}

impl Histogram {
    #[must_use]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Equal-width histogram of `x` between its minimum and maximum.
///
/// The maximum value falls in the last bin. A constant column yields a
/// single bin of width 1 centred on the value.
#[must_use]
pub fn histogram(
    records: &[CardioRecord],
    x: NumericColumn,
    color: NominalColumn,
    bins: usize,
) -> Histogram {
    let categories: Vec<u8> = proportions(records, color).into_iter().map(|s| s.code).collect();
    let bins = bins.max(1);

    let (min, max) = records
        .iter()
        .map(|r| x.value(r))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if records.is_empty() {
        return Histogram {
            edges: Vec::new(),
            categories,
            counts: Vec::new(),
        };
    }

    let (min, max, bins) = if max > min {
        (min, max, bins)
    } else {
        (min - 0.5, min + 0.5, 1)
    };
    let width = (max - min) / bins as f64;
    let edges = (0..=bins).map(|i| min + width * i as f64).collect();

    let mut counts = vec![vec![0usize; categories.len()]; bins];
    for record in records {
        let v = x.value(record);
        let bin = (((v - min) / width) as usize).min(bins - 1);
        let code = color.code(record);
        if let Some(c) = categories.iter().position(|&k| k == code) {
            counts[bin][c] += 1;
        }
    }

    Histogram {
        edges,
        categories,
        counts,
    }
}

/// Points of one category in a scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub code: u8,
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Scatter points of `(x, y)` grouped by the categories of `color`.
#[must_use]
pub fn scatter(
    records: &[CardioRecord],
    x: NumericColumn,
    y: NumericColumn,
    color: NominalColumn,
) -> Vec<ScatterSeries> {
    let mut groups: BTreeMap<u8, Vec<(f64, f64)>> = BTreeMap::new();
    for record in records {
        groups
            .entry(color.code(record))
            .or_default()
            .push((x.value(record), y.value(record)));
    }

    groups
        .into_iter()
        .map(|(code, points)| ScatterSeries {
            code,
            label: color.label(code),
            points,
        })
        .collect()
}

/// Minimum and maximum of a column, or `None` for no records.
#[must_use]
pub fn bounds(records: &[CardioRecord], column: NumericColumn) -> Option<[f64; 2]> {
    let mut it = records.iter().map(|r| column.value(r));
    let first = it.next()?;
    Some(it.fold([first, first], |[lo, hi], v| [lo.min(v), hi.max(v)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, height: f64, gender: Gender, cardio: YesNo) -> CardioRecord {
        CardioRecord {
            id,
            age_days: 365.0 * 50.0,
            gender,
            height,
            weight: 70.0,
            ap_hi: 120.0,
            ap_lo: 80.0,
            cholesterol: Level::Normal,
            gluc: Level::AboveNormal,
            smoke: YesNo::No,
            alco: YesNo::No,
            active: YesNo::Yes,
            cardio,
        }
    }

    fn sample() -> Vec<CardioRecord> {
        vec![
            record(1, 150.0, Gender::Women, YesNo::No),
            record(2, 160.0, Gender::Women, YesNo::Yes),
            record(3, 170.0, Gender::Men, YesNo::Yes),
            record(4, 190.0, Gender::Men, YesNo::No),
        ]
    }

    #[test]
    fn test_proportions() {
        let slices = proportions(&sample(), NominalColumn::Gender);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].code, 1);
        assert_eq!(slices[0].label, "1 (Women)");
        assert_eq!(slices[0].count, 2);
        assert!((slices[1].share - 0.5).abs() < f64::EPSILON);

        let gluc = proportions(&sample(), NominalColumn::Gluc);
        assert_eq!(gluc.len(), 1);
        assert_eq!(gluc[0].label, "2 (Above normal)");
    }

    #[test]
    fn test_histogram_bins_and_max_in_last_bin() {
        let hist = histogram(&sample(), NumericColumn::Height, NominalColumn::Cardio, 4);
        assert_eq!(hist.bins(), 4);
        assert_eq!(hist.edges, vec![150.0, 160.0, 170.0, 180.0, 190.0]);
        assert_eq!(hist.categories, vec![0, 1]);
        // 150 -> bin 0 (No), 160 -> bin 1 (Yes), 170 -> bin 2 (Yes), 190 -> bin 3 (No)
        assert_eq!(hist.counts, vec![vec![1, 0], vec![0, 1], vec![0, 1], vec![1, 0]]);
        assert_eq!(hist.total(), 4);
    }

    #[test]
    fn test_histogram_constant_column() {
        let hist = histogram(&sample(), NumericColumn::Weight, NominalColumn::Gender, 10);
        assert_eq!(hist.bins(), 1);
        assert_eq!(hist.counts[0], vec![2, 2]);
    }

    #[test]
    fn test_histogram_empty() {
        let hist = histogram(&[], NumericColumn::Age, NominalColumn::Gender, 10);
        assert_eq!(hist.bins(), 0);
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_scatter_groups_by_category() {
        let series = scatter(
            &sample(),
            NumericColumn::Height,
            NumericColumn::Age,
            NominalColumn::Cardio,
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].label, "1 (Yes)");
        assert_eq!(series[1].points, vec![(160.0, 50.0), (170.0, 50.0)]);
    }

    #[test]
    fn test_bounds_and_cycle() {
        assert_eq!(bounds(&sample(), NumericColumn::Height), Some([150.0, 190.0]));
        assert_eq!(bounds(&[], NumericColumn::Height), None);
        assert_eq!(NumericColumn::ApLo.next(), NumericColumn::Age);
        assert_eq!(NominalColumn::Gender.next(), NominalColumn::Cholesterol);
    }
}
