//! Feature encoding for the pretrained risk model.
//!
//! Produces the 19-column layout the model was trained on: five standardized
//! continuous values followed by one-hot indicators for each categorical
//! group. Column order is fixed by [`FEATURE_COLUMNS`].

use serde::{Deserialize, Serialize};

use super::record::{Gender, Level, YesNo};
use super::reference::ReferenceStats;

/// Number of encoded features.
pub const N_FEATURES: usize = 19;

/// Continuous columns, in model order.
pub const CONTINUOUS_COLUMNS: [&str; 5] = ["age", "height", "weight", "ap_hi", "ap_lo"];

/// Encoded columns, in the exact order the model expects.
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = [
    "age",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "gender_1",
    "gender_2",
    "cholesterol_1",
    "cholesterol_2",
    "cholesterol_3",
    "gluc_1",
    "gluc_2",
    "gluc_3",
    "smoke_0",
    "smoke_1",
    "alco_0",
    "alco_1",
    "active_0",
    "active_1",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodingError {
    #[error("invalid category {value:?} for {field}")]
    InvalidCategory { field: &'static str, value: String },

    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
}

/// Categorical groups of the encoded layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalField {
    Gender,
    Cholesterol,
    Gluc,
    Smoke,
    Alco,
    Active,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 6] = [
        Self::Gender,
        Self::Cholesterol,
        Self::Gluc,
        Self::Smoke,
        Self::Alco,
        Self::Active,
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
        }
    }

    /// Codes of the group, in column order.
    #[must_use]
    pub fn codes(self) -> &'static [u8] {
        match self {
            Self::Gender => &[1, 2],
            Self::Cholesterol | Self::Gluc => &[1, 2, 3],
            Self::Smoke | Self::Alco | Self::Active => &[0, 1],
        }
    }

    /// Index of the group's first indicator column.
    fn offset(self) -> usize {
        match self {
            Self::Gender => 5,
            Self::Cholesterol => 7,
            Self::Gluc => 10,
            Self::Smoke => 13,
            Self::Alco => 15,
            Self::Active => 17,
        }
    }

    /// Column index of the `{field}_{code}` indicator.
    ///
    /// Codes outside the group are rejected.
    pub fn column(self, code: u8) -> Result<usize, EncodingError> {
        let position = self
            .codes()
            .iter()
            .position(|&c| c == code)
            .ok_or_else(|| EncodingError::InvalidCategory {
                field: self.name(),
                value: code.to_string(),
            })?;
        Ok(self.offset() + position)
    }

    /// Indicator columns of this group.
    #[must_use]
    pub fn columns(self) -> std::ops::Range<usize> {
        self.offset()..self.offset() + self.codes().len()
    }
}

/// Continuous measurements in natural units, age in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalMeasurements {
    pub age_years: f64,
    pub height: f64,
    pub weight: f64,
    pub ap_hi: f64,
    pub ap_lo: f64,
}

impl ClinicalMeasurements {
    #[must_use]
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.age_years,
            self.height,
            self.weight,
            self.ap_hi,
            self.ap_lo,
        ]
    }
}

/// Categorical answers of one patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSelections {
    pub gender: Gender,
    pub cholesterol: Level,
    pub gluc: Level,
    pub smoke: YesNo,
    pub alco: YesNo,
    pub active: YesNo,
}

fn parse_label<T>(field: CategoricalField, label: &str) -> Result<T, EncodingError>
where
    T: std::str::FromStr<Err = EncodingError>,
{
    label.parse().map_err(|_| EncodingError::InvalidCategory {
        field: field.name(),
        value: label.to_string(),
    })
}

impl CategoricalSelections {
    /// Parse the UI labels ("Men", "Above normal", "Yes", ...).
    ///
    /// # Errors
    /// Returns `InvalidCategory` naming the field whose label is unknown.
    pub fn from_labels(
        gender: &str,
        cholesterol: &str,
        gluc: &str,
        smoke: &str,
        alco: &str,
        active: &str,
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            gender: parse_label(CategoricalField::Gender, gender)?,
            cholesterol: parse_label(CategoricalField::Cholesterol, cholesterol)?,
            gluc: parse_label(CategoricalField::Gluc, gluc)?,
            smoke: parse_label(CategoricalField::Smoke, smoke)?,
            alco: parse_label(CategoricalField::Alco, alco)?,
            active: parse_label(CategoricalField::Active, active)?,
        })
    }

    /// Dataset code of each group, in `CategoricalField::ALL` order.
    #[must_use]
    pub fn codes(&self) -> [(CategoricalField, u8); 6] {
        [
            (CategoricalField::Gender, self.gender.code()),
            (CategoricalField::Cholesterol, self.cholesterol.code()),
            (CategoricalField::Gluc, self.gluc.code()),
            (CategoricalField::Smoke, self.smoke.code()),
            (CategoricalField::Alco, self.alco.code()),
            (CategoricalField::Active, self.active.code()),
        ]
    }
}

/// A single encoded row ready for the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeatures([f64; N_FEATURES]);

impl EncodedFeatures {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of a named column, if the name is part of the layout.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|&c| c == column)
            .map(|i| self.0[i])
    }
}

/// Encode one patient with the given reference statistics.
///
/// # Errors
/// Returns `NonFinite` when a measurement is NaN or infinite.
pub fn encode(
    measurements: &ClinicalMeasurements,
    selections: &CategoricalSelections,
    stats: &ReferenceStats,
) -> Result<EncodedFeatures, EncodingError> {
    let mut row = [0.0; N_FEATURES];

    for (i, value) in measurements.to_array().into_iter().enumerate() {
        if !value.is_finite() {
            return Err(EncodingError::NonFinite {
                field: CONTINUOUS_COLUMNS[i],
            });
        }
        row[i] = stats.standardize(i, value);
    }

    for (field, code) in selections.codes() {
        row[field.column(code)?] = 1.0;
    }

    Ok(EncodedFeatures(row))
}
