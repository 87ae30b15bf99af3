//! Dataset record types for the cardiovascular disease dataset.
//!
//! Categorical attributes are closed enumerations. Each one maps to the
//! integer code stored in `cardio_train.csv` and to the label shown in the UI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::encoding::EncodingError;

/// Days per year used to convert the stored `age` column.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Biological sex as recorded in the dataset (1 = women, 2 = men).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Women,
    Men,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Men, Gender::Women];

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Women => 1,
            Self::Men => 2,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Women => "Women",
            Self::Men => "Men",
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Women),
            2 => Some(Self::Men),
            _ => None,
        }
    }
}

/// Three-level laboratory result used for cholesterol and glucose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Normal,
    AboveNormal,
    WellAboveNormal,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Normal, Level::AboveNormal, Level::WellAboveNormal];

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::AboveNormal => 2,
            Self::WellAboveNormal => 3,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::AboveNormal => "Above normal",
            Self::WellAboveNormal => "Well above normal",
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::AboveNormal),
            3 => Some(Self::WellAboveNormal),
            _ => None,
        }
    }
}

/// Binary answer used for smoking, alcohol, activity and the outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YesNo {
    No,
    Yes,
}

impl YesNo {
    pub const ALL: [YesNo; 2] = [YesNo::Yes, YesNo::No];

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::No => 0,
            Self::Yes => 1,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::No => "No",
            Self::Yes => "Yes",
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::No),
            1 => Some(Self::Yes),
            _ => None,
        }
    }
}

macro_rules! impl_label_traits {
    ($ty:ty, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = EncodingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| EncodingError::InvalidCategory {
                        field: $field,
                        value: s.to_string(),
                    })
            }
        }
    };
}

impl_label_traits!(Gender, "gender");
impl_label_traits!(Level, "level");
impl_label_traits!(YesNo, "yes/no");

/// One respondent from `cardio_train.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardioRecord {
    pub id: u64,
    /// Age in days, as stored in the dataset
    pub age_days: f64,
    pub gender: Gender,
    /// Height in cm
    pub height: f64,
    /// Weight in kg
    pub weight: f64,
    /// Systolic blood pressure
    pub ap_hi: f64,
    /// Diastolic blood pressure
    pub ap_lo: f64,
    pub cholesterol: Level,
    pub gluc: Level,
    pub smoke: YesNo,
    pub alco: YesNo,
    pub active: YesNo,
    /// Outcome label (presence of cardiovascular disease)
    pub cardio: YesNo,
}

impl CardioRecord {
    #[must_use]
    pub fn age_years(&self) -> f64 {
        self.age_days / DAYS_PER_YEAR
    }

    /// Continuous fields in model order, with age converted to years.
    #[must_use]
    pub fn continuous(&self) -> [f64; 5] {
        [
            self.age_years(),
            self.height,
            self.weight,
            self.ap_hi,
            self.ap_lo,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_dataset() {
        assert_eq!(Gender::Women.code(), 1);
        assert_eq!(Gender::Men.code(), 2);
        assert_eq!(Level::WellAboveNormal.code(), 3);
        assert_eq!(YesNo::No.code(), 0);
        for level in Level::ALL {
            assert_eq!(Level::from_code(level.code()), Some(level));
        }
        assert_eq!(Gender::from_code(0), None);
        assert_eq!(YesNo::from_code(2), None);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Men".parse::<Gender>().unwrap(), Gender::Men);
        assert_eq!("Above normal".parse::<Level>().unwrap(), Level::AboveNormal);
        assert_eq!("No".parse::<YesNo>().unwrap(), YesNo::No);

        let err = "Maybe".parse::<YesNo>().unwrap_err();
        assert!(matches!(err, EncodingError::InvalidCategory { .. }));
        assert!("men".parse::<Gender>().is_err());
    }

    #[test]
    fn test_age_conversion() {
        let record = CardioRecord {
            id: 0,
            age_days: 18_250.0,
            gender: Gender::Women,
            height: 168.0,
            weight: 62.0,
            ap_hi: 110.0,
            ap_lo: 80.0,
            cholesterol: Level::Normal,
            gluc: Level::Normal,
            smoke: YesNo::No,
            alco: YesNo::No,
            active: YesNo::Yes,
            cardio: YesNo::No,
        };
        assert!((record.age_years() - 50.0).abs() < f64::EPSILON);
        assert_eq!(record.continuous()[1], 168.0);
    }
}
