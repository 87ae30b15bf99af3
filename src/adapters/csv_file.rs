//! CSV adapter: Implementation of DatasetSource over a local file.
//!
//! Reads the semicolon-delimited `cardio_train.csv` layout:
//! `id;age;gender;height;weight;ap_hi;ap_lo;cholesterol;gluc;smoke;alco;active;cardio`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::{CardioRecord, Gender, Level, YesNo};
use crate::ports::{DatasetError, DatasetSource};

/// Raw row as stored in the file, before category validation.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: u64,
    age: f64,
    gender: u8,
    height: f64,
    weight: f64,
    ap_hi: f64,
    ap_lo: f64,
    cholesterol: u8,
    gluc: u8,
    smoke: u8,
    alco: u8,
    active: u8,
    cardio: u8,
}

impl CsvRow {
    fn into_record(self) -> Result<CardioRecord, String> {
        fn code<T>(field: &str, value: u8, parse: fn(u8) -> Option<T>) -> Result<T, String> {
            parse(value).ok_or_else(|| format!("unknown {field} code {value}"))
        }

        Ok(CardioRecord {
            id: self.id,
            age_days: self.age,
            gender: code("gender", self.gender, Gender::from_code)?,
            height: self.height,
            weight: self.weight,
            ap_hi: self.ap_hi,
            ap_lo: self.ap_lo,
            cholesterol: code("cholesterol", self.cholesterol, Level::from_code)?,
            gluc: code("gluc", self.gluc, Level::from_code)?,
            smoke: code("smoke", self.smoke, YesNo::from_code)?,
            alco: code("alco", self.alco, YesNo::from_code)?,
            active: code("active", self.active, YesNo::from_code)?,
            cardio: code("cardio", self.cardio, YesNo::from_code)?,
        })
    }
}

/// Parse dataset records from any reader.
///
/// # Errors
/// Returns `DatasetError::Csv` for malformed rows, `InvalidRecord` for
/// category codes outside the dataset's enumerations, and `Empty` when the
/// input holds no rows.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<CardioRecord>, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut raw = csv::StringRecord::new();
    let mut records = Vec::new();

    while rdr.read_record(&mut raw)? {
        let line = raw.position().map_or(0, |p| p.line());
        let row: CsvRow = raw.deserialize(Some(&headers))?;
        let record = row
            .into_record()
            .map_err(|reason| DatasetError::InvalidRecord { line, reason })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(records)
}

/// Dataset source backed by a local CSV file.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("local file {}", self.path.display())
    }

    fn fetch(&self) -> Result<Arc<[CardioRecord]>, DatasetError> {
        let file = std::fs::File::open(&self.path).map_err(|source| DatasetError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let records = parse_records(std::io::BufReader::new(file))?;
        tracing::info!("Loaded {} records from {:?}", records.len(), self.path);
        Ok(records.into())
    }
}
