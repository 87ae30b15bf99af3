//! HTTP adapter: Downloads the dataset CSV from a remote repository.
//!
//! The default URL points at the Kaggle single-file download endpoint of
//! `sulianova/cardiovascular-disease-dataset`. Kaggle requires API
//! credentials, sent as HTTP basic auth when configured. The endpoint usually
//! answers with a zip archive holding the CSV, which is unpacked in memory.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::CardioRecord;
use crate::ports::{DatasetError, DatasetSource};

use super::csv_file::parse_records;

/// Dataset identifier on the remote repository.
pub const DATASET_ID: &str = "sulianova/cardiovascular-disease-dataset";

/// File inside the dataset.
pub const DATASET_FILE: &str = "cardio_train.csv";

/// Default download URL for [`DATASET_FILE`].
#[must_use]
pub fn default_dataset_url() -> String {
    format!("https://www.kaggle.com/api/v1/datasets/download/{DATASET_ID}/{DATASET_FILE}")
}

/// Basic-auth credentials for the dataset repository.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Dataset source that downloads the CSV over HTTP(S).
#[derive(Debug, Clone)]
pub struct RemoteCsvSource {
    url: String,
    timeout: Duration,
    credentials: Option<Credentials>,
}

impl RemoteCsvSource {
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            credentials: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    fn download(&self) -> Result<Vec<u8>, DatasetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DatasetError::Download(e.to_string()))?;

        let mut request = client.get(&self.url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.key));
        }

        let response = request
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| DatasetError::Download(e.to_string()))?;

        let body = response
            .bytes()
            .map_err(|e| DatasetError::Download(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Zip archives start with the local file header signature.
fn is_zip_archive(body: &[u8]) -> bool {
    body.starts_with(b"PK\x03\x04")
}

/// Parse a downloaded body, either plain CSV or a zip holding [`DATASET_FILE`].
fn records_from_body(body: &[u8]) -> Result<Vec<CardioRecord>, DatasetError> {
    if !is_zip_archive(body) {
        return parse_records(body);
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(body))?;
    let entry = archive.by_name(DATASET_FILE)?;
    tracing::debug!("Extracting {} ({} bytes)", entry.name(), entry.size());
    parse_records(entry)
}

impl DatasetSource for RemoteCsvSource {
    fn describe(&self) -> String {
        format!("remote {}", self.url)
    }

    fn fetch(&self) -> Result<Arc<[CardioRecord]>, DatasetError> {
        tracing::info!("Downloading dataset from {}", self.url);
        let body = self.download()?;

        let records = records_from_body(&body)?;
        tracing::info!("Downloaded {} records", records.len());
        Ok(records.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_file::tests::SAMPLE_CSV;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zipped(name: &str, contents: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(name, SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(contents.as_bytes()).expect("write entry");
        writer.finish().expect("finish archive").into_inner()
    }

    #[test]
    fn test_default_url_names_dataset() {
        let url = default_dataset_url();
        assert!(url.starts_with("https://"));
        assert!(url.ends_with("sulianova/cardiovascular-disease-dataset/cardio_train.csv"));
    }

    #[test]
    fn test_zip_detection() {
        assert!(is_zip_archive(b"PK\x03\x04rest"));
        assert!(!is_zip_archive(b"id;age;gender"));
    }

    #[test]
    fn test_plain_csv_body() {
        let records = records_from_body(SAMPLE_CSV.as_bytes()).expect("csv body");
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn test_zipped_body_is_extracted() {
        let body = zipped(DATASET_FILE, SAMPLE_CSV);
        assert!(is_zip_archive(&body));

        let records = records_from_body(&body).expect("zip body");
        assert_eq!(records.len(), 5);
        assert_eq!(records, parse_records(SAMPLE_CSV.as_bytes()).expect("csv"));
    }

    #[test]
    fn test_zip_without_dataset_entry() {
        let body = zipped("readme.txt", "nothing here");
        assert!(matches!(
            records_from_body(&body),
            Err(DatasetError::Archive(_))
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = Credentials {
            username: "analyst".into(),
            key: "s3cr3t".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("analyst"));
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn test_unreachable_host_is_download_error() {
        // Port 9 on localhost: connection refused without touching the network.
        let source = RemoteCsvSource::new("http://127.0.0.1:9/cardio_train.csv", Duration::from_secs(2));
        assert!(matches!(source.fetch(), Err(DatasetError::Download(_))));
    }
}
