//! Runtime configuration from `CARDIOLENS_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::{default_dataset_url, Credentials};
use crate::domain::outlier::DEFAULT_ALPHA;
use crate::domain::MahalanobisFilter;

/// Default number of records drawn for the visualization page.
pub const DEFAULT_SAMPLE_SIZE: usize = 5000;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dataset_url: String,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub http_timeout: Duration,
    pub sample_size: usize,
    pub sample_seed: Option<u64>,
    pub outlier_alpha: f64,
    /// Skip the remote dataset source entirely.
    pub offline: bool,
    pub credentials: Option<Credentials>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_url: default_dataset_url(),
            dataset_path: PathBuf::from("cardio_train.csv"),
            model_path: PathBuf::from("models/cardiovascular_nn_model.json"),
            http_timeout: Duration::from_secs(30),
            sample_size: DEFAULT_SAMPLE_SIZE,
            sample_seed: None,
            outlier_alpha: DEFAULT_ALPHA,
            offline: false,
            credentials: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` for values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Unset and empty variables keep their defaults.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` for values that do not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("CARDIOLENS_DATASET_URL") {
            config.dataset_url = url;
        }
        if let Some(path) = get("CARDIOLENS_DATASET_PATH") {
            config.dataset_path = PathBuf::from(path);
        }
        if let Some(path) = get("CARDIOLENS_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(raw) = get("CARDIOLENS_HTTP_TIMEOUT_SECS") {
            let secs: u64 = parse("CARDIOLENS_HTTP_TIMEOUT_SECS", &raw)?;
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get("CARDIOLENS_SAMPLE_SIZE") {
            let size: usize = parse("CARDIOLENS_SAMPLE_SIZE", &raw)?;
            if size == 0 {
                return Err(invalid("CARDIOLENS_SAMPLE_SIZE", &raw));
            }
            config.sample_size = size;
        }
        if let Some(raw) = get("CARDIOLENS_SAMPLE_SEED") {
            config.sample_seed = Some(parse("CARDIOLENS_SAMPLE_SEED", &raw)?);
        }
        if let Some(raw) = get("CARDIOLENS_OUTLIER_ALPHA") {
            let alpha: f64 = parse("CARDIOLENS_OUTLIER_ALPHA", &raw)?;
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(invalid("CARDIOLENS_OUTLIER_ALPHA", &raw));
            }
            config.outlier_alpha = alpha;
        }
        if let Some(raw) = get("CARDIOLENS_OFFLINE") {
            config.offline = parse_bool("CARDIOLENS_OFFLINE", &raw)?;
        }

        config.credentials = match (get("KAGGLE_USERNAME"), get("KAGGLE_KEY")) {
            (Some(username), Some(key)) => Some(Credentials { username, key }),
            _ => None,
        };

        Ok(config)
    }

    /// Outlier filter at the configured significance level.
    ///
    /// # Errors
    /// Returns `CardiolensError::Outlier` when the level lies outside (0, 1).
    pub fn outlier_filter(&self) -> crate::Result<MahalanobisFilter> {
        Ok(MahalanobisFilter::new(self.outlier_alpha)?)
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}
