use std::path::PathBuf;
use std::time::Duration;

use placescout_core::error::AppError;

use crate::places::DEFAULT_BASE_URL;

/// Places client and storage configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub data_dir: PathBuf,
}

impl PlacesConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PLACES_API_KEY` (optional here, required to run)
    /// - `PLACES_BASE_URL` (optional, defaults to the public Places endpoint)
    /// - `PLACES_TIMEOUT_SECS` (optional, defaults to 10)
    /// - `PLACESCOUT_DATA_DIR` (optional, defaults to `data`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_key = lookup("PLACES_API_KEY").filter(|k| !k.trim().is_empty());

        let base_url = lookup("PLACES_BASE_URL")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = match lookup("PLACES_TIMEOUT_SECS") {
            None => Duration::from_secs(10),
            Some(raw) => {
                let parsed: u64 = raw.trim().parse().map_err(|_| {
                    AppError::ConfigError(format!(
                        "Invalid PLACES_TIMEOUT_SECS '{raw}': must be a positive integer"
                    ))
                })?;
                if parsed == 0 {
                    return Err(AppError::ConfigError(
                        "PLACES_TIMEOUT_SECS must be at least 1".into(),
                    ));
                }
                Duration::from_secs(parsed)
            }
        };

        let data_dir = lookup("PLACESCOUT_DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        Ok(Self {
            api_key,
            base_url,
            timeout,
            data_dir,
        })
    }

    /// The API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, AppError> {
        self.api_key.as_deref().ok_or_else(|| {
            AppError::ConfigError(
                "PLACES_API_KEY not set. Pass --api-key or export PLACES_API_KEY.".into(),
            )
        })
    }
}
