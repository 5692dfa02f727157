use thiserror::Error;

/// Application-wide error types for placescout.
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream answered with a non-success HTTP status not covered below.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Upstream rate limit hit (HTTP 429 or `OVER_QUERY_LIMIT`).
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// API key lacks permission or quota (HTTP 403 or `REQUEST_DENIED`).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The requested place does not exist (HTTP 404 or `NOT_FOUND`).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The destination file exists but cannot be parsed.
    #[error("Malformed file {path}: {message}")]
    MalformedFile { path: String, message: String },

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid configuration (env vars, pacing bounds, field names).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true for transport-level failures: the item or phrase is
    /// skipped and the run carries on.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::HttpError { .. }
        )
    }

    /// Returns true if the upstream asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::RateLimitExceeded)
    }

    /// Map an upstream HTTP status code to the error taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => AppError::RateLimitExceeded,
            403 => AppError::PermissionDenied(message),
            404 => AppError::NotFound(message),
            _ => AppError::HttpError { status, message },
        }
    }
}
