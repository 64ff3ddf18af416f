// File: crates/sextant-feed/src/error.rs
// Summary: Transport and configuration error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),
    #[error("service answered with status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no data available for `{0}`")]
    Unavailable(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid service URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Http(err)
        }
    }
}

impl FetchError {
    /// Whether asking again later can succeed. Malformed payloads and unknown
    /// symbols will not fix themselves.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(_) | FetchError::Timeout => true,
            FetchError::Status(code) => *code >= 500 || *code == 429,
            FetchError::Decode(_) | FetchError::Unavailable(_) | FetchError::InvalidUrl(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_by_kind() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Status(429).is_retryable());
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Unavailable("X".into()).is_retryable());
        assert!(!FetchError::InvalidUrl("nope".into()).is_retryable());
    }
}
