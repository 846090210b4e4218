//! Error type shared by the fetch, render and write stages.

use std::path::{Path, PathBuf};

use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// GitHub rejected the credentials or throttled the caller.
    #[error("GitHub refused the request to {path} (HTTP {status}): {message}")]
    AuthOrRateLimit {
        status: StatusCode,
        path: String,
        message: String,
    },

    #[error("network error talking to GitHub: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GitHub API returned HTTP {status} for {path}")]
    Api { status: StatusCode, path: String },

    #[error("unexpected response body from {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },

    #[error("GraphQL reported errors: {0}")]
    GraphQl(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The renderer was handed data it cannot draw faithfully.
    #[error("rendering invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// Whether this error means a token or quota problem rather than a broken network.
    pub fn is_auth_or_rate_limit(&self) -> bool {
        matches!(self, Self::AuthOrRateLimit { .. })
    }
}

/// Maps a non-success HTTP status onto the matching error kind.
pub fn from_status(status: StatusCode, path: &str, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| body.trim().to_string());
            Error::AuthOrRateLimit {
                status,
                path: path.to_string(),
                message,
            }
        }
        _ => Error::Api {
            status,
            path: path.to_string(),
        },
    }
}
