use std::path::PathBuf;

use crate::error::{Error, Result};

/// Directory the cards are written to, relative to the working directory.
pub const OUTPUT_DIR: &str = "assets";

/// Languages whose share is strictly below this percentage are folded into "Other".
pub const DEFAULT_MIN_SHARE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub username: String,
    pub token: Option<String>,
    pub output_dir: PathBuf,
    pub min_share: f64,
}

impl Config {
    pub fn new(username: impl Into<String>, token: Option<String>) -> Self {
        Self {
            username: username.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            output_dir: PathBuf::from(OUTPUT_DIR),
            min_share: DEFAULT_MIN_SHARE,
        }
    }

    /// Read `USERNAME` (required) and `TOKEN` (optional) from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup("USERNAME")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("USERNAME environment variable not set".into()))?;

        Ok(Self::new(username, lookup("TOKEN")))
    }
}
