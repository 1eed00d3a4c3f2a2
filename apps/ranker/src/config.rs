use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::documents::DEFAULT_MAX_FILE_BYTES;
use crate::ranking::name_policy::DEFAULT_CONFIDENCE_THRESHOLD;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_CONCURRENT_RESUMES: usize = 4;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or numbers do not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Per-request bound on resumes processed at once.
    pub max_concurrent_resumes: usize,
    /// Per-file upload limit.
    pub max_upload_bytes: usize,
    pub name_confidence_threshold: u8,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_concurrent_resumes =
            optional_env("MAX_CONCURRENT_RESUMES", DEFAULT_MAX_CONCURRENT_RESUMES)?;
        if max_concurrent_resumes == 0 {
            bail!("MAX_CONCURRENT_RESUMES must be at least 1");
        }

        let name_confidence_threshold =
            optional_env("NAME_CONFIDENCE_THRESHOLD", DEFAULT_CONFIDENCE_THRESHOLD)?;
        if name_confidence_threshold > 100 {
            bail!("NAME_CONFIDENCE_THRESHOLD must be between 0 and 100");
        }

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", DEFAULT_PORT)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_concurrent_resumes,
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_FILE_BYTES)?,
            name_confidence_threshold,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
