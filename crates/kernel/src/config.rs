//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Directory of Tera templates. When None, the built-in templates are used.
    pub theme_dir: Option<PathBuf>,

    /// YAML site fixture loaded into the in-memory store at startup.
    pub site_fixture: Option<PathBuf>,

    /// Extensions activated at startup, in order (comma-separated).
    pub extensions: Vec<String>,

    /// Register the ETag processors (default: true).
    pub enable_etag: bool,

    /// `X-Frame-Options` value; empty disables the header (default: DENY).
    pub frame_options: Option<String>,

    /// Request timeout in seconds (default: 30).
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let theme_dir = env::var("THEME_DIR").ok().map(PathBuf::from);
        let site_fixture = env::var("SITE_FIXTURE").ok().map(PathBuf::from);

        let extensions = env::var("SITE_EXTENSIONS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|_| {
                ["changedate", "datepublisher", "titles", "seo", "navigation"]
                    .map(String::from)
                    .to_vec()
            });

        let enable_etag = env::var("ENABLE_ETAG")
            .map(|v| parse_bool(&v))
            .unwrap_or(Ok(true))
            .context("ENABLE_ETAG must be true or false")?;

        let frame_options = match env::var("FRAME_OPTIONS") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(v.trim().to_string()),
            Err(_) => Some("DENY".to_string()),
        };

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            port,
            theme_dir,
            site_fixture,
            extensions,
            enable_etag,
            frame_options,
            request_timeout_secs,
        })
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognized boolean '{other}'"),
    }
}
