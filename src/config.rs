use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use url::Url;

use crate::fetcher::RetryPolicy;
use crate::pipeline::MAX_PAGES;

const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];

pub const JOBS_FILE: &str = "jobs.json";

/// How refreshes happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Local use: refresh only through the explicit `/refresh` request.
    Manual,
    /// Public deployment: `/refresh` is gone, stale data is refreshed in the background.
    Automatic,
}

impl Mode {
    /// Pause between listing pages.
    pub fn scrape_delay(self) -> Duration {
        match self {
            Mode::Manual => Duration::from_millis(100),
            Mode::Automatic => Duration::from_secs(1),
        }
    }
}

/// Reads the `PUBLIC_DEPLOY` toggle. Anything outside the truthy set is manual.
pub fn parse_mode(raw: Option<&str>) -> Mode {
    let value = raw.unwrap_or("").trim().to_lowercase();
    if TRUTHY.contains(&value.as_str()) {
        Mode::Automatic
    } else {
        Mode::Manual
    }
}

/// Application configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub listing_url: String,
    pub base_url: Url,
    pub max_pages: usize,
    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let listing_url = lookup("JOBS_LISTING_URL")
            .unwrap_or_else(|| "https://www.cocuma.cz/jobs/".to_string());
        Url::parse(&listing_url).context("JOBS_LISTING_URL must be a valid URL")?;

        let base_url = Url::parse(
            &lookup("JOBS_BASE_URL").unwrap_or_else(|| "https://www.cocuma.cz".to_string()),
        )
        .context("JOBS_BASE_URL must be a valid URL")?;

        let max_pages = match lookup("SCRAPE_MAX_PAGES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("SCRAPE_MAX_PAGES must be a number")?,
            None => MAX_PAGES,
        };
        if max_pages == 0 {
            bail!("SCRAPE_MAX_PAGES must be at least 1");
        }

        Ok(Self {
            mode: parse_mode(lookup("PUBLIC_DEPLOY").as_deref()),
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .trim()
                .parse()
                .context("PORT must be a valid number")?,
            data_dir: lookup("JOBS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            listing_url,
            base_url,
            max_pages,
            retry: RetryPolicy::default(),
        })
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.data_dir.join(JOBS_FILE)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
