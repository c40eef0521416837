use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{FetchError, RefreshError, TransportError};
use crate::extractor::{CocumaCards, ExtractionStrategy};
use crate::fetcher::{page_url, Fetcher, ReqwestTransport, Transport};
use crate::job::JobRecord;
use crate::store;

pub const MAX_PAGES: usize = 100;

/// Builds a fresh transport on the thread that runs the scrape.
pub type TransportFactory =
    Arc<dyn Fn() -> Result<Box<dyn Transport>, TransportError> + Send + Sync>;

pub fn reqwest_transport_factory() -> TransportFactory {
    Arc::new(|| Ok(Box::new(ReqwestTransport::new()?) as Box<dyn Transport>))
}

/// Walks the paginated listing and collects unique job records.
pub struct Scraper {
    fetcher: Fetcher,
    strategy: Box<dyn ExtractionStrategy>,
    listing_url: String,
    base_url: Url,
    max_pages: usize,
}

impl Scraper {
    pub fn new(fetcher: Fetcher, listing_url: impl Into<String>, base_url: Url) -> Self {
        Self {
            fetcher,
            strategy: Box::new(CocumaCards::new()),
            listing_url: listing_url.into(),
            base_url,
            max_pages: MAX_PAGES,
        }
    }

    pub fn from_config(config: &Config, transport: Box<dyn Transport>) -> Self {
        Self::new(
            Fetcher::new(transport, config.retry.clone()),
            config.listing_url.clone(),
            config.base_url.clone(),
        )
        .with_max_pages(config.max_pages)
    }

    #[cfg(test)]
    pub fn with_strategy(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetches pages until one answers non-200, has no cards, or the page
    /// ceiling is hit. `delay` is slept after every page that yielded cards.
    ///
    /// Any fetch error aborts the whole scrape; nothing collected so far is returned.
    pub fn scrape(&self, delay: Duration) -> Result<Vec<JobRecord>, FetchError> {
        let mut jobs = Vec::new();
        let mut seen_links = HashSet::new();

        for page in 1..=self.max_pages {
            let url = page_url(&self.listing_url, page);
            let response = self.fetcher.fetch(&url)?;
            if !response.is_ok() {
                debug!(page, status = response.status, "Stopping at non-200 page");
                break;
            }

            let extracted = self.strategy.extract(&response.body, &self.base_url);
            if extracted.cards == 0 {
                debug!(page, "Stopping at page without cards");
                break;
            }

            let before = jobs.len();
            for job in extracted.jobs {
                if !job.has_required_fields() {
                    continue;
                }
                if seen_links.insert(job.link.clone()) {
                    jobs.push(job);
                }
            }
            info!(
                page,
                cards = extracted.cards,
                new_jobs = jobs.len() - before,
                "Scraped listing page"
            );

            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        Ok(jobs)
    }

    /// Scrapes and, only if that fully succeeds, replaces the jobs file.
    pub fn refresh(&self, path: &Path, delay: Duration) -> Result<usize, RefreshError> {
        let jobs = self.scrape(delay)?;
        store::save_atomic(path, &jobs)?;
        info!(jobs = jobs.len(), path = %path.display(), "Saved scraped jobs");
        Ok(jobs.len())
    }
}

/// One complete refresh with a transport built on the calling thread.
/// Blocks; call it from `spawn_blocking` when on the async runtime.
pub fn run_refresh(
    config: &Config,
    transports: &TransportFactory,
    delay: Duration,
) -> Result<usize, RefreshError> {
    let transport = transports().map_err(|source| FetchError::Request {
        url: config.listing_url.clone(),
        attempts: 0,
        source,
    })?;
    Scraper::from_config(config, transport).refresh(&config.jobs_path(), delay)
}
