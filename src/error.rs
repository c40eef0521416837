use std::path::PathBuf;

use thiserror::Error;

/// A single HTTP exchange failed before a status code was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[cfg(test)]
    #[error("{0}")]
    Other(String),
}

/// Fetching a listing page failed for good; the scrape is aborted.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed after {attempts} attempt(s)")]
    Request {
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("{url} kept answering with status {status} after {attempts} attempt(s)")]
    RetriesExhausted {
        url: String,
        status: u16,
        attempts: u32,
    },
}

/// Writing the jobs file failed; the previous file is left untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize jobs")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("scrape failed")]
    Network(#[from] FetchError),

    #[error("could not persist jobs")]
    Persistence(#[from] StoreError),
}
