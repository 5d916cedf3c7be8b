use thiserror::Error;

use crate::feed::FeedError;
use crate::fetcher::FetchError;

/// Feed-level fatal errors. Recorded on the fetch log, never propagated past
/// the pipeline boundary.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("feed source not found: {0}")]
    FeedNotFound(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("unparseable feed: {0}")]
    Parse(#[from] FeedError),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("article not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
