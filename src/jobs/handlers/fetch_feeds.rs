use async_trait::async_trait;
use tracing::{info, warn};

use crate::ingest::FeedIngestor;
use crate::jobs::handler::JobHandler;

/// Periodic `fetch_all_feeds` trigger.
#[derive(Clone)]
pub struct FetchFeedsJob {
    ingestor: FeedIngestor,
}

impl FetchFeedsJob {
    pub fn new(ingestor: FeedIngestor) -> Self {
        Self { ingestor }
    }
}

#[async_trait]
impl JobHandler for FetchFeedsJob {
    async fn run(&self) -> anyhow::Result<()> {
        let summary = self.ingestor.fetch_all_feeds().await?;
        for failed in summary.results.iter().filter(|r| !r.is_success()) {
            warn!(
                feed = %failed.feed_name,
                error = failed.error.as_deref().unwrap_or_default(),
                "Feed failed during scheduled fetch"
            );
        }
        info!(
            total = summary.total_feeds,
            succeeded = summary.succeeded,
            new_articles = summary.results.iter().map(|r| r.articles_processed).sum::<u64>(),
            "Scheduled fetch complete"
        );
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "fetch_all_feeds"
    }
}
