use futures::{StreamExt, stream};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::entities::{FeedSource, FetchStatus, NewArticle};
use crate::feed::{Entry, parse_feed_text, published_at};
use crate::fetcher::HttpFetcher;
use crate::ingest::errors::IngestError;
use crate::ingest::types::{FetchAllSummary, FetchResult};
use crate::repositories::NewsRepository;
use crate::slug::{SlugCache, generate_unique_slug};

/// Drives fetch → parse → dedup → batch upsert → fetch log, per feed.
#[derive(Clone)]
pub struct FeedIngestor {
    repo: Arc<dyn NewsRepository>,
    fetcher: HttpFetcher,
    slugs: Arc<SlugCache>,
    concurrency: usize,
}

impl FeedIngestor {
    pub fn new(
        repo: Arc<dyn NewsRepository>,
        fetcher: HttpFetcher,
        slugs: Arc<SlugCache>,
        concurrency: usize,
    ) -> Self {
        Self {
            repo,
            fetcher,
            slugs,
            concurrency: concurrency.max(1),
        }
    }

    /// Ingest one feed. Failures are reported in the result and the fetch
    /// log, never returned as errors.
    #[instrument(skip(self, feed), fields(feed = %feed.name))]
    pub async fn fetch_feed(&self, feed: &FeedSource) -> FetchResult {
        let started = Instant::now();
        let log_id = match self.repo.record_fetch_log(&feed.name).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "Could not open fetch log");
                None
            }
        };

        let outcome = self.ingest(feed).await;
        let execution_time_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        let result = match outcome {
            Ok((found, processed)) => {
                info!(found, processed, execution_time_ms, "Feed ingested");
                FetchResult {
                    feed_name: feed.name.clone(),
                    category: feed.category,
                    status: FetchStatus::Success,
                    articles_found: found,
                    articles_processed: processed,
                    execution_time_ms,
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, execution_time_ms, "Feed ingestion failed");
                FetchResult {
                    feed_name: feed.name.clone(),
                    category: feed.category,
                    status: FetchStatus::Error,
                    articles_found: 0,
                    articles_processed: 0,
                    execution_time_ms,
                    error: Some(e.to_string()),
                }
            }
        };

        if let Some(id) = log_id
            && let Err(e) = self.repo.update_fetch_log(id, &result.log_update()).await
        {
            warn!(log_id = id, error = %e, "Could not close fetch log");
        }
        result
    }

    /// Ingest every active feed with bounded concurrency. One feed failing
    /// never stops the others.
    #[instrument(skip(self))]
    pub async fn fetch_all_feeds(&self) -> Result<FetchAllSummary, IngestError> {
        let feeds = self.repo.list_active_feed_sources().await?;
        info!(feeds = feeds.len(), "Fetching all active feeds");

        let results: Vec<FetchResult> = stream::iter(feeds)
            .map(|feed| async move { self.fetch_feed(&feed).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let summary = FetchAllSummary::new(results);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Finished fetching feeds"
        );
        Ok(summary)
    }

    /// Manual trigger for a single feed, looked up by name.
    pub async fn fetch_feed_by_name(&self, name: &str) -> Result<FetchResult, IngestError> {
        let feed = self
            .repo
            .find_feed_source(name)
            .await?
            .ok_or_else(|| IngestError::FeedNotFound(name.to_string()))?;
        Ok(self.fetch_feed(&feed).await)
    }

    async fn ingest(&self, feed: &FeedSource) -> Result<(usize, u64), IngestError> {
        let page = self.fetcher.fetch_with_retry(&feed.url).await?;
        let entries = parse_feed_text(&page.body_utf8)?;
        let found = entries.len();
        info!(found, "Parsed feed");

        let mut existing = self.slugs.snapshot(self.repo.as_ref()).await?;
        let candidates = build_candidates(feed, &entries, &mut existing);
        if candidates.is_empty() {
            return Ok((found, 0));
        }

        let processed = self
            .repo
            .upsert_articles_ignoring_conflicts(&candidates)
            .await?;
        self.slugs
            .remember(candidates.into_iter().map(|candidate| candidate.slug))
            .await;
        Ok((found, processed))
    }
}

/// Candidate rows for every entry that has a link. Each generated slug is
/// registered in `existing` before the next one is drawn.
pub fn build_candidates(
    feed: &FeedSource,
    entries: &[Entry],
    existing: &mut HashSet<String>,
) -> Vec<NewArticle> {
    let mut candidates = Vec::with_capacity(entries.len());
    for entry in entries {
        let title = entry.title();
        let link = entry.link();
        if link.is_empty() {
            warn!(feed = %feed.name, title = %title, "Skipping entry without link");
            continue;
        }

        let published_at = published_at(entry);
        if published_at.is_none() {
            warn!(feed = %feed.name, link = %link, "No parseable publish date");
        }

        let slug = generate_unique_slug(&title, existing);
        existing.insert(slug.clone());

        candidates.push(NewArticle {
            slug,
            title,
            summary: entry.summary(),
            link,
            author: entry.author(),
            published_at,
            category: feed.category,
            source_name: feed.name.clone(),
            source_url: Some(feed.url.clone()),
            image_url: entry.image_url(),
        });
    }
    candidates
}
