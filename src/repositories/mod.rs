pub mod memory;
pub mod postgres;

pub use memory::MemoryNewsRepository;
pub use postgres::PgNewsRepository;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;

use crate::entities::{
    Article, EnrichmentUpdate, FeedSeed, FeedSource, FetchLog, FetchLogUpdate, NewArticle,
};

/// Rows removed by an admin cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupCounts {
    pub articles: u64,
    pub fetch_logs: u64,
}

/// Storage boundary for feeds, articles and fetch logs.
///
/// Article identity is the `link`: inserts never overwrite an existing link,
/// and enrichment only fills fields that are still blank, so overlapping
/// ingestion and enrichment runs are safe against any backing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Insert every candidate whose link is new, atomically. Returns the number inserted.
    async fn upsert_articles_ignoring_conflicts(&self, records: &[NewArticle]) -> Result<u64>;

    async fn find_article_by_link(&self, link: &str) -> Result<Option<Article>>;

    /// Slug match first, then numeric id.
    async fn find_article_by_slug_or_id(&self, key: &str) -> Result<Option<Article>>;

    async fn list_existing_slugs(&self) -> Result<HashSet<String>>;

    /// Open a `fetching` log row for `feed_name` and return its id.
    async fn record_fetch_log(&self, feed_name: &str) -> Result<i64>;

    async fn update_fetch_log(&self, id: i64, update: &FetchLogUpdate) -> Result<()>;

    async fn list_fetch_logs(&self, limit: i64) -> Result<Vec<FetchLog>>;

    async fn list_active_feed_sources(&self) -> Result<Vec<FeedSource>>;

    /// Insert-if-absent by name. Returns the number of new sources.
    async fn seed_feed_sources(&self, seeds: &[FeedSeed]) -> Result<u64>;

    async fn find_feed_source(&self, name: &str) -> Result<Option<FeedSource>>;

    /// Flip `is_active`; `None` when no source has that name.
    async fn toggle_feed_source(&self, name: &str) -> Result<Option<FeedSource>>;

    async fn delete_feed_source(&self, name: &str) -> Result<bool>;

    /// Newest articles whose content is still blank.
    async fn list_articles_missing_content(&self, limit: i64) -> Result<Vec<Article>>;

    /// Fill blank `content`/`image_url` from `update` and stamp `updated_at`.
    /// Non-blank stored values are never replaced.
    async fn apply_enrichment(&self, id: i64, update: &EnrichmentUpdate)
    -> Result<Option<Article>>;

    /// Reset `content` and `image_url` so the article is enriched again.
    async fn clear_article_content(&self, id: i64) -> Result<bool>;

    /// Remove one feed's articles and fetch logs. The source itself stays.
    async fn cleanup_feed_data(&self, feed_name: &str) -> Result<CleanupCounts>;

    /// Remove all articles and fetch logs.
    async fn cleanup_all_data(&self) -> Result<CleanupCounts>;
}
