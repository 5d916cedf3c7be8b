use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::entities::{
    Article, EnrichmentUpdate, FeedSeed, FeedSource, FetchLog, FetchLogUpdate, FetchStatus,
    NewArticle, is_present,
};
use crate::repositories::{CleanupCounts, NewsRepository};
use crate::slug::generate_unique_slug;

/// Process-local repository with the same conflict and enrichment semantics
/// as the PostgreSQL backing. Used by tests and storage-less runs.
#[derive(Default)]
pub struct MemoryNewsRepository {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    feeds: Vec<FeedSource>,
    articles: Vec<Article>,
    logs: Vec<FetchLog>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryNewsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository preloaded with active feed sources built from `seeds`.
    pub fn with_feeds(seeds: &[FeedSeed]) -> Self {
        let repo = Self::new();
        if let Ok(mut state) = repo.state() {
            for seed in seeds {
                let id = state.next_id();
                state.feeds.push(feed_from_seed(id, seed));
            }
        }
        repo
    }

    pub fn articles(&self) -> Vec<Article> {
        self.state()
            .map(|state| state.articles.clone())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory repository lock poisoned"))
    }
}

fn feed_from_seed(id: i64, seed: &FeedSeed) -> FeedSource {
    FeedSource {
        id,
        name: seed.name.to_string(),
        url: seed.url.to_string(),
        category: seed.category,
        description: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn newest_first(a: &Article, b: &Article) -> std::cmp::Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl NewsRepository for MemoryNewsRepository {
    async fn upsert_articles_ignoring_conflicts(&self, records: &[NewArticle]) -> Result<u64> {
        let mut state = self.state()?;
        let mut links: HashSet<String> = state.articles.iter().map(|a| a.link.clone()).collect();
        let mut slugs: HashSet<String> = state.articles.iter().map(|a| a.slug.clone()).collect();
        let mut inserted = 0;

        for record in records {
            if !links.insert(record.link.clone()) {
                continue;
            }
            // Slugs are unique too; a stale slug snapshot gets a fresh slug here.
            let slug = if slugs.contains(&record.slug) {
                generate_unique_slug(&record.title, &slugs)
            } else {
                record.slug.clone()
            };
            slugs.insert(slug.clone());

            let id = state.next_id();
            state.articles.push(Article {
                id,
                slug,
                title: record.title.clone(),
                summary: record.summary.clone(),
                content: None,
                link: record.link.clone(),
                author: record.author.clone(),
                published_at: record.published_at,
                category: record.category,
                source_name: record.source_name.clone(),
                source_url: record.source_url.clone(),
                image_url: record.image_url.clone(),
                is_processed: true,
                created_at: Utc::now(),
                updated_at: None,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn find_article_by_link(&self, link: &str) -> Result<Option<Article>> {
        let state = self.state()?;
        Ok(state.articles.iter().find(|a| a.link == link).cloned())
    }

    async fn find_article_by_slug_or_id(&self, key: &str) -> Result<Option<Article>> {
        let state = self.state()?;
        if let Some(article) = state.articles.iter().find(|a| a.slug == key) {
            return Ok(Some(article.clone()));
        }
        let Ok(id) = key.parse::<i64>() else {
            return Ok(None);
        };
        Ok(state.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn list_existing_slugs(&self) -> Result<HashSet<String>> {
        let state = self.state()?;
        Ok(state.articles.iter().map(|a| a.slug.clone()).collect())
    }

    async fn record_fetch_log(&self, feed_name: &str) -> Result<i64> {
        let mut state = self.state()?;
        let id = state.next_id();
        state.logs.push(FetchLog {
            id,
            feed_name: feed_name.to_string(),
            fetched_at: Utc::now(),
            status: FetchStatus::Fetching,
            articles_found: 0,
            articles_processed: 0,
            error_message: None,
            execution_time_ms: None,
        });
        Ok(id)
    }

    async fn update_fetch_log(&self, id: i64, update: &FetchLogUpdate) -> Result<()> {
        let mut state = self.state()?;
        if let Some(log) = state.logs.iter_mut().find(|l| l.id == id) {
            log.status = update.status;
            log.articles_found = update.articles_found;
            log.articles_processed = update.articles_processed;
            log.error_message = update.error_message.clone();
            log.execution_time_ms = Some(update.execution_time_ms);
        }
        Ok(())
    }

    async fn list_fetch_logs(&self, limit: i64) -> Result<Vec<FetchLog>> {
        let state = self.state()?;
        let mut logs = state.logs.clone();
        logs.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at).then_with(|| b.id.cmp(&a.id)));
        logs.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(logs)
    }

    async fn list_active_feed_sources(&self) -> Result<Vec<FeedSource>> {
        let state = self.state()?;
        Ok(state.feeds.iter().filter(|f| f.is_active).cloned().collect())
    }

    async fn seed_feed_sources(&self, seeds: &[FeedSeed]) -> Result<u64> {
        let mut state = self.state()?;
        let mut inserted = 0;
        for seed in seeds {
            if state.feeds.iter().any(|f| f.name == seed.name) {
                continue;
            }
            let id = state.next_id();
            state.feeds.push(feed_from_seed(id, seed));
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn find_feed_source(&self, name: &str) -> Result<Option<FeedSource>> {
        let state = self.state()?;
        Ok(state.feeds.iter().find(|f| f.name == name).cloned())
    }

    async fn toggle_feed_source(&self, name: &str) -> Result<Option<FeedSource>> {
        let mut state = self.state()?;
        Ok(state.feeds.iter_mut().find(|f| f.name == name).map(|feed| {
            feed.is_active = !feed.is_active;
            feed.updated_at = Some(Utc::now());
            feed.clone()
        }))
    }

    async fn delete_feed_source(&self, name: &str) -> Result<bool> {
        let mut state = self.state()?;
        let before = state.feeds.len();
        state.feeds.retain(|f| f.name != name);
        Ok(state.feeds.len() < before)
    }

    async fn list_articles_missing_content(&self, limit: i64) -> Result<Vec<Article>> {
        let state = self.state()?;
        let mut missing: Vec<Article> = state
            .articles
            .iter()
            .filter(|a| !a.has_content())
            .cloned()
            .collect();
        missing.sort_by(newest_first);
        missing.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(missing)
    }

    async fn apply_enrichment(
        &self,
        id: i64,
        update: &EnrichmentUpdate,
    ) -> Result<Option<Article>> {
        let mut state = self.state()?;
        let Some(article) = state.articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        if !article.has_content() && is_present(update.content.as_deref()) {
            article.content = update.content.clone();
        }
        if !article.has_image() && is_present(update.image_url.as_deref()) {
            article.image_url = update.image_url.clone();
        }
        article.updated_at = Some(Utc::now());
        Ok(Some(article.clone()))
    }

    async fn clear_article_content(&self, id: i64) -> Result<bool> {
        let mut state = self.state()?;
        let Some(article) = state.articles.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        article.content = None;
        article.image_url = None;
        article.updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn cleanup_feed_data(&self, feed_name: &str) -> Result<CleanupCounts> {
        let mut state = self.state()?;
        let (articles, logs) = (state.articles.len(), state.logs.len());
        state.articles.retain(|a| a.source_name != feed_name);
        state.logs.retain(|l| l.feed_name != feed_name);
        Ok(CleanupCounts {
            articles: (articles - state.articles.len()) as u64,
            fetch_logs: (logs - state.logs.len()) as u64,
        })
    }

    async fn cleanup_all_data(&self) -> Result<CleanupCounts> {
        let mut state = self.state()?;
        let counts = CleanupCounts {
            articles: state.articles.len() as u64,
            fetch_logs: state.logs.len() as u64,
        };
        state.articles.clear();
        state.logs.clear();
        Ok(counts)
    }
}
