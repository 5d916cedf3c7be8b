use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::entities::{FeedSeed, FeedSource, FetchLog};
use crate::ingest::errors::EnrichError;
use crate::repositories::{CleanupCounts, NewsRepository};
use crate::slug::SlugCache;

/// Feed and data maintenance operations behind the manual triggers.
#[derive(Clone)]
pub struct Admin {
    repo: Arc<dyn NewsRepository>,
    slugs: Arc<SlugCache>,
}

impl Admin {
    pub fn new(repo: Arc<dyn NewsRepository>, slugs: Arc<SlugCache>) -> Self {
        Self { repo, slugs }
    }

    /// Merge the static catalog into the store, inserting missing names only.
    pub async fn seed_catalog(&self, seeds: &[FeedSeed]) -> anyhow::Result<u64> {
        let inserted = self.repo.seed_feed_sources(seeds).await?;
        info!(catalog = seeds.len(), inserted, "Seeded feed sources");
        Ok(inserted)
    }

    pub async fn toggle_feed(&self, name: &str) -> anyhow::Result<Option<FeedSource>> {
        let feed = self.repo.toggle_feed_source(name).await?;
        match &feed {
            Some(feed) => info!(feed = %feed.name, active = feed.is_active, "Toggled feed"),
            None => warn!(feed = name, "Feed not found"),
        }
        Ok(feed)
    }

    pub async fn delete_feed(&self, name: &str) -> anyhow::Result<bool> {
        let deleted = self.repo.delete_feed_source(name).await?;
        info!(feed = name, deleted, "Deleted feed source");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    pub async fn cleanup_feed(&self, name: &str) -> anyhow::Result<CleanupCounts> {
        let counts = self.repo.cleanup_feed_data(name).await?;
        self.slugs.invalidate().await;
        info!(articles = counts.articles, fetch_logs = counts.fetch_logs, "Removed feed data");
        Ok(counts)
    }

    #[instrument(skip(self))]
    pub async fn cleanup_all(&self) -> anyhow::Result<CleanupCounts> {
        let counts = self.repo.cleanup_all_data().await?;
        self.slugs.invalidate().await;
        info!(articles = counts.articles, fetch_logs = counts.fetch_logs, "Removed all data");
        Ok(counts)
    }

    /// Reset content and image of the article addressed by slug or id.
    pub async fn clear_content(&self, key: &str) -> Result<i64, EnrichError> {
        let article = self
            .repo
            .find_article_by_slug_or_id(key)
            .await?
            .ok_or_else(|| EnrichError::NotFound(key.to_string()))?;
        if !self.repo.clear_article_content(article.id).await? {
            return Err(EnrichError::NotFound(key.to_string()));
        }
        info!(article_id = article.id, "Cleared article content");
        Ok(article.id)
    }

    pub async fn fetch_logs(&self, limit: usize) -> anyhow::Result<Vec<FetchLog>> {
        self.repo
            .list_fetch_logs(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::feed_catalog;
    use crate::entities::{Category, EnrichmentUpdate, NewArticle};
    use crate::repositories::MemoryNewsRepository;
    use std::time::Duration;

    fn admin() -> (Arc<MemoryNewsRepository>, Admin) {
        let repo = Arc::new(MemoryNewsRepository::new());
        let slugs = Arc::new(SlugCache::new(Duration::from_secs(300)));
        (repo.clone(), Admin::new(repo, slugs))
    }

    #[tokio::test]
    async fn seeding_is_insert_if_absent() {
        let (repo, admin) = admin();
        let catalog = feed_catalog();

        assert_eq!(admin.seed_catalog(&catalog).await.unwrap(), catalog.len() as u64);
        assert_eq!(admin.seed_catalog(&catalog).await.unwrap(), 0);

        let first = catalog[0].name;
        assert!(!admin.toggle_feed(first).await.unwrap().unwrap().is_active);
        assert_eq!(
            repo.list_active_feed_sources().await.unwrap().len(),
            catalog.len() - 1
        );
        assert!(admin.toggle_feed("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_content_resets_enrichment() {
        let (repo, admin) = admin();
        repo.upsert_articles_ignoring_conflicts(&[NewArticle {
            slug: "clearme".into(),
            title: "Clear me".into(),
            summary: None,
            link: "https://example.com/clear".into(),
            author: None,
            published_at: None,
            category: Category::UsNews,
            source_name: "CBS News".into(),
            source_url: None,
            image_url: None,
        }])
        .await
        .unwrap();
        let id = repo.find_article_by_link("https://example.com/clear").await.unwrap().unwrap().id;
        repo.apply_enrichment(
            id,
            &EnrichmentUpdate {
                content: Some("Body".into()),
                image_url: Some("https://img/x.jpg".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(admin.clear_content("clearme").await.unwrap(), id);
        let article = repo.find_article_by_link("https://example.com/clear").await.unwrap().unwrap();
        assert!(article.content.is_none());
        assert!(article.image_url.is_none());

        assert!(matches!(
            admin.clear_content("nope").await,
            Err(EnrichError::NotFound(_))
        ));
    }
}
