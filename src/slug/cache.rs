use anyhow::Result;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::repositories::NewsRepository;

/// Process-local snapshot of known slugs, refreshed from the repository once
/// the TTL has elapsed. Never a source of truth: a stale read only risks a
/// slug collision retry, article identity is enforced by `link` in storage.
pub struct SlugCache {
    ttl: Duration,
    state: RwLock<Option<Snapshot>>,
}

struct Snapshot {
    loaded_at: Instant,
    slugs: HashSet<String>,
}

impl SlugCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(None),
        }
    }

    /// Copy of the cached slugs, reloading them when stale or empty.
    pub async fn snapshot(&self, repo: &dyn NewsRepository) -> Result<HashSet<String>> {
        {
            let state = self.state.read().await;
            if let Some(snapshot) = state.as_ref()
                && !snapshot.slugs.is_empty()
                && snapshot.loaded_at.elapsed() < self.ttl
            {
                return Ok(snapshot.slugs.clone());
            }
        }

        let slugs = repo.list_existing_slugs().await?;
        debug!(count = slugs.len(), "Refreshed slug cache");

        let mut state = self.state.write().await;
        *state = Some(Snapshot {
            loaded_at: Instant::now(),
            slugs: slugs.clone(),
        });
        Ok(slugs)
    }

    /// Register slugs handed out since the last refresh.
    pub async fn remember<I>(&self, slugs: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = self.state.write().await;
        if let Some(snapshot) = state.as_mut() {
            snapshot.slugs.extend(slugs);
        }
    }

    pub async fn invalidate(&self) {
        *self.state.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Category, NewArticle};
    use crate::repositories::MemoryNewsRepository;

    fn candidate(slug: &str, link: &str) -> NewArticle {
        NewArticle {
            slug: slug.to_string(),
            title: "t".into(),
            summary: None,
            link: link.to_string(),
            author: None,
            published_at: None,
            category: Category::Tech,
            source_name: "feed".into(),
            source_url: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn serves_cached_snapshot_within_ttl() {
        let repo = MemoryNewsRepository::new();
        repo.upsert_articles_ignoring_conflicts(&[candidate("one", "https://a/1")])
            .await
            .unwrap();

        let cache = SlugCache::new(Duration::from_secs(300));
        let first = cache.snapshot(&repo).await.unwrap();
        assert!(first.contains("one"));

        repo.upsert_articles_ignoring_conflicts(&[candidate("two", "https://a/2")])
            .await
            .unwrap();
        let second = cache.snapshot(&repo).await.unwrap();
        assert!(!second.contains("two"), "fresh snapshot must not re-query");

        cache.remember(vec!["three".to_string()]).await;
        assert!(cache.snapshot(&repo).await.unwrap().contains("three"));
    }

    #[tokio::test]
    async fn reloads_after_ttl_or_invalidate() {
        let repo = MemoryNewsRepository::new();
        repo.upsert_articles_ignoring_conflicts(&[candidate("one", "https://a/1")])
            .await
            .unwrap();

        let cache = SlugCache::new(Duration::ZERO);
        cache.snapshot(&repo).await.unwrap();
        repo.upsert_articles_ignoring_conflicts(&[candidate("two", "https://a/2")])
            .await
            .unwrap();
        assert!(cache.snapshot(&repo).await.unwrap().contains("two"));

        let cache = SlugCache::new(Duration::from_secs(300));
        cache.snapshot(&repo).await.unwrap();
        repo.upsert_articles_ignoring_conflicts(&[candidate("three", "https://a/3")])
            .await
            .unwrap();
        cache.invalidate().await;
        assert!(cache.snapshot(&repo).await.unwrap().contains("three"));
    }
}
