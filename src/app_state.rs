use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::config::Config;
use crate::extractor::{ArticleExtractor, ContentExtractor, ExtractorRegistry};
use crate::fetcher::HttpFetcher;
use crate::ingest::{Admin, Enricher, FeedIngestor};
use crate::repositories::{NewsRepository, PgNewsRepository};
use crate::slug::SlugCache;

/// Explicitly wired services. Every collaborator is constructed here and
/// passed down; nothing is reached through process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repo: Arc<dyn NewsRepository>,
    pub ingestor: FeedIngestor,
    pub enricher: Enricher,
    pub admin: Admin,
}

impl AppState {
    /// Wire the services around an arbitrary repository backing.
    pub fn with_repository(config: Config, repo: Arc<dyn NewsRepository>) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(&config)?;
        let slugs = Arc::new(SlugCache::new(config.slug_cache_ttl));
        let registry = Arc::new(ExtractorRegistry::with_default_sites());
        let extractor: Arc<dyn ArticleExtractor> =
            Arc::new(ContentExtractor::new(fetcher.clone(), registry));

        Ok(Self {
            ingestor: FeedIngestor::new(
                repo.clone(),
                fetcher,
                slugs.clone(),
                config.feed_concurrency,
            ),
            enricher: Enricher::new(repo.clone(), extractor, config.enrich_concurrency),
            admin: Admin::new(repo.clone(), slugs),
            repo,
            config,
        })
    }

    /// Connect to PostgreSQL, apply migrations and wire the services.
    pub async fn connect(config: Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(config.database_url())
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let repo: Arc<dyn NewsRepository> = Arc::new(PgNewsRepository::new(pool));
        Self::with_repository(config, repo)
    }
}
