use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::entities::{Article, EnrichmentUpdate};
use crate::extractor::ArticleExtractor;
use crate::ingest::errors::EnrichError;
use crate::ingest::types::{EnrichmentResult, FIELD_CONTENT, FIELD_IMAGE_URL, SweepSummary};
use crate::repositories::NewsRepository;

/// Fills in article content and images from the article's own page.
#[derive(Clone)]
pub struct Enricher {
    repo: Arc<dyn NewsRepository>,
    extractor: Arc<dyn ArticleExtractor>,
    concurrency: usize,
}

impl Enricher {
    pub fn new(
        repo: Arc<dyn NewsRepository>,
        extractor: Arc<dyn ArticleExtractor>,
        concurrency: usize,
    ) -> Self {
        Self {
            repo,
            extractor,
            concurrency: concurrency.max(1),
        }
    }

    /// Enrich the article addressed by slug or id. Articles that already have
    /// content are returned untouched without any network access.
    #[instrument(skip(self))]
    pub async fn extract_and_apply(&self, key: &str) -> Result<EnrichmentResult, EnrichError> {
        let article = self
            .repo
            .find_article_by_slug_or_id(key)
            .await?
            .ok_or_else(|| EnrichError::NotFound(key.to_string()))?;
        self.enrich(article).await
    }

    /// Enrich up to `limit` articles whose content is still blank.
    #[instrument(skip(self))]
    pub async fn enrich_missing(&self, limit: usize) -> Result<SweepSummary, EnrichError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let candidates = self.repo.list_articles_missing_content(limit).await?;
        let mut summary = SweepSummary {
            candidates: candidates.len(),
            ..SweepSummary::default()
        };
        if candidates.is_empty() {
            debug!("No articles missing content");
            return Ok(summary);
        }

        let outcomes: Vec<(i64, Result<EnrichmentResult, EnrichError>)> = stream::iter(candidates)
            .map(|article| async move { (article.id, self.enrich(article).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (article_id, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    if result.updated_fields.contains(&FIELD_CONTENT) {
                        summary.enriched += 1;
                    }
                    if result.updated_fields.contains(&FIELD_IMAGE_URL) {
                        summary.images_added += 1;
                    }
                }
                Err(e) => {
                    warn!(article_id, error = %e, "Enrichment failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            candidates = summary.candidates,
            enriched = summary.enriched,
            images_added = summary.images_added,
            failed = summary.failed,
            "Enrichment sweep finished"
        );
        Ok(summary)
    }

    #[instrument(skip(self, article), fields(article_id = article.id, url = %article.link))]
    async fn enrich(&self, article: Article) -> Result<EnrichmentResult, EnrichError> {
        if article.has_content() {
            debug!("Article already has content");
            return Ok(EnrichmentResult::unchanged(article));
        }

        let extraction = self.extractor.extract(&article.link).await;
        let update = EnrichmentUpdate {
            content: extraction.content,
            image_url: extraction.image_url,
        };
        if update.is_empty() {
            info!("Nothing extracted");
            return Ok(EnrichmentResult::unchanged(article));
        }

        let stored = self
            .repo
            .apply_enrichment(article.id, &update)
            .await?
            .ok_or_else(|| EnrichError::NotFound(article.id.to_string()))?;

        let mut updated_fields = Vec::new();
        if !article.has_content() && stored.has_content() {
            updated_fields.push(FIELD_CONTENT);
        }
        if !article.has_image() && stored.has_image() {
            updated_fields.push(FIELD_IMAGE_URL);
        }
        info!(updated = ?updated_fields, "Article enriched");
        Ok(EnrichmentResult::new(stored, updated_fields))
    }
}
