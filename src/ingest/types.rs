use serde::Serialize;

use crate::entities::{Article, Category, FetchLogUpdate, FetchStatus};

/// Outcome of one feed fetch, as reported to callers and the fetch log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    pub feed_name: String,
    pub category: Category,
    pub status: FetchStatus,
    pub articles_found: usize,
    pub articles_processed: u64,
    pub execution_time_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    pub(crate) fn log_update(&self) -> FetchLogUpdate {
        FetchLogUpdate {
            status: self.status,
            articles_found: i32::try_from(self.articles_found).unwrap_or(i32::MAX),
            articles_processed: i32::try_from(self.articles_processed).unwrap_or(i32::MAX),
            error_message: self.error.clone(),
            execution_time_ms: self.execution_time_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchAllSummary {
    pub total_feeds: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<FetchResult>,
}

impl FetchAllSummary {
    pub fn new(results: Vec<FetchResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total_feeds: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

/// Field names reported in [`EnrichmentResult::updated_fields`].
pub const FIELD_CONTENT: &str = "content";
pub const FIELD_IMAGE_URL: &str = "image_url";

/// Best-effort article state after an enrichment attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult {
    pub article_id: i64,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub updated_fields: Vec<&'static str>,
    #[serde(skip)]
    pub article: Article,
}

impl EnrichmentResult {
    pub fn new(article: Article, updated_fields: Vec<&'static str>) -> Self {
        Self {
            article_id: article.id,
            content: article.content.clone(),
            image_url: article.image_url.clone(),
            updated_fields,
            article,
        }
    }

    pub fn unchanged(article: Article) -> Self {
        Self::new(article, Vec::new())
    }
}

/// Counters for one "enrich missing content" sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub candidates: usize,
    pub enriched: usize,
    pub images_added: usize,
    pub failed: usize,
}
