pub mod cleaner;
pub mod images;
pub mod reader;
pub mod sites;
pub mod text;

#[cfg(test)]
mod tests;

pub use sites::{ExtractorRegistry, SelectorExtractor, SiteExtractor};

use async_trait::async_trait;
use scraper::Html;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::fetcher::HttpFetcher;

/// Result of extracting one article page. Both fields are best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub content: Option<String>,
    pub image_url: Option<String>,
}

/// Turns an article URL into content and a lead image.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    /// Never fails: fetch or parse problems yield an empty [`Extraction`].
    async fn extract(&self, article_url: &str) -> Extraction;
}

/// Fetches a page and runs site-specific, generic, then readability extraction.
#[derive(Clone)]
pub struct ContentExtractor {
    fetcher: HttpFetcher,
    registry: Arc<ExtractorRegistry>,
}

impl ContentExtractor {
    pub fn new(fetcher: HttpFetcher, registry: Arc<ExtractorRegistry>) -> Self {
        Self { fetcher, registry }
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }
}

#[async_trait]
impl ArticleExtractor for ContentExtractor {
    #[instrument(skip(self), fields(url = %article_url))]
    async fn extract(&self, article_url: &str) -> Extraction {
        let page = match self.fetcher.fetch_with_retry(article_url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Article fetch failed");
                return Extraction::default();
            }
        };

        // Parsed DOMs are not Send; all HTML work stays in this sync call.
        extract_from_html(&self.registry, &page.body_utf8, &page.url_final)
    }
}

/// Extraction over an already fetched page.
pub fn extract_from_html(registry: &ExtractorRegistry, html: &str, url: &Url) -> Extraction {
    let document = Html::parse_document(html);
    let image_url = images::main_image(&document, url);

    match registry.extractor_for(url.as_str()) {
        Some(site) => {
            if let Some(block) = site.extract(&document, url) {
                let content = finish_site_html(&block, url);
                if !content.is_empty() {
                    debug!(extractor = site.name(), chars = content.len(), "Site extractor matched");
                    return Extraction {
                        content: Some(content),
                        image_url,
                    };
                }
            }
            debug!(extractor = site.name(), "Site extractor found nothing, using generic extraction");
        }
        None => debug!(host = url.host_str(), "No site extractor, using generic extraction"),
    }

    let content = reader::extract_generic(&document, url)
        .or_else(|| reader::extract_readability(html, url));
    if content.is_none() {
        warn!(url = %url, "No article content found");
    }

    Extraction { content, image_url }
}

fn finish_site_html(block: &str, url: &Url) -> String {
    let html = cleaner::sanitize(block);
    let html = cleaner::resolve_links(&html, url);
    let html = text::tidy(&cleaner::format_block_breaks(&html));
    match text::cut_html(&html) {
        // Re-sanitizing closes whatever elements the cut left open.
        Some(head) => format!("{}{}", cleaner::sanitize(head), text::TRUNCATION_MARKER),
        None => html,
    }
}
