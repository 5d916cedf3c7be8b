//! Per-site extraction strategies keyed by domain.

use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::extractor::cleaner::remove_noise;
use crate::extractor::text::strip_tags;

/// Minimum visible characters for a site block to count as article content.
pub const MIN_SITE_TEXT_CHARS: usize = 100;

/// A site-specific way to find the article body in a parsed page.
///
/// Implementations return the raw HTML of the content block with
/// structural noise already removed; attribute sanitization happens later.
pub trait SiteExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, document: &Html, url: &Url) -> Option<String>;
}

/// Tries CSS selectors in order and keeps the first block with enough text.
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    name: String,
    selectors: Vec<Selector>,
}

impl SelectorExtractor {
    /// Selectors that fail to parse are skipped.
    pub fn new(name: impl Into<String>, selectors: &[&str]) -> Self {
        let name = name.into();
        let selectors = selectors
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    debug!(extractor = %name, selector = s, error = ?e, "Ignoring bad selector");
                    None
                }
            })
            .collect();
        Self { name, selectors }
    }
}

impl SiteExtractor for SelectorExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, document: &Html, _url: &Url) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            let block = document.select(selector).next()?;
            let cleaned = remove_noise(&block.html());
            let text_len = strip_tags(&cleaned).chars().count();
            (text_len > MIN_SITE_TEXT_CHARS).then_some(cleaned)
        })
    }
}

/// Domain to extractor map with an alias table for `www.` and sibling hosts.
#[derive(Default, Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn SiteExtractor>>,
    aliases: HashMap<String, String>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in news sites.
    pub fn with_default_sites() -> Self {
        let mut registry = Self::new();
        for (domain, selectors) in DEFAULT_SITES {
            registry.register(domain, Arc::new(SelectorExtractor::new(*domain, selectors)));
        }
        registry.alias("bbc.co.uk", "bbc.com");
        registry.alias("e.vnexpress.net", "vnexpress.net");
        registry
    }

    /// Register `extractor` for `domain`; `www.<domain>` resolves to it as well.
    pub fn register(&mut self, domain: &str, extractor: Arc<dyn SiteExtractor>) {
        let domain = normalize_host(domain);
        self.aliases.insert(format!("www.{}", domain), domain.clone());
        self.extractors.insert(domain, extractor);
    }

    /// Make `host` (and `www.<host>`) resolve to the extractor of `canonical`.
    pub fn alias(&mut self, host: &str, canonical: &str) {
        let host = normalize_host(host);
        let canonical = normalize_host(canonical);
        self.aliases.insert(format!("www.{}", host), canonical.clone());
        self.aliases.insert(host, canonical);
    }

    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        domains.sort_unstable();
        domains
    }

    /// Extractor for `url`'s host: exact match, then alias. `None` means
    /// the generic extraction path should be used.
    pub fn extractor_for(&self, url: &str) -> Option<Arc<dyn SiteExtractor>> {
        let parsed = Url::parse(url).ok()?;
        let host = normalize_host(parsed.host_str()?);

        if let Some(extractor) = self.extractors.get(&host) {
            return Some(extractor.clone());
        }
        self.aliases
            .get(&host)
            .and_then(|canonical| self.extractors.get(canonical))
            .cloned()
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

const DEFAULT_SITES: &[(&str, &[&str])] = &[
    (
        "kenh14.vn",
        &["div.detail-content", "div.knc-content", "article"],
    ),
    (
        "vnexpress.net",
        &[
            "div.fck_detail",
            "div.sidebar_1",
            "div.content_detail",
            "div.article_content",
            "article",
        ],
    ),
    ("tuoitre.vn", &[r#"div[data-role="content"]"#]),
    ("techcrunch.com", &["div.entry-content"]),
    (
        "bbc.com",
        &["article", r#"div[data-component="text-block"]"#],
    ),
    ("cnbc.com", &[r#"div[data-module="ArticleBody"]"#]),
    (
        "theverge.com",
        &["div.duet--layout--entry-body-container", "article"],
    ),
    ("engadget.com", &["div.caas-body", "div.article-body"]),
    (
        "abcnews.go.com",
        &[
            r#"div[data-testid="prism-article-body"]"#,
            "div.article-body",
            "div.content",
        ],
    ),
    (
        "nbcnews.com",
        &["div.article-body__content", "div.article-content"],
    ),
    (
        "cbsnews.com",
        &["section.content__body", "div.article-content"],
    ),
];
