#![allow(dead_code)]

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use headline::entities::{Category, FeedSeed, FeedSource};
use headline::fetcher::{HttpFetcher, RetryPolicy};
use headline::repositories::MemoryNewsRepository;

/// Fetcher with millisecond backoff and no politeness gap.
pub fn fast_fetcher(max_attempts: u32) -> HttpFetcher {
    HttpFetcher::new(
        Duration::from_secs(5),
        RetryPolicy::new(max_attempts, Duration::from_millis(10)),
        Duration::ZERO,
    )
    .expect("Failed to build fetcher")
}

/// Like [`fast_fetcher`] with a caller-chosen request timeout.
pub fn fetcher_with_timeout(timeout: Duration, max_attempts: u32) -> HttpFetcher {
    HttpFetcher::new(
        timeout,
        RetryPolicy::new(max_attempts, Duration::from_millis(10)),
        Duration::ZERO,
    )
    .expect("Failed to build fetcher")
}

pub fn feed_source(name: &str, url: &str) -> FeedSource {
    FeedSource {
        id: 1,
        name: name.to_string(),
        url: url.to_string(),
        category: Category::Tech,
        description: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// Repository holding active feeds pointing at mock server URLs.
pub fn repo_with_feeds(feeds: &[(&str, String)]) -> Arc<MemoryNewsRepository> {
    let seeds: Vec<FeedSeed> = feeds
        .iter()
        .map(|(name, url)| FeedSeed {
            name: Box::leak(name.to_string().into_boxed_str()),
            url: Box::leak(url.clone().into_boxed_str()),
            category: Category::Tech,
        })
        .collect();
    Arc::new(MemoryNewsRepository::with_feeds(&seeds))
}

pub struct Item<'a> {
    pub title: &'a str,
    pub link: Option<&'a str>,
    pub pub_date: &'a str,
}

pub fn rss(items: &[Item<'_>]) -> String {
    let body: String = items
        .iter()
        .map(|item| {
            let link = item
                .link
                .map(|l| format!("<link>{}</link>", l))
                .unwrap_or_default();
            format!(
                "<item><title>{}</title>{}<description><![CDATA[<p>About {}</p>]]></description><pubDate>{}</pubDate></item>",
                item.title, link, item.title, item.pub_date
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Mock</title>{}</channel></rss>"#,
        body
    )
}

pub fn article_page(title: &str) -> String {
    let paragraphs: String = (0..8)
        .map(|i| {
            format!(
                "<p>Paragraph {} of {} explains the story in enough detail to count as real article text.</p>",
                i, title
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>{title}</title>
        <meta property="og:image" content="/img/lead.jpg"></head>
        <body><nav><a href="/">Home</a></nav>
        <article><h1>{title}</h1>{paragraphs}<div class="share-bar"><span>Share</span></div></article>
        <footer>Footer</footer></body></html>"#
    )
}
