use std::fs;
use std::sync::Arc;
use url::Url;

use crate::extractor::text::{MAX_CONTENT_CHARS, TRUNCATION_MARKER};
use crate::extractor::{Extraction, ExtractorRegistry, SelectorExtractor, extract_from_html};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{}", name))
        .expect("Failed to read test fixture")
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[test]
fn test_site_extractor_returns_sanitized_html() {
    let registry = ExtractorRegistry::with_default_sites();
    let html = fixture("vnexpress.html");
    let page_url = url("https://vnexpress.net/metro-line-opens-4830000.html");

    let result = extract_from_html(&registry, &html, &page_url);

    assert_eq!(
        result.image_url.as_deref(),
        Some("https://i1-vnexpress.vnecdn.net/2024/12/22/metro-lead.jpg")
    );
    let content = result.content.expect("site content");
    assert!(content.contains("first metro line opened to passengers"));
    assert!(content.contains(r#"src="https://vnexpress.net/photos/metro-train.jpg""#));
    assert!(content.contains(r#"alt="A train leaves Ben Thanh station""#));
    assert!(content.contains(r#"href="https://vnexpress.net/tag/transport""#));

    assert!(!content.contains("<script"));
    assert!(!content.contains("class="));
    assert!(!content.contains("style="));
    assert!(!content.contains("Advertisement"));
    assert!(!content.contains("<button"));
    assert!(!content.contains("Home"));
}

#[test]
fn test_generic_extraction_interleaves_images() {
    let registry = ExtractorRegistry::with_default_sites();
    let html = fixture("blog.html");
    let page_url = url("https://techblog.example/posts/better-software");

    let result = extract_from_html(&registry, &html, &page_url);

    assert_eq!(
        result.image_url.as_deref(),
        Some("https://cdn.techblog.example/covers/better-software.png")
    );
    let content = result.content.expect("generic content");
    assert!(content.starts_with("How to Build Better Software"));
    assert!(content.contains("Building better software"));
    assert!(content.contains("Key Principles"));
    assert!(content.contains("[IMAGE: https://techblog.example/img/diagram.png]"));
    assert!(content.contains("[Image description: Layered architecture diagram]"));
    assert!(content.contains("[Image caption: Layers talk only to their neighbours]"));

    assert!(!content.contains("Subscribe to our newsletter"));
    assert!(!content.contains("Great post!"));
    assert!(!content.contains("Popular posts"));
    assert!(!content.contains("<p>"));
}

#[test]
fn test_empty_page_yields_nothing() {
    let registry = ExtractorRegistry::with_default_sites();
    let html = fixture("empty.html");

    let result = extract_from_html(&registry, &html, &url("https://example.com/empty"));

    assert_eq!(result, Extraction::default());
}

#[test]
fn test_site_miss_falls_back_to_generic() {
    let mut registry = ExtractorRegistry::new();
    registry.register(
        "techblog.example",
        Arc::new(SelectorExtractor::new("techblog", &["div.does-not-exist"])),
    );
    let html = fixture("blog.html");

    let result = extract_from_html(&registry, &html, &url("https://techblog.example/posts/x"));

    let content = result.content.expect("fallback content");
    assert!(content.contains("[IMAGE: https://techblog.example/img/diagram.png]"));
}

#[test]
fn test_oversized_site_block_is_cut_between_tags() {
    let mut registry = ExtractorRegistry::new();
    registry.register(
        "long.example",
        Arc::new(SelectorExtractor::new("long", &["div.story"])),
    );
    let paragraphs =
        "<p>Lorem ipsum dolor sit amet, <b>consectetur</b> adipiscing elit.</p>".repeat(4000);
    let html = format!(
        r#"<html><body><div class="story">{}</div></body></html>"#,
        paragraphs
    );

    let result = extract_from_html(&registry, &html, &url("https://long.example/a"));

    let content = result.content.expect("site content");
    let body = content
        .strip_suffix(TRUNCATION_MARKER)
        .expect("truncation marker appended");
    let last_open = body.rfind('<').expect("markup kept");
    assert!(body[last_open..].contains('>'));
    assert_eq!(body.matches("<p>").count(), body.matches("</p>").count());
    assert_eq!(body.matches("<b>").count(), body.matches("</b>").count());
    assert!(body.chars().count() <= MAX_CONTENT_CHARS + 16);
}

#[test]
fn test_minimal_valid_content() {
    let html = format!(
        r#"<!DOCTYPE html><html><head><title>Valid Article</title></head><body><article><h1>Valid Article</h1><p>{}</p></article></body></html>"#,
        "This is a valid article with enough content to pass the minimum requirements for extraction. "
            .repeat(20)
    );
    let registry = ExtractorRegistry::new();

    let result = extract_from_html(&registry, &html, &url("https://example.com/valid"));

    let content = result.content.expect("article content");
    assert!(content.starts_with("Valid Article"));
    assert!(content.contains("minimum requirements for extraction."));
    assert_eq!(result.image_url, None);
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use crate::extractor::cleaner::sanitize;
    use proptest::prelude::*;

    fn words() -> impl Strategy<Value = String> {
        "[a-z]{1,8}( [a-z]{1,8}){0,3}"
    }

    fn inline() -> impl Strategy<Value = String> {
        prop_oneof![
            words(),
            words().prop_map(|w| format!("<span>{}</span>", w)),
            words().prop_map(|w| format!(r#"<a href="/{}" class="link">{}</a>"#, w.replace(' ', "-"), w)),
            Just("<span>share</span>".to_string()),
        ]
    }

    fn block() -> impl Strategy<Value = String> {
        let leaf = prop_oneof![
            prop::collection::vec(inline(), 1..4)
                .prop_map(|parts| format!("<p>{}</p>", parts.join(" "))),
            words().prop_map(|w| format!(
                r#"<img src="/{0}.jpg" data-caption="{1}" title="t" srcset="a.jpg 1x" style="position:absolute">"#,
                w.replace(' ', "_"),
                w
            )),
            words().prop_map(|w| {
                let src = format!("/{}.png", w.replace(' ', "_"));
                format!(r#"<a href="{0}"><img src="{0}" alt="x"></a>"#, src)
            }),
            words().prop_map(|w| format!(r#"<div class="ad-slot">{}</div>"#, w)),
            words().prop_map(|w| format!("<script>var {} = 1;</script>", w.replace(' ', "_"))),
            Just(r#"<div id="comments"><p>nice</p></div>"#.to_string()),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::vec(inner, 1..4).prop_map(|children| {
                format!(r#"<div class="wrap" data-x="1">{}</div>"#, children.concat())
            })
        })
    }

    proptest! {
        #[test]
        fn test_sanitize_is_idempotent(blocks in prop::collection::vec(block(), 1..5)) {
            let html = blocks.concat();
            let once = sanitize(&html);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn test_extract_never_panics(
            html in ".*",
            path in "[a-z0-9/]{0,20}"
        ) {
            let registry = ExtractorRegistry::with_default_sites();
            for host in ["vnexpress.net", "unknown.example"] {
                let url = Url::parse(&format!("https://{}/{}", host, path)).unwrap();
                let _ = extract_from_html(&registry, &html, &url);
            }
        }
    }
}
