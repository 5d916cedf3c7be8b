use readability::extractor;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::extractor::cleaner::remove_noise;
use crate::extractor::text::clean_text;

/// Minimum visible characters for a generic container to be taken as the article.
pub const MIN_GENERIC_TEXT_CHARS: usize = 500;
const MIN_READABILITY_TEXT_CHARS: usize = 100;

/// Container candidates, most specific first.
const CONTENT_SELECTORS: [&str; 11] = [
    "article",
    "main",
    "[role='main']",
    "[itemprop='articleBody']",
    "[class*='article-body']",
    "[class*='content']",
    "[class*='article']",
    "[class*='post']",
    "[class*='entry']",
    "[id*='content']",
    "[id*='article']",
];

const BLOCK_TAGS: [&str; 18] = [
    "p", "div", "section", "article", "header", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "li", "blockquote", "pre", "figure", "table", "tr",
];

/// Generic readability-style pass: first candidate container whose text,
/// after noise removal, exceeds [`MIN_GENERIC_TEXT_CHARS`].
///
/// Inline images are kept in reading order as `[IMAGE: url]` markers with
/// optional description and caption lines.
pub fn extract_generic(document: &Html, base_url: &Url) -> Option<String> {
    for selector in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for candidate in document.select(&selector) {
            let cleaned = remove_noise(&candidate.html());
            let fragment = Html::parse_fragment(&cleaned);

            let mut walk = TextWalk::new(base_url);
            walk.visit(fragment.root_element());
            if walk.plain_chars > MIN_GENERIC_TEXT_CHARS {
                return Some(clean_text(&walk.out));
            }
        }
    }
    None
}

/// Last resort: the readability algorithm over the full page.
pub fn extract_readability(html: &str, url: &Url) -> Option<String> {
    let article = extractor::extract(&mut html.as_bytes(), url).ok()?;
    let text = clean_text(&article.text);
    (text.chars().count() > MIN_READABILITY_TEXT_CHARS).then_some(text)
}

struct TextWalk<'a> {
    base_url: &'a Url,
    out: String,
    plain_chars: usize,
}

impl<'a> TextWalk<'a> {
    fn new(base_url: &'a Url) -> Self {
        Self {
            base_url,
            out: String::new(),
            plain_chars: 0,
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    let text: &str = text;
                    self.plain_chars += text.split_whitespace().map(|w| w.chars().count() + 1).sum::<usize>();
                    self.out.push_str(text);
                }
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit_element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        match name {
            "img" => self.image(element),
            "figcaption" => {
                let caption = collapse(&element.text().collect::<String>());
                if !caption.is_empty() {
                    self.plain_chars += caption.chars().count();
                    self.line(&format!("[Image caption: {}]", caption));
                }
            }
            "br" => self.out.push('\n'),
            _ if BLOCK_TAGS.contains(&name) => {
                self.out.push('\n');
                self.visit(element);
                self.out.push('\n');
            }
            _ => self.visit(element),
        }
    }

    fn image(&mut self, img: ElementRef<'_>) {
        let element = img.value();
        let Some(src) = element
            .attr("src")
            .or_else(|| element.attr("data-src"))
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.starts_with("data:"))
        else {
            return;
        };
        let src = self
            .base_url
            .join(src)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| src.to_string());
        self.line(&format!("[IMAGE: {}]", src));

        if let Some(alt) = element.attr("alt").map(collapse).filter(|a| !a.is_empty()) {
            self.line(&format!("[Image description: {}]", alt));
        }
    }

    fn line(&mut self, line: &str) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out.push_str(line);
        self.out.push('\n');
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://blog.example.com/posts/1").unwrap()
    }

    fn paragraph(n: usize) -> String {
        format!(
            "<p>Paragraph {} carries enough words to look like real reporting on the topic at hand.</p>",
            n
        )
    }

    #[test]
    fn picks_first_container_over_threshold() {
        let body: String = (0..10).map(paragraph).collect();
        let html = format!(
            r#"<html><body>
                <div class="post-meta">short</div>
                <div class="post-body">{}
                    <figure><img src="/img/a.jpg" alt="A chart"><figcaption>Figure 1: growth</figcaption></figure>
                    <div class="share-buttons"><span>Share</span></div>
                </div>
            </body></html>"#,
            body
        );
        let doc = Html::parse_document(&html);
        let text = extract_generic(&doc, &base()).unwrap();

        assert!(text.contains("Paragraph 0 carries"));
        assert!(text.contains("Paragraph 9 carries"));
        assert!(text.contains("[IMAGE: https://blog.example.com/img/a.jpg]"));
        assert!(text.contains("[Image description: A chart]"));
        assert!(text.contains("[Image caption: Figure 1: growth]"));
        assert!(!text.contains("Share"));
        assert!(!text.contains("short"));
    }

    #[test]
    fn short_pages_yield_nothing() {
        let doc = Html::parse_document(
            "<html><body><article><p>Too short to be an article.</p></article></body></html>",
        );
        assert_eq!(extract_generic(&doc, &base()), None);
    }

    #[test]
    fn article_tag_is_preferred() {
        let body: String = (0..10).map(paragraph).collect();
        let html = format!(
            r#"<html><body><div class="content">{}</div><article><h1>Headline</h1>{}</article></body></html>"#,
            body, body
        );
        let doc = Html::parse_document(&html);
        let text = extract_generic(&doc, &base()).unwrap();
        assert!(text.starts_with("Headline"));
    }
}
