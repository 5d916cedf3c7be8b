use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

/// Hard cap on stored content length, in characters.
pub const MAX_CONTENT_CHARS: usize = 200_000;
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated]";

static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static LINE_EDGE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *\n *").unwrap());
static BOILERPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:share this article|follow us|subscribe\b)[^\n]*$").unwrap()
});
static NEWLINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Final text pass over extracted content (plain text or HTML).
pub fn clean_text(text: &str) -> String {
    truncate(&tidy(text))
}

/// [`clean_text`] without the length cap.
pub fn tidy(text: &str) -> String {
    let text = COMMENT_REGEX.replace_all(text, "");
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = SPACE_REGEX.replace_all(&text, " ");
    let text = LINE_EDGE_REGEX.replace_all(&text, "\n");
    let text = BOILERPLATE_REGEX.replace_all(&text, "");
    let text = NEWLINES_REGEX.replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Prefix of `html` within the content cap that does not end inside a tag.
/// `None` when the markup already fits.
pub fn cut_html(html: &str) -> Option<&str> {
    let (cut, _) = html.char_indices().nth(MAX_CONTENT_CHARS)?;
    let head = &html[..cut];
    match head.rfind('<') {
        Some(open) if head[open..].find('>').is_none() => Some(&head[..open]),
        _ => Some(head),
    }
}

/// Visible text of an HTML snippet with whitespace collapsed.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
