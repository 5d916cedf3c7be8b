use feed_rs::model::{self, Link, MediaObject};
use feed_rs::parser::{self, ParseErrorKind, ParseFeedError};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::feed::dates::parse_date;
use crate::feed::entry::{Entry, MediaKind, MediaRef};

static XML_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\u{feff}?\s*<\?xml[^>]*\?>").unwrap());

/// Errors that abort parsing of a whole feed document.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed body is empty")]
    Empty,

    #[error("document is not an RSS, Atom or RDF feed")]
    UnrecognizedFormat,

    #[error("feed parse error: {0}")]
    Invalid(String),
}

impl From<ParseFeedError> for FeedError {
    fn from(err: ParseFeedError) -> Self {
        match err {
            ParseFeedError::ParseError(ParseErrorKind::NoFeedRoot) => Self::UnrecognizedFormat,
            other => Self::Invalid(other.to_string()),
        }
    }
}

/// Parse RSS 2.0, RSS 1.0 (RDF) or Atom bytes into entries.
///
/// Timestamps go through [`parse_date`], so zone spellings such as `GMT+7`
/// are understood and an unparseable date leaves the entry undated.
pub fn parse_feed(raw: &[u8]) -> Result<Vec<Entry>, FeedError> {
    if raw.trim_ascii().is_empty() {
        return Err(FeedError::Empty);
    }

    let feed = parser::Builder::new()
        .timestamp_parser(parse_date)
        .build()
        .parse(raw)?;
    Ok(feed.entries.into_iter().map(to_entry).collect())
}

/// Parse a body that was already decoded to UTF-8. The XML declaration is
/// dropped so a stale `encoding="..."` cannot make the reader decode twice.
pub fn parse_feed_text(text: &str) -> Result<Vec<Entry>, FeedError> {
    parse_feed(XML_DECLARATION.replace(text, "").as_bytes())
}

fn to_entry(item: model::Entry) -> Entry {
    let mut entry = Entry::new();

    if let Some(title) = item.title {
        entry.set_field("title", title.content);
    }
    entry.set_field("guid", item.id);
    if let Some(summary) = item.summary {
        entry.set_field("summary", summary.content);
    }
    if let Some(body) = item.content.and_then(|content| content.body) {
        entry.set_field("content", body);
    }
    if let Some(author) = item.authors.into_iter().next() {
        entry.set_field("author", author.name);
    }
    if let Some(published) = item.published {
        entry.set_field("published", published.to_rfc3339());
    }
    if let Some(updated) = item.updated {
        entry.set_field("updated", updated.to_rfc3339());
    }

    for link in item.links {
        add_link(&mut entry, link);
    }
    for media in item.media {
        add_media(&mut entry, media);
    }
    entry
}

fn add_link(entry: &mut Entry, link: Link) {
    match link.rel.as_deref() {
        None | Some("alternate") => entry.set_field("link", link.href),
        Some("enclosure") => entry.push_media(MediaRef {
            url: link.href,
            kind: MediaKind::Enclosure,
            mime: link.media_type,
        }),
        _ => {}
    }
}

fn add_media(entry: &mut Entry, media: MediaObject) {
    for content in media.content {
        if let Some(url) = content.url {
            entry.push_media(MediaRef {
                url: url.to_string(),
                kind: MediaKind::MediaContent,
                mime: content.content_type.map(|mime| mime.to_string()),
            });
        }
    }
    for thumbnail in media.thumbnails {
        entry.push_media(MediaRef {
            url: thumbnail.image.uri,
            kind: MediaKind::MediaThumbnail,
            mime: None,
        });
    }
}
