use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::extractor::text::strip_tags as html_to_text;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("static selector"));

/// Where a media reference was declared inside an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    MediaContent,
    MediaThumbnail,
    Enclosure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub kind: MediaKind,
    pub mime: Option<String>,
}

impl MediaRef {
    fn looks_like_image(&self) -> bool {
        match self.mime.as_deref() {
            Some(mime) => mime.starts_with("image"),
            None => true,
        }
    }
}

/// One feed item with tolerant, lookup-by-name field access.
///
/// Every accessor returns an empty value instead of failing when a field is
/// missing, so one broken item never takes down the rest of a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    fields: HashMap<String, String>,
    media: Vec<MediaRef>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw field text by element name (`"pubDate"`, `"dc:date"`, ...); `""` when absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Store a field unless it is already set. The first occurrence wins.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.fields.entry(name.into()).or_insert(value);
    }

    pub fn push_media(&mut self, media: MediaRef) {
        if !media.url.trim().is_empty() {
            self.media.push(media);
        }
    }

    pub fn media(&self) -> &[MediaRef] {
        &self.media
    }

    pub fn title(&self) -> String {
        let raw = self.field("title").trim();
        if raw.contains('<') {
            html_to_text(raw)
        } else {
            collapse_whitespace(raw)
        }
    }

    /// Article link: RSS `<link>` text, Atom `<link href>`, or a permalink guid.
    pub fn link(&self) -> String {
        let link = self.field("link").trim();
        if !link.is_empty() {
            return link.to_string();
        }
        let guid = self.field("guid").trim();
        if guid.starts_with("http://") || guid.starts_with("https://") {
            return guid.to_string();
        }
        String::new()
    }

    /// Plain-text summary taken from `description`, then `summary`, then
    /// the full `content` when the feed carries no separate summary.
    pub fn summary(&self) -> Option<String> {
        ["description", "summary", "content"]
            .iter()
            .map(|name| self.field(name))
            .find(|raw| !raw.trim().is_empty())
            .map(html_to_text)
            .filter(|text| !text.is_empty())
    }

    pub fn author(&self) -> Option<String> {
        ["author", "dc:creator", "creator"]
            .iter()
            .map(|name| collapse_whitespace(self.field(name)))
            .find(|author| !author.is_empty())
    }

    /// First image reference: `media:content`, `media:thumbnail`, image
    /// enclosures, then the first `<img>` inside the item HTML.
    pub fn image_url(&self) -> Option<String> {
        for kind in [
            MediaKind::MediaContent,
            MediaKind::MediaThumbnail,
            MediaKind::Enclosure,
        ] {
            if let Some(media) = self
                .media
                .iter()
                .find(|m| m.kind == kind && m.looks_like_image())
            {
                return Some(media.url.trim().to_string());
            }
        }

        ["summary", "description", "content"]
            .iter()
            .map(|name| self.field(name))
            .filter(|html| html.contains("<img"))
            .find_map(first_img_src)
    }
}

fn first_img_src(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
