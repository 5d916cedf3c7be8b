use ammonia::Builder;
use kuchiki::iter::NodeIterator;
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use url::Url;

/// Elements dropped outright, wherever they appear.
const NOISE_SELECTOR: &str =
    r#"script, style, iframe, ins, noscript, [data-set], [type="RelatedOneNews"]"#;

/// Class/id substrings marking ads, social widgets, signup forms, comments and related links.
const NOISE_MARKERS: [&str; 15] = [
    "adsbygoogle",
    "advert",
    "sponsor",
    "google_ads",
    "facebook",
    "twitter",
    "instagram",
    "linkedin",
    "newsletter",
    "signup",
    "subscribe",
    "comment",
    "disqus",
    "related",
    "more-news",
];

/// Class/id segments (split on `-`/`_`) that mark an ad slot on their own.
const AD_SEGMENTS: [&str; 2] = ["ad", "ads"];

const ACTION_WORDS: [&str; 7] = [
    "share", "save", "like", "follow", "subscribe", "bookmark", "print",
];
const ACTION_WORD_TAGS: [&str; 5] = ["div", "span", "p", "a", "button"];

const BLOCK_BREAKS: [(&str, &str); 13] = [
    ("</p>", "</p>\n\n"),
    ("</div>", "</div>\n"),
    ("</h1>", "</h1>\n\n"),
    ("</h2>", "</h2>\n\n"),
    ("</h3>", "</h3>\n\n"),
    ("</h4>", "</h4>\n\n"),
    ("</h5>", "</h5>\n\n"),
    ("</h6>", "</h6>\n\n"),
    ("</li>", "</li>\n"),
    ("</ul>", "</ul>\n\n"),
    ("</ol>", "</ol>\n\n"),
    ("</blockquote>", "</blockquote>\n\n"),
    ("</figure>", "</figure>\n\n"),
];

static POSITION_ABSOLUTE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)position\s*:\s*absolute\s*;?").unwrap());
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HREF_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).unwrap());
static SRC_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"src="([^"]+)""#).unwrap());

/// Full HTML sanitization: structural noise removal, image normalization,
/// then the per-tag attribute allowlist.
pub fn sanitize(html: &str) -> String {
    let denoised = remove_noise(html);
    allowlist().clean(&denoised).to_string()
}

/// Drop ads, widgets and boilerplate elements and normalize images.
///
/// Class/id and action-word checks only look at descendants of the
/// top-level elements, so the content block handed in is never removed
/// because of its own class.
pub fn remove_noise(html: &str) -> String {
    let document = kuchiki::parse_html().one(html);
    let body = body_of(&document);

    detach_all(&body, NOISE_SELECTOR);

    // Reverse document order visits children before their parents, so a
    // parent's text is checked after its noisy children are gone.
    let elements: Vec<NodeDataRef<ElementData>> = body.descendants().elements().collect();
    for element in elements.iter().rev() {
        let node = element.as_node();
        if node.parent().is_none_or(|parent| parent == body) {
            continue;
        }
        if is_noise(element) {
            node.detach();
        }
    }

    normalize_images(&body);
    body.children().map(|child| child.to_string()).collect()
}

fn body_of(document: &NodeRef) -> NodeRef {
    document
        .select_first("body")
        .map(|body| body.as_node().clone())
        .unwrap_or_else(|_| document.clone())
}

fn detach_all(root: &NodeRef, selector: &str) {
    if let Ok(matches) = root.select(selector) {
        for element in matches.collect::<Vec<_>>() {
            element.as_node().detach();
        }
    }
}

fn is_noise(element: &NodeDataRef<ElementData>) -> bool {
    {
        let attrs = element.attributes.borrow();
        let marked = ["class", "id"]
            .iter()
            .filter_map(|name| attrs.get(*name))
            .any(is_noise_marker);
        if marked {
            return true;
        }
    }

    if ACTION_WORD_TAGS.contains(&&*element.name.local) {
        let text = element.as_node().text_contents();
        let text = text.trim().to_lowercase();
        return ACTION_WORDS.contains(&text.as_str());
    }
    false
}

fn is_noise_marker(value: &str) -> bool {
    let value = value.to_lowercase();
    if NOISE_MARKERS.iter().any(|marker| value.contains(marker)) {
        return true;
    }
    value
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .any(|segment| AD_SEGMENTS.contains(&segment))
}

fn normalize_images(root: &NodeRef) {
    let Ok(images) = root.select("img") else {
        return;
    };

    for img in images.collect::<Vec<_>>() {
        let node = img.as_node();

        // <a href="x.jpg"><img src="x.jpg"></a> collapses to the image.
        let src = img
            .attributes
            .borrow()
            .get("src")
            .map(|s| s.trim().to_lowercase());
        if let Some(link) = node
            .ancestors()
            .elements()
            .find(|e| &*e.name.local == "a")
        {
            let href = link
                .attributes
                .borrow()
                .get("href")
                .map(|h| h.trim().to_lowercase());
            if href.is_some() && href == src {
                link.as_node().insert_before(node.clone());
                link.as_node().detach();
            }
        }

        let mut attrs = img.attributes.borrow_mut();
        let caption = ["data-caption", "alt", "title"].iter().find_map(|name| {
            attrs
                .get(*name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        });
        if let Some(caption) = caption {
            attrs.insert("alt", caption);
            attrs.remove("data-caption");
            attrs.remove("title");
        }

        if attrs.get("src").is_some_and(|s| !s.trim().is_empty()) {
            attrs.remove("srcset");
        }

        let style = attrs.get("style").map(str::to_string);
        if let Some(style) = style {
            let stripped = POSITION_ABSOLUTE_REGEX.replace_all(&style, "");
            let stripped = stripped.trim();
            if stripped.is_empty() {
                attrs.remove("style");
            } else {
                attrs.insert("style", stripped.to_string());
            }
        }
    }
}

fn allowlist() -> Builder<'static> {
    let mut tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
    tag_attributes.insert("img", ["src", "alt", "title", "width", "height"].into());
    tag_attributes.insert("a", ["href"].into());
    for tag in ["table", "tr", "td", "th"] {
        tag_attributes.insert(tag, ["colspan", "rowspan"].into());
    }
    tag_attributes.insert("ol", ["start"].into());
    tag_attributes.insert("blockquote", ["cite"].into());
    tag_attributes.insert("time", ["datetime"].into());

    let mut builder = Builder::default();
    builder
        .add_tags(&["section", "main", "time", "picture"])
        .generic_attributes(HashSet::new())
        .tag_attributes(tag_attributes)
        .link_rel(None)
        .add_clean_content_tags(&["noscript", "iframe"]);
    builder
}

/// Line breaks after block-level closing tags so stored HTML reads well as text.
pub fn format_block_breaks(html: &str) -> String {
    let mut html = WHITESPACE_REGEX.replace_all(html, " ").into_owned();
    for (close, replacement) in BLOCK_BREAKS {
        html = html.replace(close, replacement);
    }
    html
}

/// Rewrite relative `href`/`src` attribute values against `base_url`.
pub fn resolve_links(html: &str, base_url: &Url) -> String {
    let absolutize = |attr: &str, caps: &regex::Captures<'_>| {
        let url_str = &caps[1];
        match base_url.join(url_str) {
            Ok(absolute_url) => format!(r#"{}="{}""#, attr, absolute_url),
            Err(_) => caps[0].to_string(),
        }
    };

    let html = HREF_REGEX.replace_all(html, |caps: &regex::Captures<'_>| absolutize("href", caps));
    let html = SRC_REGEX.replace_all(&html, |caps: &regex::Captures<'_>| absolutize("src", caps));
    html.into_owned()
}
