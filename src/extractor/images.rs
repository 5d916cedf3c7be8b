use scraper::{ElementRef, Html, Selector};
use url::Url;

const MIN_WIDTH: u32 = 300;
const MIN_HEIGHT: u32 = 200;
const MIN_PLAUSIBLE_URL_LEN: usize = 20;

const META_IMAGE_SELECTORS: [&str; 4] = [
    r#"meta[property="og:image"]"#,
    r#"meta[name="og:image"]"#,
    r#"meta[name="twitter:image"]"#,
    r#"meta[property="twitter:image"]"#,
];

const CONTENT_IMAGE_SELECTORS: [&str; 3] = ["article img", "main img", "img"];

/// Representative image of a page: Open Graph, then Twitter Card, then the
/// first sizeable image in the main content. Returned URLs are absolute.
pub fn main_image(document: &Html, base_url: &Url) -> Option<String> {
    for selector in META_IMAGE_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        let found = document
            .select(&selector)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty());
        if let Some(content) = found {
            return absolutize(content, base_url);
        }
    }

    for selector in CONTENT_IMAGE_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(src) = document.select(&selector).find_map(content_image_src) {
            return absolutize(src, base_url);
        }
    }
    None
}

fn content_image_src(img: ElementRef<'_>) -> Option<&str> {
    let element = img.value();
    let src = element
        .attr("src")
        .or_else(|| element.attr("data-src"))
        .map(str::trim)
        .filter(|src| is_valid_content_image(src))?;

    let width = element.attr("width").and_then(parse_dimension);
    let height = element.attr("height").and_then(parse_dimension);

    let accepted = match (width, height) {
        (None, None) => src.len() > MIN_PLAUSIBLE_URL_LEN,
        _ => width.unwrap_or(0) > MIN_WIDTH || height.unwrap_or(0) > MIN_HEIGHT,
    };
    accepted.then_some(src)
}

fn parse_dimension(value: &str) -> Option<u32> {
    value.trim().trim_end_matches("px").parse().ok()
}

/// Rejects inline data, tracking pixels and icon-sized assets.
pub fn is_valid_content_image(src: &str) -> bool {
    if src.is_empty() || src.starts_with("data:") {
        return false;
    }
    let lower = src.to_lowercase();
    let icon_sized = ["16x16", "32x32", "48x48"]
        .iter()
        .any(|size| lower.contains(size));
    let tracker = ["tracking", "pixel", "beacon"]
        .iter()
        .any(|t| lower.contains(t));
    !icon_sized && !tracker
}

fn absolutize(src: &str, base_url: &Url) -> Option<String> {
    base_url.join(src).ok().map(|url| url.to_string())
}
