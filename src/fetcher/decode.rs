use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// How far into a body in-document charset declarations are searched.
const SNIFF_WINDOW: usize = 4096;

static HEADER_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

// Covers `<?xml encoding=..?>`, `<meta charset=..>` and the http-equiv form.
static DOCUMENT_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:<\?xml[^>]*?encoding\s*=\s*["']([^"']+)["']|<meta\s[^>]*?charset\s*=\s*["']?([^"'\s;/>]+))"#,
    )
    .unwrap()
});

fn encoding_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let captures = regex.captures(haystack)?;
    let label = captures.iter().skip(1).flatten().next()?.as_str().trim();
    Encoding::for_label(label.as_bytes())
}

/// Pick the body encoding: Content-Type header first, then a declaration in
/// the first few KB of the document, then statistical detection.
pub fn sniff_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = encoding_from(&HEADER_CHARSET, content_type) {
        return encoding;
    }

    let window = &body[..body.len().min(SNIFF_WINDOW)];
    if let Some(encoding) = encoding_from(&DOCUMENT_CHARSET, &String::from_utf8_lossy(window)) {
        return encoding;
    }

    if std::str::from_utf8(window).is_ok() {
        return UTF_8;
    }
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, body.len() <= SNIFF_WINDOW);
    detector.guess(None, true)
}

/// Decode to UTF-8. Malformed sequences become U+FFFD instead of failing:
/// a handful of bad bytes should not cost the whole feed.
pub fn decode_body(content_type: &str, body: &[u8]) -> (String, &'static Encoding) {
    let encoding = sniff_encoding(content_type, body);
    let (decoded, used, had_errors) = encoding.decode(body);
    if had_errors {
        debug!(encoding = used.name(), "Body contained undecodable bytes");
    }
    (decoded.into_owned(), used)
}
