use encoding_rs::Encoding;
use reqwest::StatusCode;
use url::Url;

/// A successfully fetched document, decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// URL after redirects; relative links resolve against this.
    pub url_final: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub encoding: &'static Encoding,
    pub body_utf8: String,
}
