use crate::config::Config;
use crate::fetcher::{
    backoff::RetryPolicy, decode::decode_body, errors::FetchError, politeness::HostLimiter,
    types::PageResponse,
};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

const MAX_BODY_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;
// Several news sites answer 403 to anything that does not look like a browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/rss+xml,application/atom+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9,vi;q=0.8";

/// Shared HTTP client for feeds and article pages.
///
/// Cloning is cheap: the connection pool and the host limiter are shared.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
    limiter: Arc<HostLimiter>,
}

impl HttpFetcher {
    pub fn new(
        timeout: Duration,
        policy: RetryPolicy,
        host_interval: Duration,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            policy,
            limiter: Arc::new(HostLimiter::new(host_interval)),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            config.http_timeout,
            RetryPolicy::new(config.fetch_max_attempts, config.fetch_backoff_base),
            config.host_interval,
        )
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Single GET attempt. Non-2xx statuses become [`FetchError::Http`].
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        let parsed_url = url::Url::parse(url)?;
        self.limiter.wait(&parsed_url).await;

        let response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let url_final = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http { status });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_string);

        let body_bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Content-Length may be missing or wrong for compressed bodies
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        let (body_utf8, encoding) =
            decode_body(content_type.as_deref().unwrap_or_default(), &body_bytes);
        Ok(PageResponse {
            url_final,
            status,
            content_type,
            encoding,
            body_utf8,
        })
    }

    /// GET with bounded exponential backoff on transient failures.
    ///
    /// Non-retriable errors are returned as-is on the first occurrence; a
    /// spent attempt budget yields [`FetchError::RetriesExhausted`].
    pub async fn fetch_with_retry(&self, url: &str) -> Result<PageResponse, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match self.fetch(url).await {
                Ok(page) => return Ok(page),
                Err(err) => err,
            };

            if !err.should_retry() {
                return Err(err);
            }
            if attempt >= self.policy.max_attempts {
                return Err(FetchError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay_for(attempt - 1);
            warn!(
                url,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient fetch failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
