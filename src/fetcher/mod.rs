pub mod backoff;
pub mod client;
pub mod decode;
pub mod errors;
pub mod politeness;
pub mod types;

pub use backoff::RetryPolicy;
pub use client::HttpFetcher;
pub use errors::FetchError;
pub use politeness::HostLimiter;
pub use types::PageResponse;
