pub mod enrich_content;
pub mod fetch_feeds;

pub use enrich_content::EnrichContentJob;
pub use fetch_feeds::FetchFeedsJob;
