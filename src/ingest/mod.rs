//! Feed ingestion, article enrichment and the maintenance operations around them.

pub mod admin;
pub mod enrich;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use admin::Admin;
pub use enrich::Enricher;
pub use errors::{EnrichError, IngestError};
pub use pipeline::{FeedIngestor, build_candidates};
pub use types::{EnrichmentResult, FetchAllSummary, FetchResult, SweepSummary};
