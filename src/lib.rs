pub mod app_state;
pub mod config;
pub mod entities;
pub mod extractor;
pub mod feed;
pub mod fetcher;
pub mod ingest;
pub mod jobs;
pub mod repositories;
pub mod slug;
pub mod telemetry;
