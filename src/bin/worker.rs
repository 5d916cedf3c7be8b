use anyhow::Result;
use headline::{
    app_state::AppState,
    config::{Config, feed_catalog},
    jobs::{EnrichContentJob, FetchFeedsJob, Scheduler},
    telemetry,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let config = Config::from_env()?;
    let state = AppState::connect(config).await?;

    // The catalog is merged on every start so new built-in feeds appear.
    state.admin.seed_catalog(&feed_catalog()).await?;

    let mut scheduler = Scheduler::new();
    scheduler
        .register(
            FetchFeedsJob::new(state.ingestor.clone()),
            state.config.fetch_interval,
        )
        .register(
            EnrichContentJob::new(state.enricher.clone(), state.config.enrich_batch_size),
            state.config.enrich_interval,
        );

    info!(
        fetch_every_secs = state.config.fetch_interval.as_secs(),
        enrich_every_secs = state.config.enrich_interval.as_secs(),
        "Worker started"
    );
    scheduler.run().await
}
