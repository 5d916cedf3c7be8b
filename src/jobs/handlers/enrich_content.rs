use async_trait::async_trait;

use crate::ingest::Enricher;
use crate::jobs::handler::JobHandler;

/// Periodic "enrich missing content" sweep.
#[derive(Clone)]
pub struct EnrichContentJob {
    enricher: Enricher,
    batch_size: usize,
}

impl EnrichContentJob {
    pub fn new(enricher: Enricher, batch_size: usize) -> Self {
        Self {
            enricher,
            batch_size,
        }
    }
}

#[async_trait]
impl JobHandler for EnrichContentJob {
    async fn run(&self) -> anyhow::Result<()> {
        self.enricher.enrich_missing(self.batch_size).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "enrich_missing_content"
    }
}
