use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

use crate::jobs::handler::JobHandler;

struct ScheduledJob {
    handler: Arc<dyn JobHandler>,
    every: Duration,
}

/// Runs each registered job on its own fixed interval.
///
/// A job never overlaps with itself: the next tick waits for the current
/// run and ticks missed meanwhile are skipped. Jobs are independent of each
/// other, so a slow ingestion run does not delay the enrichment sweep.
#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
    shutdown_token: CancellationToken,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: JobHandler>(&mut self, handler: H, every: Duration) -> &mut Self {
        self.jobs.push(ScheduledJob {
            handler: Arc::new(handler),
            every,
        });
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Run until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, initiating graceful shutdown...");
            shutdown_token.cancel();
        });

        self.run_until_cancelled().await
    }

    /// Run until the scheduler's shutdown token is cancelled. In-flight runs
    /// finish before this returns.
    pub async fn run_until_cancelled(self) -> Result<()> {
        info!(jobs = self.jobs.len(), "Starting scheduler");

        let mut tasks = JoinSet::new();
        for job in self.jobs {
            let kind = job.handler.kind();
            let token = self.shutdown_token.clone();
            tasks.spawn(run_job(job, token).instrument(info_span!("job", kind = kind)));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Job loop panicked");
            }
        }
        info!("Scheduler stopped");
        Ok(())
    }
}

async fn run_job(job: ScheduledJob, shutdown_token: CancellationToken) {
    let mut ticker = interval(job.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(every_secs = job.every.as_secs_f64(), "Job scheduled");

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                info!("Job loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let started = tokio::time::Instant::now();
                match job.handler.run().await {
                    Ok(()) => info!(elapsed_ms = started.elapsed().as_millis() as u64, "Job run finished"),
                    Err(e) => error!(error = %e, "Job run failed"),
                }
            }
        }
    }
}
