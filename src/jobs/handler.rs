use async_trait::async_trait;

/// A unit of periodic work run by the [`Scheduler`](crate::jobs::Scheduler).
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Run once. Errors are logged by the scheduler and never stop the loop.
    async fn run(&self) -> anyhow::Result<()>;

    /// Name used in logs and spans.
    fn kind(&self) -> &'static str;
}
