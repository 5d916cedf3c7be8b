use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Per-host request spacing shared by every fetch in the process.
///
/// Each host gets a "next free slot"; a caller reserves the slot and pushes
/// it one interval forward before sleeping, so concurrent callers queue up
/// instead of firing together.
#[derive(Debug)]
pub struct HostLimiter {
    next_slot: DashMap<String, Instant>,
    interval: Duration,
}

impl HostLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            next_slot: DashMap::new(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a request to `url`'s host is allowed.
    pub async fn wait(&self, url: &Url) {
        if self.interval.is_zero() {
            return;
        }
        let Some(host) = url.host_str() else {
            return;
        };

        let now = Instant::now();
        let slot = {
            let mut entry = self.next_slot.entry(host.to_ascii_lowercase()).or_insert(now);
            let slot = (*entry).max(now);
            *entry = slot + self.interval;
            slot
        };

        if slot > now {
            debug!(host, delay_ms = (slot - now).as_millis() as u64, "Spacing request to host");
            tokio::time::sleep_until(slot).await;
        }
    }
}
