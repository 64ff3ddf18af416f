// File: crates/sextant-feed/src/poller.rs
// Summary: Best-effort background polling of model performance stats, with exponential
// backoff on failure. Aborted when the poller handle is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::payload::PerformancePayload;
use crate::transport::Transport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval: Duration,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self { interval: Duration::from_secs(30), base_backoff: Duration::from_secs(1), max_backoff: Duration::from_secs(60) }
    }
}

/// Delay before the next retry: `base` after the first failure, doubling, capped at `max`.
pub fn next_backoff(current: Duration, base: Duration, max: Duration) -> Duration {
    if current.is_zero() {
        base.min(max)
    } else {
        current.saturating_mul(2).min(max)
    }
}

pub struct StatsPoller {
    handle: JoinHandle<()>,
    rx: watch::Receiver<Option<PerformancePayload>>,
}

impl StatsPoller {
    /// Spawn the polling task on the current runtime.
    pub fn spawn<T: Transport>(transport: Arc<T>, settings: PollerSettings) -> Self {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut backoff = Duration::ZERO;
            loop {
                let wait = match transport.performance().await {
                    Ok(stats) => {
                        backoff = Duration::ZERO;
                        tx.send_replace(Some(stats));
                        settings.interval
                    }
                    Err(e) => {
                        backoff = next_backoff(backoff, settings.base_backoff, settings.max_backoff);
                        tracing::warn!(error = %e, retry_in = ?backoff, "performance stats unavailable");
                        backoff
                    }
                };
                if tx.is_closed() {
                    break;
                }
                tokio::time::sleep(wait).await;
            }
        });
        Self { handle, rx }
    }

    pub fn latest(&self) -> Option<PerformancePayload> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PerformancePayload>> {
        self.rx.clone()
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(60);
        let mut d = Duration::ZERO;
        let mut seen = Vec::new();
        for _ in 0..8 {
            d = next_backoff(d, base, max);
            seen.push(d.as_secs());
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 32, 60, 60]);
    }
}
