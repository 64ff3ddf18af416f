// File: crates/sextant-core/src/deferred.rs
// Summary: Cancellable one-shot timer used for the settle delay between data arrival
// and panel construction. Cancelling is dropping.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::{Instant, Sleep};

/// A pending deferred operation. Owns its timer; nothing fires once this is dropped.
#[derive(Debug)]
pub struct Deferred {
    label: &'static str,
    sleep: Pin<Box<Sleep>>,
}

impl Deferred {
    /// Schedule a deadline `delay` from now. Requires a tokio runtime with timers.
    pub fn after(label: &'static str, delay: Duration) -> Self {
        Self { label, sleep: Box::pin(tokio::time::sleep(delay)) }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn deadline(&self) -> Instant {
        self.sleep.deadline()
    }

    pub fn is_elapsed(&self) -> bool {
        self.sleep.is_elapsed()
    }

    /// Wait for the deadline. Cancel-safe: can be used as a `select!` branch by reference.
    pub async fn wait(&mut self) {
        (&mut self.sleep).await
    }

    /// Drop the timer before it fires.
    pub fn cancel(self) {
        tracing::debug!(label = self.label, "deferred cancelled");
    }
}

impl Future for Deferred {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.sleep.as_mut().poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let mut d = Deferred::after("settle", Duration::from_millis(200));
        assert!(!d.is_elapsed());
        d.wait().await;
        assert!(d.is_elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_restarts_the_delay() {
        let start = Instant::now();
        let first = Deferred::after("settle", Duration::from_millis(50));
        tokio::time::advance(Duration::from_millis(30)).await;
        first.cancel();
        let second = Deferred::after("settle", Duration::from_millis(50));
        assert_eq!(second.deadline(), start + Duration::from_millis(80));
        second.await;
        assert!(Instant::now() >= start + Duration::from_millis(80));
    }
}
