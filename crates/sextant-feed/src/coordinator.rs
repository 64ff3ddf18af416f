// File: crates/sextant-feed/src/coordinator.rs
// Summary: Stale-result guard for remote loads. Every load takes a ticket; starting a
// newer load (or invalidating) makes all older tickets stale, and their results are
// dropped when they arrive.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use sextant_core::Period;

use crate::error::FetchError;

/// Identifies one (symbol, period) request generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub symbol: String,
    pub period: Period,
}

/// A finished request, not yet checked for staleness.
#[derive(Debug)]
pub struct Loaded<T> {
    pub ticket: LoadTicket,
    pub result: Result<T, FetchError>,
}

#[derive(Debug)]
pub enum LoadOutcome<T> {
    Fresh { ticket: LoadTicket, value: T },
    Stale { ticket: LoadTicket },
    Failed { ticket: LoadTicket, error: FetchError },
}

#[derive(Clone, Debug, Default)]
pub struct FetchCoordinator {
    active: Arc<AtomicU64>,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation for `symbol`/`period`; every earlier ticket becomes stale.
    pub fn begin(&self, symbol: impl Into<String>, period: Period) -> LoadTicket {
        let generation = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = LoadTicket { generation, symbol: symbol.into(), period };
        tracing::debug!(generation, symbol = %ticket.symbol, %period, "load started");
        ticket
    }

    /// Wrap `request` so its result comes back tagged with `ticket`.
    pub fn load<T, F>(&self, ticket: LoadTicket, request: F) -> BoxFuture<'static, Loaded<T>>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        async move { Loaded { ticket, result: request.await } }.boxed()
    }

    pub fn is_active(&self, ticket: &LoadTicket) -> bool {
        self.active.load(Ordering::SeqCst) == ticket.generation
    }

    /// Make every outstanding ticket stale without starting a new load.
    pub fn invalidate(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    /// Sort an arrived result: stale results are discarded whatever they contain.
    pub fn resolve<T>(&self, loaded: Loaded<T>) -> LoadOutcome<T> {
        let Loaded { ticket, result } = loaded;
        if !self.is_active(&ticket) {
            tracing::debug!(generation = ticket.generation, symbol = %ticket.symbol, "stale response discarded");
            return LoadOutcome::Stale { ticket };
        }
        match result {
            Ok(value) => LoadOutcome::Fresh { ticket, value },
            Err(error) => LoadOutcome::Failed { ticket, error },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future;

    #[tokio::test]
    async fn newer_load_makes_older_results_stale() {
        let c = FetchCoordinator::new();
        let a = c.begin("A", Period::OneMonth);
        let fut_a = c.load(a, future::ready(Ok::<_, FetchError>(1)));
        let b = c.begin("B", Period::OneMonth);
        let fut_b = c.load(b, future::ready(Ok::<_, FetchError>(2)));

        assert!(matches!(c.resolve(fut_b.await), LoadOutcome::Fresh { value: 2, .. }));
        assert!(matches!(c.resolve(fut_a.await), LoadOutcome::Stale { ticket } if ticket.symbol == "A"));
    }

    #[tokio::test]
    async fn stale_failures_are_not_reported() {
        let c = FetchCoordinator::new();
        let t = c.begin("A", Period::OneYear);
        let fut = c.load(t, future::ready(Err::<(), _>(FetchError::Timeout)));
        c.invalidate();
        assert!(matches!(c.resolve(fut.await), LoadOutcome::Stale { .. }));
    }

    #[tokio::test]
    async fn active_failure_is_reported() {
        let c = FetchCoordinator::new();
        let t = c.begin("A", Period::OneYear);
        let loaded = c.load(t.clone(), future::ready(Err::<(), _>(FetchError::Status(502)))).await;
        assert!(c.is_active(&t));
        assert!(matches!(c.resolve(loaded), LoadOutcome::Failed { error: FetchError::Status(502), .. }));
    }
}
