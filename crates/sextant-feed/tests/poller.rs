// File: crates/sextant-feed/tests/poller.rs
// Purpose: Background stats polling publishes results and survives an unavailable service.

use std::sync::Arc;
use std::time::Duration;

use sextant_feed::{MemoryTransport, PerformancePayload, PollerSettings, StatsPoller};

fn settings() -> PollerSettings {
    PollerSettings {
        interval: Duration::from_secs(5),
        base_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_secs(1),
    }
}

#[tokio::test(start_paused = true)]
async fn publishes_latest_stats() {
    let stats = PerformancePayload { accuracy: 71.5, total_predictions: 420, avg_error: 2.3 };
    let poller = StatsPoller::spawn(Arc::new(MemoryTransport::new().with_performance(stats.clone())), settings());
    let mut rx = poller.subscribe();
    let got = rx.wait_for(Option::is_some).await.unwrap().clone();
    assert_eq!(got, Some(stats));
    assert_eq!(poller.latest().map(|s| s.total_predictions), Some(420));
}

#[tokio::test(start_paused = true)]
async fn missing_stats_never_publish() {
    let poller = StatsPoller::spawn(Arc::new(MemoryTransport::new()), settings());
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(poller.latest().is_none());
}
