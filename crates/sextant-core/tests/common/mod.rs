// File: crates/sextant-core/tests/common/mod.rs
// Purpose: Deterministic market fixtures shared by the integration tests.
#![allow(dead_code)]

use std::time::Duration;

use sextant_core::series::names;
use sextant_core::{
    BuildOptions, ContainerId, IndicatorPoint, IndicatorSet, LayoutSnapshot, MarketSnapshot, PanelDescriptor,
    PanelKind, Period, RawCandle, SessionManager, Size,
};

pub const DAY: i64 = 86_400;

pub fn candles(n: usize) -> Vec<RawCandle> {
    (0..n)
        .map(|i| {
            let base = 100.0 + (i as f64 * 0.3).sin() * 5.0;
            RawCandle {
                time: 1_700_000_000 + i as i64 * DAY,
                open: base,
                high: base + 2.0,
                low: base - 2.0,
                close: base + if i % 2 == 0 { 1.0 } else { -1.0 },
                volume: 1_000.0 + i as f64 * 10.0,
            }
        })
        .collect()
}

/// Indicator series with `warmup` leading gaps.
fn indicator(times: &[i64], warmup: usize, f: impl Fn(usize) -> f64) -> Vec<IndicatorPoint> {
    times.iter().enumerate().map(|(i, &t)| IndicatorPoint::new(t, (i >= warmup).then(|| f(i)))).collect()
}

pub fn snapshot(symbol: &str, n: usize) -> MarketSnapshot {
    let raw = candles(n);
    let times: Vec<i64> = raw.iter().map(|c| c.time).collect();
    let mut ind = IndicatorSet::new();
    ind.insert(names::SMA.into(), indicator(&times, 19, |i| 100.0 + (i as f64 * 0.1).cos()));
    ind.insert(names::EMA.into(), indicator(&times, 11, |i| 100.5 + (i as f64 * 0.1).sin()));
    ind.insert(names::BB_UPPER.into(), indicator(&times, 19, |_| 106.0));
    ind.insert(names::BB_MIDDLE.into(), indicator(&times, 19, |_| 100.0));
    ind.insert(names::BB_LOWER.into(), indicator(&times, 19, |_| 94.0));
    ind.insert(names::RSI.into(), indicator(&times, 14, |i| 50.0 + (i as f64 * 0.2).sin() * 25.0));
    ind.insert(names::MACD.into(), indicator(&times, 25, |i| (i as f64 * 0.15).sin()));
    ind.insert(names::MACD_SIGNAL.into(), indicator(&times, 33, |i| (i as f64 * 0.15).sin() * 0.8));
    ind.insert(names::MACD_HIST.into(), indicator(&times, 33, |i| (i as f64 * 0.15).sin() * 0.2));
    MarketSnapshot::normalize(symbol, Period::SixMonths, &raw, ind).expect("fixture normalizes")
}

pub fn descriptors() -> Vec<PanelDescriptor> {
    vec![
        PanelDescriptor::new(PanelKind::Price, ContainerId(1), 240),
        PanelDescriptor::new(PanelKind::OscillatorRsi, ContainerId(2), 100),
        PanelDescriptor::new(PanelKind::OscillatorMacd, ContainerId(3), 100),
        PanelDescriptor::new(PanelKind::Volume, ContainerId(4), 80),
    ]
}

pub fn layout(width: u32) -> LayoutSnapshot {
    LayoutSnapshot::new()
        .with(ContainerId(1), Size::new(width, 240))
        .with(ContainerId(2), Size::new(width, 100))
        .with(ContainerId(3), Size::new(width, 100))
        .with(ContainerId(4), Size::new(width, 80))
}

pub fn options() -> BuildOptions {
    BuildOptions { draw_labels: false, ..BuildOptions::default() }
}

pub fn manager() -> SessionManager {
    SessionManager::new(descriptors(), options(), Duration::ZERO)
}
