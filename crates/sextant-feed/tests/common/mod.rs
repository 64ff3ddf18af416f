// File: crates/sextant-feed/tests/common/mod.rs
// Purpose: In-memory payloads and dashboard wiring shared by the feed tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use sextant_core::series::names;
use sextant_core::{ConfidenceBandPoint, IndicatorPoint, IndicatorSet, LayoutHost, RawCandle};
use sextant_feed::config::PanelsConfig;
use sextant_feed::{
    Dashboard, DashboardHandle, DashboardSettings, ForecastPayload, ForecastSummary, MarketPayload, MemoryTransport,
    SextantConfig, TradeSignal,
};

pub const DAY: i64 = 86_400;

fn indicator(times: &[i64], warmup: usize, f: impl Fn(usize) -> f64) -> Vec<IndicatorPoint> {
    times.iter().enumerate().map(|(i, &t)| IndicatorPoint::new(t, (i >= warmup).then(|| f(i)))).collect()
}

pub fn market(symbol: &str, n: usize, base: f64) -> MarketPayload {
    let data: Vec<RawCandle> = (0..n)
        .map(|i| {
            let mid = base + (i as f64 * 0.25).sin() * base * 0.04;
            RawCandle {
                time: 1_700_000_000 + i as i64 * DAY,
                open: mid - 0.5,
                high: mid + 1.5,
                low: mid - 1.5,
                close: mid + 0.5,
                volume: 5_000.0 + (i % 7) as f64 * 300.0,
            }
        })
        .collect();
    let times: Vec<i64> = data.iter().map(|c| c.time).collect();
    let mut indicators = IndicatorSet::new();
    indicators.insert(names::SMA.into(), indicator(&times, 19, |_| base));
    indicators.insert(names::EMA.into(), indicator(&times, 11, |_| base * 1.005));
    indicators.insert(names::BB_UPPER.into(), indicator(&times, 19, |_| base * 1.06));
    indicators.insert(names::BB_MIDDLE.into(), indicator(&times, 19, |_| base));
    indicators.insert(names::BB_LOWER.into(), indicator(&times, 19, |_| base * 0.94));
    indicators.insert(names::RSI.into(), indicator(&times, 14, |i| 50.0 + (i as f64 * 0.3).sin() * 20.0));
    indicators.insert(names::MACD.into(), indicator(&times, 25, |i| (i as f64 * 0.2).sin()));
    indicators.insert(names::MACD_SIGNAL.into(), indicator(&times, 33, |i| (i as f64 * 0.2).sin() * 0.7));
    indicators.insert(names::MACD_HIST.into(), indicator(&times, 33, |i| (i as f64 * 0.2).sin() * 0.3));
    MarketPayload { symbol: symbol.to_string(), data, indicators }
}

pub fn forecast(current: f64, days: u32, strength: f64) -> ForecastPayload {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
    let predictions = (1..=days)
        .map(|d| {
            let predicted = current * (1.0 + 0.002 * d as f64);
            let spread = current * 0.004 * d as f64;
            ConfidenceBandPoint {
                date: start + chrono::Days::new(d as u64),
                predicted,
                lower_bound: predicted - spread,
                upper_bound: predicted + spread,
            }
        })
        .collect();
    ForecastPayload {
        current_price: current,
        predictions,
        summary: ForecastSummary { trend: "bullish".into(), confidence: 64.0 },
        signal: Some(TradeSignal { label: "Buy".into(), strength, stop_loss: None, target: None }),
    }
}

/// Default config with zero settle delay and labels off.
pub fn config() -> SextantConfig {
    let mut cfg = SextantConfig::default();
    cfg.panels.settle_ms = 0;
    cfg.panels.width = 480;
    cfg
}

pub fn settings(cfg: &SextantConfig) -> DashboardSettings {
    DashboardSettings::from_config(cfg).without_labels()
}

pub fn host(cfg: &SextantConfig) -> LayoutHost {
    LayoutHost::new(cfg.panels.initial_layout(&cfg.panels.descriptors()))
}

pub fn dashboard(
    transport: MemoryTransport,
    cfg: &SextantConfig,
) -> (Dashboard<MemoryTransport>, DashboardHandle, LayoutHost) {
    let host = host(cfg);
    let (dash, handle) =
        Dashboard::new(Arc::new(transport), host.subscribe(), settings(cfg)).expect("dashboard surfaces allocate");
    (dash, handle, host)
}

pub const PRICE: sextant_core::ContainerId = PanelsConfig::PRICE;
