// File: crates/sextant-core/src/series.rs
// Summary: Series model: OHLC candles, nullable indicator points, confidence-band points,
// and the normalization rules applied to raw payloads before anything is drawn.
// Notes:
// - Normalization never fails a whole series because of one bad point: offending
//   points are dropped and logged as data-quality errors.
// - Absent indicator values are warm-up gaps. They are filtered out, never zeroed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Period;

/// One validated candle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OhlcPoint {
    pub time: i64, // epoch seconds, strictly increasing within a series
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Why a raw candle was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum OhlcViolation {
    #[error("non-finite price")]
    NonFinite,
    #[error("negative or non-finite volume")]
    BadVolume,
    #[error("low above min(open,close)")]
    LowAboveBody,
    #[error("high below max(open,close)")]
    HighBelowBody,
    #[error("time {time} not after previous {previous}")]
    NonIncreasingTime { time: i64, previous: i64 },
}

impl OhlcPoint {
    /// Try to construct a candle enforcing OHLC invariants:
    /// l <= min(o,c) <= max(o,c) <= h (which implies l <= h).
    pub fn try_new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Result<Self, OhlcViolation> {
        if ![open, high, low, close].iter().all(|v| v.is_finite()) {
            return Err(OhlcViolation::NonFinite);
        }
        if !volume.is_finite() || volume < 0.0 {
            return Err(OhlcViolation::BadVolume);
        }
        if low > open.min(close) { return Err(OhlcViolation::LowAboveBody); }
        if high < open.max(close) { return Err(OhlcViolation::HighBelowBody); }
        Ok(Self { time, open, high, low, close, volume: volume.round() as u64 })
    }

    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Candle as delivered by the data service.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Indicator sample; `value == None` marks a warm-up slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: i64,
    #[serde(default)]
    pub value: Option<f64>,
}

impl IndicatorPoint {
    pub const fn new(time: i64, value: Option<f64>) -> Self {
        Self { time, value }
    }
}

/// Indicator sample with a definite value, still tagged with its original time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefinitePoint {
    pub time: i64,
    pub value: f64,
}

/// Errors that make a whole series unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("series payload contains no points")]
    Empty,
    #[error("all {0} points failed validation")]
    AllRejected(usize),
}

/// Normalized OHLC series plus the number of raw points that were dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OhlcSeries {
    pub points: Vec<OhlcPoint>,
    pub rejected: usize,
}

impl OhlcSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn times(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.time).collect()
    }
}

/// Normalize raw candles. Requires at least one input point; points violating the
/// OHLC invariant (or arriving out of order) are dropped and logged.
pub fn to_ohlc_series(raw: &[RawCandle]) -> Result<OhlcSeries, SeriesError> {
    if raw.is_empty() {
        return Err(SeriesError::Empty);
    }
    let mut points: Vec<OhlcPoint> = Vec::with_capacity(raw.len());
    let mut rejected = 0usize;
    for r in raw {
        let checked = match points.last() {
            Some(prev) if r.time <= prev.time => Err(OhlcViolation::NonIncreasingTime { time: r.time, previous: prev.time }),
            _ => OhlcPoint::try_new(r.time, r.open, r.high, r.low, r.close, r.volume),
        };
        match checked {
            Ok(p) => points.push(p),
            Err(reason) => {
                rejected += 1;
                tracing::warn!(time = r.time, %reason, "dropping malformed candle");
            }
        }
    }
    if points.is_empty() {
        return Err(SeriesError::AllRejected(rejected));
    }
    Ok(OhlcSeries { points, rejected })
}

/// Keep only definite values, preserving their original timestamps.
pub fn to_indicator_series(raw: &[IndicatorPoint]) -> Vec<DefinitePoint> {
    raw.iter()
        .filter_map(|p| match p.value {
            Some(v) if v.is_finite() => Some(DefinitePoint { time: p.time, value: v }),
            _ => None,
        })
        .collect()
}

/// Split a nullable series into contiguous runs of definite values. Drawing each run
/// as its own polyline renders warm-up gaps as breaks.
pub fn definite_runs(raw: &[IndicatorPoint]) -> Vec<Vec<DefinitePoint>> {
    let mut runs = Vec::new();
    let mut current: Vec<DefinitePoint> = Vec::new();
    for p in raw {
        match p.value {
            Some(v) if v.is_finite() => current.push(DefinitePoint { time: p.time, value: v }),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Indicator names as published by the analytics service.
pub mod names {
    pub const SMA: &str = "sma_20";
    pub const EMA: &str = "ema_12";
    pub const BB_UPPER: &str = "bb_upper";
    pub const BB_MIDDLE: &str = "bb_middle";
    pub const BB_LOWER: &str = "bb_lower";
    pub const RSI: &str = "rsi";
    pub const MACD: &str = "macd";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const MACD_HIST: &str = "macd_hist";
}

/// Indicator map keyed by indicator name.
pub type IndicatorSet = BTreeMap<String, Vec<IndicatorPoint>>;

/// Everything a session is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub period: Period,
    pub ohlc: OhlcSeries,
    pub indicators: IndicatorSet,
}

impl MarketSnapshot {
    /// Normalize a raw payload into a snapshot.
    pub fn normalize(
        symbol: impl Into<String>,
        period: Period,
        candles: &[RawCandle],
        indicators: IndicatorSet,
    ) -> Result<Self, SeriesError> {
        let ohlc = to_ohlc_series(candles)?;
        Ok(Self { symbol: symbol.into(), period, ohlc, indicators })
    }

    pub fn indicator(&self, name: &str) -> Option<&[IndicatorPoint]> {
        self.indicators.get(name).map(Vec::as_slice)
    }
}

/// One forecast horizon point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceBandPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ConfidenceBandPoint {
    pub fn is_ordered(&self) -> bool {
        [self.predicted, self.lower_bound, self.upper_bound].iter().all(|v| v.is_finite())
            && self.lower_bound <= self.predicted
            && self.predicted <= self.upper_bound
    }
}

/// Anchor (current) price plus the forward horizon, ordered by date.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastSeries {
    pub anchor_price: f64,
    pub points: Vec<ConfidenceBandPoint>,
}

impl ForecastSeries {
    /// Sort by date and drop points whose bounds do not bracket the prediction
    /// (or repeat an earlier date).
    pub fn normalize(anchor_price: f64, raw: &[ConfidenceBandPoint]) -> Self {
        let mut sorted: Vec<ConfidenceBandPoint> = raw.to_vec();
        sorted.sort_by_key(|p| p.date);
        let mut points: Vec<ConfidenceBandPoint> = Vec::with_capacity(sorted.len());
        for p in sorted {
            if !p.is_ordered() {
                tracing::warn!(date = %p.date, "dropping forecast point with inverted bounds");
                continue;
            }
            if points.last().is_some_and(|last| last.date == p.date) {
                tracing::warn!(date = %p.date, "dropping duplicate forecast date");
                continue;
            }
            points.push(p);
        }
        Self { anchor_price, points }
    }

    /// Final horizon point, the one the target-price callout reads.
    pub fn target(&self) -> Option<&ConfidenceBandPoint> {
        self.points.last()
    }

    /// (min, max) across every band value and the anchor price.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = self.anchor_price;
        let mut hi = self.anchor_price;
        for p in &self.points {
            lo = lo.min(p.lower_bound).min(p.predicted);
            hi = hi.max(p.upper_bound).max(p.predicted);
        }
        (lo, hi)
    }
}
