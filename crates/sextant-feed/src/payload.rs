// File: crates/sextant-feed/src/payload.rs
// Summary: Wire shapes consumed from the analytics service and their conversion into
// core series.

use serde::{Deserialize, Serialize};
use sextant_core::{ConfidenceBandPoint, ForecastSeries, IndicatorSet, MarketSnapshot, Period, RawCandle, SeriesError};

/// `GET /api/stock/{symbol}?period=`: OHLC candles plus precomputed indicators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketPayload {
    pub symbol: String,
    #[serde(default)]
    pub data: Vec<RawCandle>,
    #[serde(default)]
    pub indicators: IndicatorSet,
}

impl MarketPayload {
    /// Validate and normalize into a snapshot for `period`.
    pub fn into_snapshot(self, period: Period) -> Result<MarketSnapshot, SeriesError> {
        MarketSnapshot::normalize(self.symbol, period, &self.data, self.indicators)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    #[serde(default)]
    pub trend: String,
    /// 0..=100
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSignal {
    pub label: String,
    /// Combined signal score, 0..=100 with 50 neutral.
    pub strength: f64,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
}

/// `GET /api/predict/{symbol}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPayload {
    pub current_price: f64,
    #[serde(default)]
    pub predictions: Vec<ConfidenceBandPoint>,
    #[serde(default)]
    pub summary: ForecastSummary,
    #[serde(default)]
    pub signal: Option<TradeSignal>,
}

impl ForecastPayload {
    pub fn series(&self) -> ForecastSeries {
        ForecastSeries::normalize(self.current_price, &self.predictions)
    }

    /// Score shown on the gauge: the signal strength, else the summary confidence.
    pub fn gauge_score(&self) -> f64 {
        self.signal.as_ref().map_or(self.summary.confidence, |s| s.strength)
    }
}

/// `GET /api/performance`: model track record, polled in the background.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePayload {
    pub accuracy: f64,
    pub total_predictions: u64,
    pub avg_error: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_payload_keeps_null_indicator_values() {
        let json = r#"{
            "symbol": "AAPL",
            "data": [
                {"time": 1, "open": 10, "high": 12, "low": 9, "close": 11, "volume": 500},
                {"time": 2, "open": 11, "high": 13, "low": 10, "close": 12, "volume": 600}
            ],
            "indicators": {"rsi": [{"time": 1, "value": null}, {"time": 2, "value": 61.5}]}
        }"#;
        let payload: MarketPayload = serde_json::from_str(json).unwrap();
        let snap = payload.into_snapshot(Period::OneYear).unwrap();
        assert_eq!(snap.ohlc.len(), 2);
        assert_eq!(snap.period, Period::OneYear);
        let rsi = snap.indicator("rsi").unwrap();
        assert_eq!(rsi[0].value, None);
        assert_eq!(rsi[1].value, Some(61.5));
    }

    #[test]
    fn forecast_payload_reads_camel_case() {
        let json = r#"{
            "currentPrice": 98.0,
            "predictions": [
                {"date": "2024-03-02", "predicted": 100.0, "lowerBound": 95.0, "upperBound": 105.0},
                {"date": "2024-03-03", "predicted": 103.0, "lowerBound": 97.0, "upperBound": 109.0}
            ],
            "summary": {"trend": "bullish", "confidence": 64},
            "signal": {"label": "Buy", "strength": 71, "stopLoss": 93.1, "target": 103.0}
        }"#;
        let payload: ForecastPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.series().target().map(|p| p.predicted), Some(103.0));
        assert_eq!(payload.gauge_score(), 71.0);
        assert_eq!(payload.signal.unwrap().stop_loss, Some(93.1));
    }

    #[test]
    fn gauge_falls_back_to_confidence_without_signal() {
        let payload: ForecastPayload =
            serde_json::from_str(r#"{"currentPrice": 5.0, "summary": {"trend": "flat", "confidence": 42}}"#).unwrap();
        assert!(payload.predictions.is_empty());
        assert_eq!(payload.gauge_score(), 42.0);
    }
}
