// File: crates/sextant-feed/src/transport.rs
// Summary: Where payloads come from: the analytics HTTP service, or an in-memory table
// for offline runs and tests.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use reqwest::Url;
use serde::de::DeserializeOwned;
use sextant_core::Period;

use crate::error::FetchError;
use crate::payload::{ForecastPayload, MarketPayload, PerformancePayload};

/// Source of remote payloads. Futures are `'static` so they can outlive the borrow of
/// the transport and be dropped (cancelled) at any point.
pub trait Transport: Send + Sync + 'static {
    fn market(&self, symbol: &str, period: Period) -> BoxFuture<'static, Result<MarketPayload, FetchError>>;
    fn forecast(&self, symbol: &str) -> BoxFuture<'static, Result<ForecastPayload, FetchError>>;
    fn performance(&self) -> BoxFuture<'static, Result<PerformancePayload, FetchError>>;
}

/// JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    base: Url,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url));
        }
        Ok(Self { http, base_url, base })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `segments` appended to the base path, each percent-encoded on its own so a
    /// symbol can never add path components or a query.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned + Send + 'static>(
        &self,
        url: Result<Url, FetchError>,
        query: &[(&str, &str)],
    ) -> BoxFuture<'static, Result<T, FetchError>> {
        let request = match url {
            Ok(url) => self.http.get(url).query(query),
            Err(e) => return future::ready(Err(e)).boxed(),
        };
        async move {
            let resp = request.send().await?;
            tracing::debug!(url = %resp.url(), status = %resp.status(), "GET");
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            let body = resp.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        }
        .boxed()
    }
}

impl Transport for HttpTransport {
    fn market(&self, symbol: &str, period: Period) -> BoxFuture<'static, Result<MarketPayload, FetchError>> {
        self.get_json(self.endpoint(&["api", "stock", symbol]), &[("period", period.as_str())])
    }

    fn forecast(&self, symbol: &str) -> BoxFuture<'static, Result<ForecastPayload, FetchError>> {
        self.get_json(self.endpoint(&["api", "predict", symbol]), &[])
    }

    fn performance(&self) -> BoxFuture<'static, Result<PerformancePayload, FetchError>> {
        self.get_json(self.endpoint(&["api", "performance"]), &[])
    }
}

/// Preloaded payloads keyed by symbol, with optional per-symbol latency and failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    market: HashMap<String, MarketPayload>,
    forecast: HashMap<String, ForecastPayload>,
    performance: Option<PerformancePayload>,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(mut self, payload: MarketPayload) -> Self {
        self.market.insert(payload.symbol.to_ascii_uppercase(), payload);
        self
    }

    pub fn with_forecast(mut self, symbol: &str, payload: ForecastPayload) -> Self {
        self.forecast.insert(symbol.to_ascii_uppercase(), payload);
        self
    }

    pub fn with_performance(mut self, payload: PerformancePayload) -> Self {
        self.performance = Some(payload);
        self
    }

    /// Every request for `symbol` resolves only after `delay`.
    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_ascii_uppercase(), delay);
        self
    }

    /// Every request for `symbol` fails with a 503.
    pub fn with_failure(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_ascii_uppercase());
        self
    }

    fn respond<T: Send + 'static>(&self, symbol: &str, found: Option<T>) -> BoxFuture<'static, Result<T, FetchError>> {
        let key = symbol.to_ascii_uppercase();
        let delay = self.delays.get(&key).copied().unwrap_or_default();
        let failing = self.failing.contains(&key);
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if failing {
                return Err(FetchError::Status(503));
            }
            found.ok_or(FetchError::Unavailable(key))
        }
        .boxed()
    }
}

impl Transport for MemoryTransport {
    fn market(&self, symbol: &str, _period: Period) -> BoxFuture<'static, Result<MarketPayload, FetchError>> {
        let found = self.market.get(&symbol.to_ascii_uppercase()).cloned();
        self.respond(symbol, found)
    }

    fn forecast(&self, symbol: &str) -> BoxFuture<'static, Result<ForecastPayload, FetchError>> {
        let found = self.forecast.get(&symbol.to_ascii_uppercase()).cloned();
        self.respond(symbol, found)
    }

    fn performance(&self) -> BoxFuture<'static, Result<PerformancePayload, FetchError>> {
        let found = self.performance.clone();
        self.respond("", found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_transport_serves_by_symbol() {
        let t = MemoryTransport::new()
            .with_market(MarketPayload { symbol: "AAPL".into(), data: vec![], indicators: Default::default() })
            .with_failure("DOWN");
        assert_eq!(t.market("aapl", Period::OneMonth).await.unwrap().symbol, "AAPL");
        assert!(matches!(t.market("MSFT", Period::OneMonth).await, Err(FetchError::Unavailable(s)) if s == "MSFT"));
        assert!(matches!(t.forecast("DOWN").await, Err(FetchError::Status(503))));
    }

    #[test]
    fn http_transport_trims_trailing_slash() {
        let t = HttpTransport::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(t.base_url(), "http://localhost:5000");
    }

    #[test]
    fn endpoint_encodes_each_segment() {
        let t = HttpTransport::new("http://localhost:5000/svc/", Duration::from_secs(5)).unwrap();
        let url = t.endpoint(&["api", "stock", "BRK/B?x=1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/svc/api/stock/BRK%2FB%3Fx=1");
    }

    #[test]
    fn http_transport_rejects_unparsable_base() {
        assert!(matches!(
            HttpTransport::new("localhost:5000", Duration::from_secs(5)),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
