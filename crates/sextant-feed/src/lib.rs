// File: crates/sextant-feed/src/lib.rs
// Summary: Feed library entry point; wires remote payloads into the core session
// manager and forecast renderers.

pub mod error;
pub mod payload;
pub mod transport;
pub mod coordinator;
pub mod poller;
pub mod config;
pub mod dashboard;

pub use error::{ConfigError, FetchError};
pub use payload::{ForecastPayload, ForecastSummary, MarketPayload, PerformancePayload, TradeSignal};
pub use transport::{HttpTransport, MemoryTransport, Transport};
pub use coordinator::{FetchCoordinator, LoadOutcome, LoadTicket, Loaded};
pub use poller::{PollerSettings, StatsPoller};
pub use config::SextantConfig;
pub use dashboard::{Dashboard, DashboardError, DashboardHandle, DashboardSettings, ForecastView, Status};
